//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::warn;

use crate::error::{OrdersError, Result};

/// 数据库配置
///
/// 设置 `url` 时优先使用连接串，否则由各分项拼装连接参数。
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            name: "postgres".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            max_connections: 1,
            connect_timeout_seconds: 10,
        }
    }
}

impl DatabaseConfig {
    /// 用于日志的连接目标描述（不含密码）
    pub fn target(&self) -> String {
        match &self.url {
            Some(_) => "<url>".to_string(),
            None => format!("{}@{}:{}/{}", self.user, self.host, self.port, self.name),
        }
    }
}

// 手写 Debug，避免密码进入日志
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"***")
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .finish()
    }
}

/// 行存储配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 单条 INSERT 语句写入的最大行数
    pub batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 结构化 JSON，每行一个事件
    Json,
    /// 人类可读
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = OrdersError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(OrdersError::invalid_argument(
                "log_format",
                format!("unsupported log format '{other}', expected json or pretty"),
            )),
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: String,
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database: DatabaseConfig::default(),
            store: StoreConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// `POSTGRES_*` 环境变量与数据库配置项的对应关系
const POSTGRES_HOST: &str = "POSTGRES_HOST";
const POSTGRES_PORT: &str = "POSTGRES_PORT";
const POSTGRES_DB: &str = "POSTGRES_DB";
const POSTGRES_USER: &str = "POSTGRES_USER";
const POSTGRES_PASSWORD: &str = "POSTGRES_PASSWORD";

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. 当前目录下的 .env 文件（仅注入环境变量）
    /// 2. config/default.toml（默认配置）
    /// 3. config/{environment}.toml（环境特定配置）
    /// 4. 环境变量（ORDERS_ 前缀，如 ORDERS_DATABASE__HOST -> database.host）
    /// 5. POSTGRES_HOST / POSTGRES_PORT / POSTGRES_DB / POSTGRES_USER / POSTGRES_PASSWORD
    pub fn load() -> Result<Self> {
        // .env 不存在时忽略
        let _ = dotenvy::dotenv();

        let env = std::env::var("ORDERS_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let mut config = Self::load_from(Path::new(&config_dir), &env)?;
        config.apply_postgres_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// 从指定配置目录加载，不读取 .env 和 POSTGRES_* 变量
    pub fn load_from(config_dir: &Path, env: &str) -> Result<Self> {
        let builder = Config::builder()
            .set_default("environment", env)?
            // 加载默认配置文件
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // 加载环境特定配置
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            // 环境变量覆盖（ORDERS_DATABASE__HOST -> database.host）
            .add_source(
                Environment::with_prefix("ORDERS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// 使用 POSTGRES_* 变量覆盖数据库配置
    ///
    /// `lookup` 抽象了环境变量读取，便于测试注入。
    /// 只要设置了任一 POSTGRES_* 变量，`database.url` 即被清除，连接参数改由各分项拼装。
    pub fn apply_postgres_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db = &mut self.database;
        let mut applied = false;

        if let Some(host) = lookup(POSTGRES_HOST) {
            db.host = host;
            applied = true;
        }
        if let Some(port) = lookup(POSTGRES_PORT) {
            db.port = port.trim().parse().map_err(|_| {
                OrdersError::invalid_argument(POSTGRES_PORT, format!("not a valid port: {port}"))
            })?;
            applied = true;
        }
        if let Some(name) = lookup(POSTGRES_DB) {
            db.name = name;
            applied = true;
        }
        if let Some(user) = lookup(POSTGRES_USER) {
            db.user = user;
            applied = true;
        }
        if let Some(password) = lookup(POSTGRES_PASSWORD) {
            db.password = password;
            applied = true;
        }

        if applied && db.url.take().is_some() {
            warn!("POSTGRES_* variables are set, ignoring database.url");
        }

        Ok(())
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<()> {
        if self.store.batch_size == 0 {
            return Err(OrdersError::invalid_argument(
                "store.batch_size",
                "must be >= 1",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(OrdersError::invalid_argument(
                "database.max_connections",
                "must be >= 1",
            ));
        }
        Ok(())
    }
}
