//! 数据库连接管理模块
//!
//! 由显式传入的 [`DatabaseConfig`] 建立 PostgreSQL 连接池，不依赖全局状态。

use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// 数据库连接池包装
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 创建数据库连接池
    ///
    /// 立即建立一个连接以尽早暴露连接或认证失败。
    #[instrument(skip(config), fields(db_target = %config.target()))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect_with(connect_options(config)?)
            .await?;

        info!("Database connection pool created");

        Ok(Self { pool })
    }

    /// 获取连接池引用
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 健康检查
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// 关闭连接池
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

/// 由配置构造连接参数
pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions> {
    if let Some(url) = &config.url {
        return Ok(url.parse::<PgConnectOptions>()?);
    }

    Ok(PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .password(&config.password))
}
