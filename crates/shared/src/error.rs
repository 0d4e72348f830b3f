//! 统一错误处理模块
//!
//! 定义系统中所有共享的错误类型，使用 thiserror 提供良好的错误信息。

use thiserror::Error;

/// 系统错误类型
#[derive(Debug, Error)]
pub enum OrdersError {
    // ==================== 数据库错误 ====================
    #[error("数据库连接失败: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("数据库错误: {0}")]
    Database(#[source] sqlx::Error),

    #[error("表结构不兼容: {table} - {message}")]
    Schema { table: String, message: String },

    #[error("违反约束: {table} - {message}")]
    Constraint { table: String, message: String },

    #[error("表中没有可操作的数据: {table}")]
    EmptyTable { table: String },

    // ==================== 验证错误 ====================
    #[error("无效的参数: {field} - {message}")]
    InvalidArgument { field: String, message: String },

    // ==================== 配置错误 ====================
    #[error("配置加载失败: {0}")]
    Config(#[from] config::ConfigError),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, OrdersError>;

impl OrdersError {
    /// 构造参数错误
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Schema { .. } => "SCHEMA_ERROR",
            Self::Constraint { .. } => "CONSTRAINT_VIOLATION",
            Self::EmptyTable { .. } => "EMPTY_TABLE",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// 是否为连接类错误
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// 连接类 SQLSTATE：08 连接异常、28 认证失败、3D000 数据库不存在
fn is_connection_sqlstate(code: &str) -> bool {
    code.starts_with("08") || code.starts_with("28") || code == "3D000"
}

impl From<sqlx::Error> for OrdersError {
    fn from(err: sqlx::Error) -> Self {
        // 23 类 SQLSTATE 为完整性约束冲突
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().is_some_and(|code| code.starts_with("23")) {
                return Self::Constraint {
                    table: db_err.table().unwrap_or_default().to_string(),
                    message: db_err.message().to_string(),
                };
            }
        }

        let is_connection = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => true,
            sqlx::Error::Database(db_err) => db_err
                .code()
                .map(|code| is_connection_sqlstate(&code))
                .unwrap_or(false),
            _ => false,
        };

        if is_connection {
            Self::Connection(err)
        } else {
            Self::Database(err)
        }
    }
}
