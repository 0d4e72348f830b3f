//! 统一可观测性模块
//!
//! 提供日志的统一初始化。所有入口通过单一函数配置输出格式与级别，
//! 确保结构化字段命名一致。

pub mod tracing;

use ::tracing::info;
use anyhow::Result;

use crate::config::ObservabilityConfig;

/// 统一初始化可观测性
///
/// # Example
///
/// ```ignore
/// use orders_shared::config::AppConfig;
/// use orders_shared::observability;
///
/// let config = AppConfig::load()?;
/// observability::init(&config.observability)?;
/// ```
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    tracing::init(config)?;

    info!(
        log_level = %config.log_level,
        log_format = ?config.log_format,
        "Observability initialized"
    );

    Ok(())
}
