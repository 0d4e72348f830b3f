//! 行存储模块
//!
//! `orders` 表的生命周期管理与增删改操作。
//!
//! - [`PgOrderStore`]：基于 PostgreSQL 的实现，每个操作一个事务
//! - [`MemoryOrderStore`]：语义相同的内存实现，用于测试

pub mod memory_store;
pub mod pg_store;
pub mod traits;

pub use memory_store::MemoryOrderStore;
pub use pg_store::PgOrderStore;
pub use traits::OrderStore;

#[cfg(test)]
pub use traits::MockOrderStore;

use orders_shared::{OrdersError, Result};

/// 校验行数参数，要求 `n >= 1`
pub fn validate_row_count(n: u64) -> Result<()> {
    if n == 0 {
        return Err(OrdersError::invalid_argument(
            "num_rows",
            "row count must be >= 1",
        ));
    }
    Ok(())
}

/// 将请求的行数截断到可用行数
pub fn clamp_row_count(requested: u64, available: u64) -> u64 {
    requested.min(available)
}
