//! 存储 Trait 定义
//!
//! 命令执行层依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;
use orders_shared::Result;

use crate::models::Order;

/// 订单表存储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// 表不存在时创建，已存在时校验列结构
    async fn ensure_schema(&self) -> Result<()>;

    /// 插入 `n` 行随机订单，返回插入行数
    async fn insert(&self, n: u64) -> Result<u64>;

    /// 随机更新至多 `n` 行的状态，返回 `min(n, 当前行数)`
    ///
    /// 表中无数据时返回 `EmptyTable`。
    async fn update(&self, n: u64) -> Result<u64>;

    /// 随机删除至多 `n` 行，返回实际删除行数；空表返回 0
    async fn delete(&self, n: u64) -> Result<u64>;

    /// 删除整张表，表不存在时不报错
    async fn drop_table(&self) -> Result<()>;

    /// 当前行数，表不存在时为 0
    async fn row_count(&self) -> Result<u64>;

    /// 读取全部行，表不存在时为空
    async fn snapshot(&self) -> Result<Vec<Order>>;
}
