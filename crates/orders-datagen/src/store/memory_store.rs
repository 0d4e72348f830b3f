//! 内存行存储
//!
//! 与 [`PgOrderStore`](super::PgOrderStore) 语义一致的进程内实现，适用于测试和开发环境。
//! 整张表由一把锁保护，每个操作持锁完成，天然具备全有或全无的效果。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use orders_shared::{OrdersError, Result};

use super::traits::OrderStore;
use super::{clamp_row_count, validate_row_count};
use crate::generators::{Clock, OrderGenerator, RandomOrderGenerator, SystemClock};
use crate::models::{ORDERS_TABLE, Order};

/// 内存订单存储
///
/// `None` 表示表不存在。行按 ID 排序存放，配合固定种子的生成器可得到确定的行选择。
pub struct MemoryOrderStore {
    table: Mutex<Option<BTreeMap<String, Order>>>,
    generator: Mutex<Box<dyn OrderGenerator>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOrderStore {
    /// 创建空存储（表不存在）
    pub fn new() -> Self {
        Self {
            table: Mutex::new(None),
            generator: Mutex::new(Box::new(RandomOrderGenerator::from_os_rng())),
            clock: Arc::new(SystemClock),
        }
    }

    /// 替换数据生成器
    pub fn with_generator(mut self, generator: impl OrderGenerator + 'static) -> Self {
        self.generator = Mutex::new(Box::new(generator));
        self
    }

    /// 替换时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 表是否存在
    pub fn table_exists(&self) -> bool {
        self.table.lock().is_some()
    }

    /// 按 ID 获取一行
    pub fn get(&self, id: &str) -> Option<Order> {
        self.table
            .lock()
            .as_ref()
            .and_then(|rows| rows.get(id).cloned())
    }

    /// 随机选出至多 `n` 个 ID
    fn pick_ids(&self, rows: &BTreeMap<String, Order>, n: u64) -> Vec<String> {
        let amount = clamp_row_count(n, rows.len() as u64) as usize;
        let keys: Vec<&String> = rows.keys().collect();

        let mut generator = self.generator.lock();
        generator
            .sample_indices(keys.len(), amount)
            .into_iter()
            .map(|i| keys[i].clone())
            .collect()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn ensure_schema(&self) -> Result<()> {
        self.table.lock().get_or_insert_with(BTreeMap::new);
        Ok(())
    }

    async fn insert(&self, n: u64) -> Result<u64> {
        validate_row_count(n)?;

        let mut table = self.table.lock();

        let now = self.clock.now_millis();
        let batch: Vec<Order> = {
            let mut generator = self.generator.lock();
            (0..n).map(|_| generator.next_order(now)).collect()
        };

        // 先整体校验主键，失败时不建表也不写入
        {
            let existing = table.as_ref();
            let mut seen = std::collections::HashSet::with_capacity(batch.len());
            for order in &batch {
                let taken = existing.is_some_and(|rows| rows.contains_key(&order.id));
                if taken || !seen.insert(order.id.as_str()) {
                    return Err(OrdersError::Constraint {
                        table: ORDERS_TABLE.to_string(),
                        message: format!(
                            "duplicate key value violates primary key: id={}",
                            order.id
                        ),
                    });
                }
            }
        }

        let rows = table.get_or_insert_with(BTreeMap::new);
        for order in batch {
            debug!(id = %order.id, "Inserted record");
            rows.insert(order.id.clone(), order);
        }

        info!(inserted = n, "Inserted rows into orders table");
        Ok(n)
    }

    async fn update(&self, n: u64) -> Result<u64> {
        validate_row_count(n)?;

        let mut table = self.table.lock();

        // 表不存在与空表同样处理，失败时不建表
        let Some(rows) = table.as_mut().filter(|rows| !rows.is_empty()) else {
            return Err(OrdersError::EmptyTable {
                table: ORDERS_TABLE.to_string(),
            });
        };

        let ids = self.pick_ids(rows, n);
        let now = self.clock.now_millis();

        let mut generator = self.generator.lock();
        for id in &ids {
            if let Some(order) = rows.get_mut(id) {
                order.touch(generator.next_status(), now);
                debug!(id = %order.id, status = %order.status, "Updated record");
            }
        }

        let updated = ids.len() as u64;
        info!(updated, "Updated rows in orders table");
        Ok(updated)
    }

    async fn delete(&self, n: u64) -> Result<u64> {
        validate_row_count(n)?;

        let mut table = self.table.lock();
        let rows = table.get_or_insert_with(BTreeMap::new);

        let ids = self.pick_ids(rows, n);
        for id in &ids {
            rows.remove(id);
            debug!(%id, "Deleted record");
        }

        let deleted = ids.len() as u64;
        info!(deleted, requested = n, "Deleted rows from orders table");
        Ok(deleted)
    }

    async fn drop_table(&self) -> Result<()> {
        self.table.lock().take();
        info!("Orders table has been dropped");
        Ok(())
    }

    async fn row_count(&self) -> Result<u64> {
        Ok(self
            .table
            .lock()
            .as_ref()
            .map(|rows| rows.len() as u64)
            .unwrap_or(0))
    }

    async fn snapshot(&self) -> Result<Vec<Order>> {
        Ok(self
            .table
            .lock()
            .as_ref()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::ManualClock;
    use crate::models::OrderStatus;

    /// 总是返回同一 ID 的生成器
    struct FixedIdGenerator;

    impl OrderGenerator for FixedIdGenerator {
        fn next_id(&mut self) -> String {
            "id-123".to_string()
        }

        fn next_status(&mut self) -> OrderStatus {
            OrderStatus::Paid
        }

        fn next_amount_cents(&mut self) -> i32 {
            5000
        }

        fn sample_indices(&mut self, _len: usize, amount: usize) -> Vec<usize> {
            (0..amount).collect()
        }
    }

    fn seeded_store() -> MemoryOrderStore {
        MemoryOrderStore::new()
            .with_generator(RandomOrderGenerator::from_seed(42))
            .with_clock(Arc::new(ManualClock::new(1_000)))
    }

    #[tokio::test]
    async fn test_new_store_has_no_table() {
        let store = seeded_store();
        assert!(!store.table_exists());
        assert_eq!(store.row_count().await.unwrap(), 0);
        assert!(store.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_uses_generator_values() {
        let store = MemoryOrderStore::new()
            .with_generator(FixedIdGenerator)
            .with_clock(Arc::new(ManualClock::new(11111)));

        assert_eq!(store.insert(1).await.unwrap(), 1);

        let order = store.get("id-123").unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.amount_cents, 5000);
        assert_eq!(order.created_at, 11111);
        assert_eq!(order.updated_at, 11111);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejects_whole_batch() {
        let store = MemoryOrderStore::new().with_generator(FixedIdGenerator);

        let err = store.insert(2).await.unwrap_err();
        assert_eq!(err.code(), "CONSTRAINT_VIOLATION");
        // 整批回滚，连同建表一起撤销
        assert!(!store.table_exists());
        assert_eq!(store.row_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_id_keeps_existing_rows() {
        let store = MemoryOrderStore::new().with_generator(FixedIdGenerator);
        store.insert(1).await.unwrap();

        let err = store.insert(1).await.unwrap_err();
        assert!(matches!(err, OrdersError::Constraint { .. }));
        assert_eq!(store.row_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zero_rows_rejected() {
        let store = seeded_store();
        for result in [
            store.insert(0).await,
            store.update(0).await,
            store.delete(0).await,
        ] {
            assert_eq!(result.unwrap_err().code(), "INVALID_ARGUMENT");
        }
        assert!(!store.table_exists());
    }

    #[tokio::test]
    async fn test_update_empty_table_fails() {
        let store = seeded_store();
        let err = store.update(3).await.unwrap_err();
        assert!(matches!(err, OrdersError::EmptyTable { .. }));
        // 失败的更新不留下表
        assert!(!store.table_exists());

        store.ensure_schema().await.unwrap();
        let err = store.update(3).await.unwrap_err();
        assert_eq!(err.code(), "EMPTY_TABLE");
        assert!(store.table_exists());
    }

    #[tokio::test]
    async fn test_delete_absent_table_returns_zero() {
        let store = seeded_store();
        assert_eq!(store.delete(5).await.unwrap(), 0);
        assert!(store.table_exists());
    }

    #[tokio::test]
    async fn test_drop_is_idempotent() {
        let store = seeded_store();
        store.drop_table().await.unwrap();
        store.insert(3).await.unwrap();
        store.drop_table().await.unwrap();
        store.drop_table().await.unwrap();
        assert!(!store.table_exists());
    }
}
