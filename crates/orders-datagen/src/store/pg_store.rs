//! PostgreSQL 行存储
//!
//! 每个操作在单个事务内完成：成功提交，任何错误都会在事务被 drop 时回滚，
//! 连接在所有退出路径上归还连接池。

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument};

use orders_shared::{OrdersError, Result};

use super::traits::OrderStore;
use super::{clamp_row_count, validate_row_count};
use crate::generators::{Clock, OrderGenerator, RandomOrderGenerator, SystemClock};
use crate::models::{ORDERS_TABLE, Order, OrderStatus};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS orders (
        id                 TEXT    PRIMARY KEY,
        status             TEXT    NOT NULL,
        total_amount_cents INTEGER NOT NULL,
        created_at         BIGINT  NOT NULL,
        last_updated_at    BIGINT  NOT NULL
    )
"#;

const DROP_TABLE_SQL: &str = "DROP TABLE IF EXISTS orders";

/// 期望的列名与 information_schema 中的 data_type
pub const EXPECTED_COLUMNS: [(&str, &str); 5] = [
    ("id", "text"),
    ("status", "text"),
    ("total_amount_cents", "integer"),
    ("created_at", "bigint"),
    ("last_updated_at", "bigint"),
];

const INSERT_BATCH_SQL: &str = r#"
    INSERT INTO orders (id, status, total_amount_cents, created_at, last_updated_at)
    SELECT * FROM UNNEST($1::text[], $2::text[], $3::int4[], $4::int8[], $5::int8[])
    RETURNING id
"#;

const SELECT_IDS_FOR_UPDATE_SQL: &str = r#"
    SELECT id
    FROM orders
    ORDER BY random()
    LIMIT $1
    FOR UPDATE
"#;

const UPDATE_BATCH_SQL: &str = r#"
    UPDATE orders AS o
    SET status = u.status,
        last_updated_at = GREATEST($3, o.last_updated_at + 1)
    FROM UNNEST($1::text[], $2::text[]) AS u(id, status)
    WHERE o.id = u.id
    RETURNING o.id
"#;

const DELETE_RANDOM_SQL: &str = r#"
    DELETE FROM orders
    WHERE id IN (
        SELECT id
        FROM orders
        ORDER BY random()
        LIMIT $1
    )
    RETURNING id
"#;

/// PostgreSQL 订单存储
pub struct PgOrderStore {
    pool: PgPool,
    batch_size: usize,
    generator: Mutex<Box<dyn OrderGenerator>>,
    clock: Arc<dyn Clock>,
}

impl PgOrderStore {
    /// 创建存储，使用系统熵源生成器和系统时钟
    pub fn new(pool: PgPool, batch_size: usize) -> Self {
        Self {
            pool,
            batch_size: batch_size.max(1),
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

    fn generate_orders(&self, count: usize, now_millis: i64) -> Vec<Order> {
        let mut generator = self.generator.lock();
        (0..count).map(|_| generator.next_order(now_millis)).collect()
    }

    fn generate_statuses(&self, count: usize) -> Vec<String> {
        let mut generator = self.generator.lock();
        (0..count)
            .map(|_| generator.next_status().as_str().to_string())
            .collect()
    }

    /// 在事务中创建表并校验结构
    pub async fn ensure_schema_in_tx(conn: &mut PgConnection) -> Result<()> {
        debug!(sql = CREATE_TABLE_SQL, "Creating orders table if it does not exist");
        sqlx::query(CREATE_TABLE_SQL).execute(&mut *conn).await?;
        Self::verify_schema_in_tx(conn).await
    }

    /// 校验现有表的列名与类型
    ///
    /// 允许存在额外的列；缺列或类型不符时返回 `Schema` 错误。
    pub async fn verify_schema_in_tx(conn: &mut PgConnection) -> Result<()> {
        let columns: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT column_name::text, data_type::text
            FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = $1
            "#,
        )
        .bind(ORDERS_TABLE)
        .fetch_all(&mut *conn)
        .await?;

        check_columns(&columns)
    }

    async fn insert_batch(conn: &mut PgConnection, orders: Vec<Order>) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(orders.len());
        let mut statuses = Vec::with_capacity(orders.len());
        let mut amounts = Vec::with_capacity(orders.len());
        let mut created = Vec::with_capacity(orders.len());
        let mut updated = Vec::with_capacity(orders.len());

        for order in orders {
            ids.push(order.id);
            statuses.push(order.status.as_str().to_string());
            amounts.push(order.amount_cents);
            created.push(order.created_at);
            updated.push(order.updated_at);
        }

        let inserted: Vec<String> = sqlx::query_scalar(INSERT_BATCH_SQL)
            .bind(ids)
            .bind(statuses)
            .bind(amounts)
            .bind(created)
            .bind(updated)
            .fetch_all(conn)
            .await?;

        Ok(inserted)
    }

    async fn table_exists(&self) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )
            "#,
        )
        .bind(ORDERS_TABLE)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

/// 对照期望列检查实际列
pub fn check_columns(columns: &[(String, String)]) -> Result<()> {
    for (name, expected_type) in EXPECTED_COLUMNS {
        match columns.iter().find(|(column, _)| column == name) {
            None => {
                return Err(OrdersError::Schema {
                    table: ORDERS_TABLE.to_string(),
                    message: format!("missing column '{name}'"),
                });
            }
            Some((_, actual)) if actual != expected_type => {
                return Err(OrdersError::Schema {
                    table: ORDERS_TABLE.to_string(),
                    message: format!(
                        "column '{name}' has type '{actual}', expected '{expected_type}'"
                    ),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// 行数参数转为 SQL LIMIT
fn to_limit(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl OrderStore for PgOrderStore {
    #[instrument(skip(self))]
    async fn ensure_schema(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::ensure_schema_in_tx(&mut tx).await?;
        tx.commit().await?;

        info!("Orders table is ready");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn insert(&self, n: u64) -> Result<u64> {
        validate_row_count(n)?;

        let mut tx = self.pool.begin().await?;
        Self::ensure_schema_in_tx(&mut tx).await?;

        let now = self.clock.now_millis();
        let mut remaining = n;
        let mut inserted = 0u64;

        debug!(sql = INSERT_BATCH_SQL, batch_size = self.batch_size, "Inserting rows");
        while remaining > 0 {
            let chunk = clamp_row_count(remaining, self.batch_size as u64);
            let orders = self.generate_orders(chunk as usize, now);
            let ids = Self::insert_batch(&mut tx, orders).await?;
            for id in &ids {
                debug!(%id, "Inserted record");
            }
            inserted += ids.len() as u64;
            remaining -= chunk;
            debug!(inserted, total = n, "Inserted batch");
        }

        tx.commit().await?;

        info!(inserted, "Inserted rows into orders table");
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn update(&self, n: u64) -> Result<u64> {
        validate_row_count(n)?;

        let mut tx = self.pool.begin().await?;
        Self::ensure_schema_in_tx(&mut tx).await?;

        debug!(sql = SELECT_IDS_FOR_UPDATE_SQL, "Selecting rows to update");
        let ids: Vec<String> = sqlx::query_scalar(SELECT_IDS_FOR_UPDATE_SQL)
            .bind(to_limit(n))
            .fetch_all(&mut *tx)
            .await?;

        if ids.is_empty() {
            return Err(OrdersError::EmptyTable {
                table: ORDERS_TABLE.to_string(),
            });
        }

        let statuses = self.generate_statuses(ids.len());
        let now = self.clock.now_millis();

        debug!(sql = UPDATE_BATCH_SQL, rows = ids.len(), "Updating rows");
        let updated_ids: Vec<String> = sqlx::query_scalar(UPDATE_BATCH_SQL)
            .bind(ids)
            .bind(statuses)
            .bind(now)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        for id in &updated_ids {
            debug!(%id, "Updated record");
        }
        let updated = updated_ids.len() as u64;
        info!(updated, "Updated rows in orders table");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, n: u64) -> Result<u64> {
        validate_row_count(n)?;

        let mut tx = self.pool.begin().await?;
        Self::ensure_schema_in_tx(&mut tx).await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&mut *tx)
            .await?;
        let to_delete = clamp_row_count(n, count.max(0) as u64);

        if to_delete == 0 {
            tx.commit().await?;
            info!("Orders table is empty, nothing to delete");
            return Ok(0);
        }

        debug!(sql = DELETE_RANDOM_SQL, to_delete, "Deleting rows");
        let deleted_ids: Vec<String> = sqlx::query_scalar(DELETE_RANDOM_SQL)
            .bind(to_limit(to_delete))
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        for id in &deleted_ids {
            debug!(%id, "Deleted record");
        }
        let deleted = deleted_ids.len() as u64;
        info!(deleted, requested = n, "Deleted rows from orders table");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn drop_table(&self) -> Result<()> {
        debug!(sql = DROP_TABLE_SQL, "Dropping orders table");
        sqlx::query(DROP_TABLE_SQL).execute(&self.pool).await?;

        info!("Orders table has been dropped");
        Ok(())
    }

    async fn row_count(&self) -> Result<u64> {
        if !self.table_exists().await? {
            return Ok(0);
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn snapshot(&self) -> Result<Vec<Order>> {
        if !self.table_exists().await? {
            return Ok(Vec::new());
        }

        let rows: Vec<(String, String, i32, i64, i64)> = sqlx::query_as(
            r#"
            SELECT id, status, total_amount_cents, created_at, last_updated_at
            FROM orders
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, status, amount_cents, created_at, updated_at)| -> Result<Order> {
                let status = status.parse::<OrderStatus>().map_err(|e| OrdersError::Schema {
                    table: ORDERS_TABLE.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Order {
                    id,
                    status,
                    amount_cents,
                    created_at,
                    updated_at,
                })
            })
            .collect()
    }
}
