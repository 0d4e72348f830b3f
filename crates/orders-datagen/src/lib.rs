//! Orders 数据生成器
//!
//! 对 PostgreSQL 中的 `orders` 表执行随机的增删改，为 CDC 实验提供变更流量。
//!
//! # 主要模块
//!
//! - `models`: 订单模型
//! - `generators`: 可注入种子的随机数据生成器与时钟
//! - `store`: 行存储（PostgreSQL 与内存实现）
//! - `cli`: 命令行参数与命令执行
//!
//! # 使用示例
//!
//! ```rust
//! use orders_datagen::generators::RandomOrderGenerator;
//! use orders_datagen::store::{MemoryOrderStore, OrderStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryOrderStore::new().with_generator(RandomOrderGenerator::from_seed(42));
//!
//! store.insert(10).await.unwrap();
//! store.update(5).await.unwrap();
//! assert_eq!(store.delete(100).await.unwrap(), 10);
//! assert_eq!(store.row_count().await.unwrap(), 0);
//! # });
//! ```

pub mod cli;
pub mod generators;
pub mod models;
pub mod store;
