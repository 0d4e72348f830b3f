//! 数据模型
//!
//! 包含 `orders` 表对应的订单结构与状态定义。

pub mod order;

pub use order::{AMOUNT_CENTS_RANGE, ORDERS_TABLE, Order, OrderStatus, UnknownStatus};
