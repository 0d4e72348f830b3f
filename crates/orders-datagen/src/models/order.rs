//! 订单模型
//!
//! `orders` 表的行结构，以及状态枚举和时间戳规则。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// 订单表名
pub const ORDERS_TABLE: &str = "orders";

/// 订单金额范围（单位：分）
pub const AMOUNT_CENTS_RANGE: RangeInclusive<i32> = 1000..=10000;

/// 订单
///
/// 字段与表列一一对应：`amount_cents` 对应 `total_amount_cents`，
/// `updated_at` 对应 `last_updated_at`，时间戳均为毫秒级 Unix 时间。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    pub amount_cents: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// 创建新订单，`created_at` 与 `updated_at` 相同
    pub fn new(id: String, status: OrderStatus, amount_cents: i32, now_millis: i64) -> Self {
        Self {
            id,
            status,
            amount_cents,
            created_at: now_millis,
            updated_at: now_millis,
        }
    }

    /// 更新状态并刷新更新时间
    pub fn touch(&mut self, status: OrderStatus, now_millis: i64) {
        self.status = status;
        self.updated_at = next_updated_at(self.updated_at, now_millis);
    }
}

/// 计算新的更新时间
///
/// 同一毫秒内的多次更新也必须严格递增。
pub fn next_updated_at(previous: i64, now_millis: i64) -> i64 {
    now_millis.max(previous.saturating_add(1))
}

/// 订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// 全部状态
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Paid,
        Self::Shipped,
        Self::Cancelled,
        Self::Refunded,
    ];

    /// 数据库中存储的字符串值
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 无法识别的状态值
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("未知的订单状态: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_timestamps_match() {
        let order = Order::new("id-1".to_string(), OrderStatus::Paid, 5000, 11111);
        assert_eq!(order.created_at, 11111);
        assert_eq!(order.updated_at, order.created_at);
    }

    #[test]
    fn test_touch_strictly_increases_updated_at() {
        let mut order = Order::new("id-1".to_string(), OrderStatus::Pending, 5000, 11111);

        // 同一毫秒内更新
        order.touch(OrderStatus::Shipped, 11111);
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.updated_at, 11112);

        // 时钟回拨
        order.touch(OrderStatus::Paid, 10000);
        assert_eq!(order.updated_at, 11113);

        order.touch(OrderStatus::Paid, 20000);
        assert_eq!(order.updated_at, 20000);
        assert!(order.updated_at >= order.created_at);
    }

    #[test]
    fn test_status_string_mapping() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
            assert_eq!(status.to_string(), status.as_str());
        }
        assert_eq!(
            "shipping".parse::<OrderStatus>(),
            Err(UnknownStatus("shipping".to_string()))
        );
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }
}
