//! 订单数据生成器
//!
//! 生成订单 ID、状态、金额，以及更新/删除时的随机行选择。

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::models::{AMOUNT_CENTS_RANGE, Order, OrderStatus};

/// 订单随机数据来源
pub trait OrderGenerator: Send {
    /// 生成唯一订单 ID（UUIDv4 字符串）
    fn next_id(&mut self) -> String;

    /// 随机订单状态
    fn next_status(&mut self) -> OrderStatus;

    /// 随机订单金额（分）
    fn next_amount_cents(&mut self) -> i32;

    /// 从 `0..len` 中无放回地选出 `amount` 个下标
    ///
    /// 调用方保证 `amount <= len`。
    fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize>;

    /// 生成一条完整订单
    fn next_order(&mut self, now_millis: i64) -> Order {
        let id = self.next_id();
        let status = self.next_status();
        let amount_cents = self.next_amount_cents();
        Order::new(id, status, amount_cents, now_millis)
    }
}

/// 基于 StdRng 的生成器
///
/// 相同种子产生相同的数据序列。
#[derive(Debug, Clone)]
pub struct RandomOrderGenerator {
    rng: StdRng,
}

impl RandomOrderGenerator {
    /// 使用固定种子创建
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 使用系统熵源创建
    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Default for RandomOrderGenerator {
    fn default() -> Self {
        Self::from_os_rng()
    }
}

impl OrderGenerator for RandomOrderGenerator {
    fn next_id(&mut self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes);
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string()
    }

    fn next_status(&mut self) -> OrderStatus {
        OrderStatus::ALL[self.rng.random_range(0..OrderStatus::ALL.len())]
    }

    fn next_amount_cents(&mut self) -> i32 {
        self.rng.random_range(AMOUNT_CENTS_RANGE)
    }

    fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        index::sample(&mut self.rng, len, amount.min(len)).into_vec()
    }
}

/// 校验字符串是否为 UUIDv4
pub fn is_v4_id(id: &str) -> bool {
    Uuid::parse_str(id)
        .map(|uuid| uuid.get_version_num() == 4)
        .unwrap_or(false)
}
