//! 生成器模块
//!
//! 随机数据与时间都从这里取得，测试可注入固定种子和手动时钟。

pub mod clock;
pub mod order_generator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use order_generator::{OrderGenerator, RandomOrderGenerator};
