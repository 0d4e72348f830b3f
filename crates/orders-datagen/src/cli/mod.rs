//! CLI 模块
//!
//! 提供命令行接口：
//!
//! - `--action insert|update|delete --num-rows N` - 写入、更新、删除随机订单
//! - `--clean` - 删除 orders 表
//!
//! # 使用示例
//!
//! ```bash
//! orders-datagen --action insert --num-rows 10
//! orders-datagen --action update --num-rows 5 --seed 42
//! orders-datagen --action delete --num-rows 100
//! orders-datagen --clean
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Action, Cli, Command};
pub use runner::{CommandOutcome, CommandRunner};
