//! 命令执行器
//!
//! 将校验后的命令交给存储执行，并输出操作开始、结果和失败的结构化日志。

use std::sync::Arc;

use tracing::{error, info, warn};

use orders_shared::Result;

use super::commands::Command;
use crate::store::OrderStore;

/// 命令执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: Command,
    /// 受影响的行数；drop 时为删表前的行数
    pub affected: u64,
    pub rows_before: u64,
    /// 操作提交后的行数；读取失败时为 `None`
    pub rows_after: Option<u64>,
}

/// 命令执行器
///
/// 作为 CLI 与存储之间的桥梁，简化 main 函数的复杂度。
pub struct CommandRunner {
    store: Arc<dyn OrderStore>,
}

impl CommandRunner {
    /// 创建命令执行器
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// 执行命令
    ///
    /// 失败时记录错误码与错误信息后原样返回，不做重试。
    pub async fn run(&self, command: Command) -> Result<CommandOutcome> {
        info!(
            action = command.name(),
            requested = ?command.requested(),
            "Starting action"
        );

        let result = self.execute(command).await;

        match result {
            Ok(outcome) => {
                info!(
                    action = command.name(),
                    requested = ?command.requested(),
                    affected = outcome.affected,
                    rows_before = outcome.rows_before,
                    rows_after = ?outcome.rows_after,
                    "Action completed"
                );
                Ok(outcome)
            }
            Err(e) => {
                error!(
                    action = command.name(),
                    code = e.code(),
                    error = %e,
                    "Action failed"
                );
                Err(e)
            }
        }
    }

    async fn execute(&self, command: Command) -> Result<CommandOutcome> {
        let rows_before = self.store.row_count().await?;

        let affected = match command {
            Command::Insert(n) => self.store.insert(n).await?,
            Command::Update(n) => self.store.update(n).await?,
            Command::Delete(n) => self.store.delete(n).await?,
            Command::Drop => {
                self.store.drop_table().await?;
                rows_before
            }
        };

        // 操作已提交，之后的计数失败不影响结果
        let rows_after = match self.store.row_count().await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(
                    action = command.name(),
                    code = e.code(),
                    error = %e,
                    "Failed to read row count after action"
                );
                None
            }
        };

        Ok(CommandOutcome {
            command,
            affected,
            rows_before,
            rows_after,
        })
    }
}
