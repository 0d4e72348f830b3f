//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构，并在访问数据库之前完成参数校验。

use clap::{Parser, ValueEnum};
use tracing::warn;

use orders_shared::{OrdersError, Result};

/// orders 表数据生成工具
///
/// 向 PostgreSQL 的 orders 表写入、更新、删除随机数据，用于本地 CDC 实验。
#[derive(Parser, Debug)]
#[command(name = "orders-datagen")]
#[command(version, about = "Data generator for the Postgres CDC orders table")]
pub struct Cli {
    /// 要执行的操作
    #[arg(long, value_enum)]
    pub action: Option<Action>,

    /// 受影响的行数（指定 --action 时必填，必须 >= 1）
    #[arg(long, allow_negative_numbers = true)]
    pub num_rows: Option<i64>,

    /// 删除 orders 表；与 --action 同时出现时优先生效
    #[arg(long)]
    pub clean: bool,

    /// 随机数种子，用于生成可复现的数据
    #[arg(long)]
    pub seed: Option<u64>,

    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// 日志格式 (json, pretty)，覆盖配置文件
    #[arg(long)]
    pub log_format: Option<String>,
}

/// 数据操作
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Insert,
    Update,
    Delete,
}

/// 校验后的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Insert(u64),
    Update(u64),
    Delete(u64),
    Drop,
}

impl Command {
    /// 日志中使用的操作名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::Drop => "drop",
        }
    }

    /// 请求的行数，drop 无行数
    pub fn requested(&self) -> Option<u64> {
        match self {
            Self::Insert(n) | Self::Update(n) | Self::Delete(n) => Some(*n),
            Self::Drop => None,
        }
    }
}

impl Cli {
    /// 将命令行参数解析为命令
    ///
    /// `--clean` 优先于 `--action` / `--num-rows`：同时出现时忽略后者并记录警告。
    pub fn resolve(&self) -> Result<Command> {
        if self.clean {
            let mut ignored = Vec::new();
            if self.action.is_some() {
                ignored.push("--action");
            }
            if self.num_rows.is_some() {
                ignored.push("--num-rows");
            }
            if !ignored.is_empty() {
                warn!(ignored = ?ignored, "--clean takes precedence, ignoring other flags");
            }
            return Ok(Command::Drop);
        }

        let Some(action) = self.action else {
            let message = if self.num_rows.is_some() {
                "--num-rows requires --action"
            } else {
                "one of --action or --clean is required"
            };
            return Err(OrdersError::invalid_argument("action", message));
        };

        let num_rows = self.num_rows.ok_or_else(|| {
            OrdersError::invalid_argument(
                "num_rows",
                "--num-rows is required when --action is provided",
            )
        })?;

        let n = u64::try_from(num_rows)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                OrdersError::invalid_argument(
                    "num_rows",
                    format!("--num-rows must be >= 1, got {num_rows}"),
                )
            })?;

        Ok(match action {
            Action::Insert => Command::Insert(n),
            Action::Update => Command::Update(n),
            Action::Delete => Command::Delete(n),
        })
    }
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(args: &[&str]) -> Result<Command> {
        let mut argv = vec!["orders-datagen"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv).resolve()
    }

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["orders-datagen"]);
        assert!(cli.action.is_none());
        assert!(cli.num_rows.is_none());
        assert!(!cli.clean);
        assert!(cli.seed.is_none());
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_resolve_actions() {
        assert_eq!(
            resolve(&["--action", "insert", "--num-rows", "10"]).unwrap(),
            Command::Insert(10)
        );
        assert_eq!(
            resolve(&["--action", "update", "--num-rows", "5"]).unwrap(),
            Command::Update(5)
        );
        assert_eq!(
            resolve(&["--action", "delete", "--num-rows", "3"]).unwrap(),
            Command::Delete(3)
        );
    }

    #[test]
    fn test_resolve_clean() {
        assert_eq!(resolve(&["--clean"]).unwrap(), Command::Drop);
    }

    #[test]
    fn test_clean_takes_precedence() {
        let command = resolve(&["--clean", "--action", "insert", "--num-rows", "10"]).unwrap();
        assert_eq!(command, Command::Drop);
        assert_eq!(command.requested(), None);

        // 即使行数非法也以 --clean 为准
        assert_eq!(
            resolve(&["--clean", "--num-rows", "-1"]).unwrap(),
            Command::Drop
        );
    }

    #[test]
    fn test_action_requires_num_rows() {
        let err = resolve(&["--action", "insert"]).unwrap_err();
        assert!(matches!(
            err,
            OrdersError::InvalidArgument { ref field, .. } if field == "num_rows"
        ));
    }

    #[test]
    fn test_num_rows_must_be_positive() {
        for value in ["0", "-5"] {
            let err = resolve(&["--action", "delete", "--num-rows", value]).unwrap_err();
            assert_eq!(err.code(), "INVALID_ARGUMENT");
        }
    }

    #[test]
    fn test_nothing_to_do_is_invalid() {
        let err = resolve(&[]).unwrap_err();
        assert!(matches!(
            err,
            OrdersError::InvalidArgument { ref field, .. } if field == "action"
        ));

        let err = resolve(&["--num-rows", "3"]).unwrap_err();
        assert!(err.to_string().contains("--num-rows requires --action"));
    }

    #[test]
    fn test_unknown_action_rejected_by_parser() {
        let result = Cli::try_parse_from(["orders-datagen", "--action", "upsert"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::parse_from([
            "orders-datagen",
            "--seed",
            "7",
            "--log-level",
            "debug",
            "--log-format",
            "pretty",
            "--clean",
        ]);

        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_format.as_deref(), Some("pretty"));
    }

    #[test]
    fn test_command_metadata() {
        assert_eq!(Command::Insert(4).name(), "insert");
        assert_eq!(Command::Delete(2).requested(), Some(2));
        assert_eq!(Command::Drop.name(), "drop");
    }
}
