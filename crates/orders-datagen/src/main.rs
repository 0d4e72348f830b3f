//! orders-datagen 命令行入口
//!
//! 加载配置、初始化日志、校验参数后连接数据库并执行单个操作。

use std::sync::Arc;

use clap::Parser;
use orders_datagen::cli::{Cli, CommandRunner};
use orders_datagen::generators::RandomOrderGenerator;
use orders_datagen::store::PgOrderStore;
use orders_shared::{config::AppConfig, database::Database, observability};
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.observability.log_format = format.parse()?;
    }
    observability::init(&config.observability)?;

    // 参数校验在连接数据库之前完成
    let command = cli.resolve().inspect_err(|e| {
        error!(code = e.code(), error = %e, "Invalid arguments");
    })?;

    let db = Database::connect(&config.database).await.inspect_err(|e| {
        error!(code = e.code(), error = %e, "Failed to connect to database");
    })?;

    let generator = match cli.seed {
        Some(seed) => RandomOrderGenerator::from_seed(seed),
        None => RandomOrderGenerator::from_os_rng(),
    };
    let store = PgOrderStore::new(db.pool().clone(), config.store.batch_size)
        .with_generator(generator);

    let runner = CommandRunner::new(Arc::new(store));
    let result = runner.run(command).await;

    db.close().await;
    result?;

    Ok(())
}
