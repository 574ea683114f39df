use anyhow::Context;
use vpms::domain::config::ApiConfig;
use vpms::kernel::config::load_config;
use vpms_logger::{LevelFilter, Logger};
use vpms_server::Server;

#[vpms_runtime::main(high_performance)]
async fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig = load_config(Some("server")).context("Critical: Configuration is malformed")?;

    let logging = &cfg.logging;
    let level = logging.level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    let logger = Logger::builder().name(env!("CARGO_PKG_NAME")).level(level);
    let _log = match &logging.dir {
        Some(dir) => logger.path(dir).max_files(logging.max_files).json(logging.json).init()?,
        None => logger.init()?,
    };

    Server::builder().config(cfg).build().await?.run().await
}
