use anyhow::Context;
use clap::Parser;
use fc_kernel::config::load_config;
use fc_kernel::domain::config::ApiConfig;
use fc_kernel::domain::constants::APP_NAME;
use fc_logger::Logger;
use fc_server::Server;
use fc_server::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg: ApiConfig =
        load_config(cli.config.as_deref()).context("Critical: Configuration is malformed")?;
    cli.apply(&mut cfg);

    let builder = Logger::builder()
        .name(APP_NAME)
        .env_filter(cfg.logging.level.as_str())
        .json(cfg.logging.json);
    let _log = match &cfg.logging.directory {
        Some(dir) => builder.path(dir).init()?,
        None => builder.init()?,
    };

    Server::builder().config(cfg).build().await?.run().await
}
