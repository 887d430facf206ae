use bounce::cli::{run_cli, Cli};
use bounce::config::AppConfig;
use bounce::logging::init_logging;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.command.config_path())?;
    init_logging(&config.log)?;
    run_cli(cli, config).await
}
