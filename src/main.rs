use clap::Parser;
use tracing::debug;

use stepguard::app::{handle_fatal_error, init_logging, AppConfig};
use stepguard::cli::{execute_command, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = AppConfig::new(cli.verbose);
    init_logging(&config);

    let config = match config.with_config_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => handle_fatal_error(e.into(), cli.verbose),
    };
    debug!("Configuration file: {:?}", config.config_path);

    match execute_command(cli.command, &config).await {
        Ok(code) => std::process::exit(code),
        Err(e) => handle_fatal_error(e, cli.verbose),
    }
}
