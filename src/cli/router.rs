//! Command routing and execution

use anyhow::Result;

use crate::app::AppConfig;
use crate::cli::args::Commands;
use crate::cli::commands::*;

/// Run a command and return the process exit code
pub async fn execute_command(command: Commands, config: &AppConfig) -> Result<i32> {
    match command {
        Commands::Retry(args) => run_retry_command(args, config).await,
        Commands::Validate(args) => run_validate_command(args, config),
        Commands::Rules(args) => run_rules_command(args, config),
    }
}
