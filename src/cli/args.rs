//! CLI argument structures
//!
//! Action inputs arrive as strings, exactly as a workflow passes them; an
//! empty string means "not set". Typed parsing happens after validation.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Retry commands and validate action inputs in CI steps
#[derive(Parser, Debug)]
#[command(name = "stepguard")]
#[command(about = "stepguard - retry commands and validate action inputs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// TOML file with retry defaults and a rules directory
    #[arg(short = 'c', long, global = true, env = "STEPGUARD_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a shell command with bounded retries and backoff
    #[command(name = "retry")]
    Retry(RetryArgs),

    /// Validate one action input
    #[command(name = "validate")]
    Validate(ValidateArgs),

    /// List the rules that apply to an action's inputs
    #[command(name = "rules")]
    Rules(RulesArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RetryArgs {
    /// Command to run through the shell
    #[arg(long)]
    pub command: String,

    /// Maximum number of attempts (1-10, default 3)
    #[arg(long, value_name = "N")]
    pub max_retries: Option<String>,

    /// Base delay between attempts in seconds (1-300, default 5)
    #[arg(long, value_name = "SECONDS")]
    pub retry_delay: Option<String>,

    /// linear, exponential or fixed (default exponential)
    #[arg(long, value_name = "STRATEGY")]
    pub backoff_strategy: Option<String>,

    /// Per-attempt timeout in seconds (1-3600, default 600)
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<String>,

    /// Directory to run the command in (default .)
    #[arg(long, value_name = "DIR")]
    pub working_directory: Option<String>,

    /// bash or sh (default bash)
    #[arg(long)]
    pub shell: Option<String>,

    /// Exit codes that count as success (default 0)
    #[arg(long, value_name = "CODES")]
    pub success_codes: Option<String>,

    /// Exit codes worth another attempt (default 1,2,124,126,127)
    #[arg(long, value_name = "CODES")]
    pub retry_codes: Option<String>,

    /// Add up to 10% random delay on top of each backoff
    #[arg(long)]
    pub jitter: bool,

    /// Print the full execution report as JSON
    #[arg(long)]
    pub json: bool,

    /// Append key=value outputs to this file
    #[arg(long, env = "GITHUB_OUTPUT", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Action the input belongs to
    #[arg(long)]
    pub action: String,

    /// Input name
    #[arg(long)]
    pub input: String,

    /// Value to check (may be empty)
    #[arg(long, allow_hyphen_values = true, default_value = "")]
    pub value: String,

    /// Directory of YAML rule files
    #[arg(long, value_name = "DIR")]
    pub rules_dir: Option<PathBuf>,

    /// action.yml whose inputs block supplies required/default flags
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Append key=value outputs to this file
    #[arg(long, env = "GITHUB_OUTPUT", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RulesArgs {
    /// Show the inputs of one action instead of the action list
    #[arg(long)]
    pub action: Option<String>,

    /// Directory of YAML rule files
    #[arg(long, value_name = "DIR")]
    pub rules_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_retry() {
        let cli = Cli::try_parse_from([
            "stepguard",
            "-vv",
            "retry",
            "--command",
            "npm ci",
            "--max-retries",
            "5",
            "--jitter",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Retry(args) => {
                assert_eq!(args.command, "npm ci");
                assert_eq!(args.max_retries.as_deref(), Some("5"));
                assert!(args.jitter);
                assert_eq!(args.shell, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_validate_with_dash_value() {
        let cli = Cli::try_parse_from([
            "stepguard",
            "validate",
            "--action",
            "eslint-lint",
            "--input",
            "args",
            "--value",
            "--max-warnings 0",
        ])
        .unwrap();
        match cli.command {
            Commands::Validate(args) => assert_eq!(args.value, "--max-warnings 0"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
