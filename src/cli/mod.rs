//! CLI command handlers
//!
//! - Argument parsing structures
//! - Command implementations
//! - `key=value` step outputs

pub mod args;
pub mod commands;
pub mod output;
pub mod router;

pub use args::{Cli, Commands};
pub use router::execute_command;
