//! Command implementation modules
//!
//! Each handler returns the process exit code; errors bubble up to
//! `handle_fatal_error`.

pub mod retry;
pub mod rules;
pub mod validate;

use std::path::Path;

use crate::error::Result;
use crate::validation::{InputValidator, RuleSet};

pub use retry::run_retry_command;
pub use rules::run_rules_command;
pub use validate::run_validate_command;

/// Built-in validator, extended by a rules directory when one is configured
pub fn build_validator(rules_dir: Option<&Path>) -> Result<InputValidator> {
    let validator = InputValidator::new();
    match rules_dir {
        Some(dir) => Ok(validator.with_rules(RuleSet::load_dir(dir)?)),
        None => Ok(validator),
    }
}
