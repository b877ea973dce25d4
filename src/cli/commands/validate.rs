//! Validate command implementation

use anyhow::Result;
use tracing::warn;

use crate::app::AppConfig;
use crate::cli::args::ValidateArgs;
use crate::cli::commands::build_validator;
use crate::cli::output::write_outputs;
use crate::validation::{ActionSchema, InputValidator, ValidationResult};

pub fn validator_for(
    args: &ValidateArgs,
    config: &AppConfig,
) -> crate::error::Result<InputValidator> {
    let validator = build_validator(config.rules_dir(args.rules_dir.as_deref()).as_deref())?;
    match &args.schema {
        Some(path) => Ok(validator.with_schema(ActionSchema::from_file(path)?)),
        None => Ok(validator),
    }
}

/// Exit 0 when the value is accepted and 1 when it is rejected
pub fn run_validate_command(args: ValidateArgs, config: &AppConfig) -> Result<i32> {
    let validator = validator_for(&args, config)?;
    let result: ValidationResult = validator.validate(&args.action, &args.input, &args.value);

    if let Some(message) = &result.error_message {
        warn!("{}", message);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    if args.output.is_some() || !args.json {
        write_outputs(args.output.as_deref(), &result.outputs())?;
    }

    Ok(if result.valid { 0 } else { 1 })
}
