//! Retry command implementation
//!
//! Every input is gated through the validator under `common-retry` before
//! anything runs. A rejected input is a configuration error.

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::app::AppConfig;
use crate::cli::args::RetryArgs;
use crate::cli::commands::build_validator;
use crate::cli::output::write_outputs;
use crate::error::{ErrorCode, StepGuardError};
use crate::retry::{parse_code_list, BackoffStrategy, RetryExecutor, RetryPolicy};
use crate::validation::{InputValidator, COMMON_RETRY};

/// Validated, typed retry inputs
#[derive(Debug, Clone, PartialEq)]
pub struct RetryInvocation {
    pub command: String,
    pub policy: RetryPolicy,
    pub working_directory: PathBuf,
    pub shell: String,
}

/// Raw `(input, value)` pairs: command-line flag, else config file, else empty
pub fn collect_inputs(args: &RetryArgs, config: &AppConfig) -> Vec<(&'static str, String)> {
    let defaults = &config.file.retry;
    let flags: [(&'static str, &Option<String>); 8] = [
        ("max-retries", &args.max_retries),
        ("retry-delay", &args.retry_delay),
        ("backoff-strategy", &args.backoff_strategy),
        ("timeout", &args.timeout),
        ("working-directory", &args.working_directory),
        ("shell", &args.shell),
        ("success-codes", &args.success_codes),
        ("retry-codes", &args.retry_codes),
    ];

    let mut inputs = vec![("command", args.command.clone())];
    inputs.extend(flags.into_iter().map(|(name, flag)| {
        let value = flag
            .clone()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| defaults.input(name))
            .unwrap_or_default();
        (name, value)
    }));
    inputs
}

/// Validate the raw inputs and turn them into a policy
pub fn resolve_invocation(
    args: &RetryArgs,
    config: &AppConfig,
    validator: &InputValidator,
) -> crate::error::Result<RetryInvocation> {
    let inputs = collect_inputs(args, config);
    let results = validator.validate_all(
        COMMON_RETRY,
        inputs.iter().map(|(name, value)| (*name, value.as_str())),
    );

    let rejected: Vec<String> = results
        .values()
        .filter(|r| !r.valid)
        .filter_map(|r| r.error_message.clone())
        .collect();
    if !rejected.is_empty() {
        return Err(StepGuardError::config_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            rejected.join("; "),
        ));
    }

    // Accepted value, else the rule's default; empty means "policy default"
    let value = |name: &str| -> String {
        results
            .get(name)
            .and_then(|r| r.normalized_value.clone())
            .or_else(|| validator.default_for(COMMON_RETRY, name))
            .unwrap_or_default()
    };

    let mut builder = RetryPolicy::builder().jitter(
        args.jitter || config.file.retry.jitter.unwrap_or(false),
    );
    if let Some(n) = parse_number(&value("max-retries"))? {
        builder = builder.max_retries(n);
    }
    if let Some(n) = parse_number(&value("retry-delay"))? {
        builder = builder.retry_delay_seconds(n);
    }
    if let Some(n) = parse_number(&value("timeout"))? {
        builder = builder.timeout_seconds(n);
    }
    let strategy = value("backoff-strategy");
    if !strategy.is_empty() {
        builder = builder.backoff(strategy.parse::<BackoffStrategy>()?);
    }
    let success_codes = value("success-codes");
    if !success_codes.is_empty() {
        builder = builder.success_codes(parse_code_list(&success_codes)?);
    }
    let retry_codes = value("retry-codes");
    if !retry_codes.is_empty() {
        builder = builder.retry_codes(parse_code_list(&retry_codes)?);
    }

    let working_directory = match value("working-directory") {
        dir if dir.is_empty() => PathBuf::from("."),
        dir => PathBuf::from(dir),
    };
    let shell = match value("shell") {
        shell if shell.is_empty() => "bash".to_string(),
        shell => shell,
    };

    Ok(RetryInvocation {
        command: value("command"),
        policy: builder.build()?,
        working_directory,
        shell,
    })
}

fn parse_number<T: std::str::FromStr>(value: &str) -> crate::error::Result<Option<T>> {
    if value.is_empty() {
        return Ok(None);
    }
    value.parse::<T>().map(Some).map_err(|_| {
        StepGuardError::config_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            format!("'{}' is not a valid number", value),
        )
    })
}

/// Execute the retry command
pub async fn run_retry_command(args: RetryArgs, config: &AppConfig) -> Result<i32> {
    let validator = build_validator(config.rules_dir(None).as_deref())?;
    let invocation = resolve_invocation(&args, config, &validator)?;
    debug!("Resolved retry policy: {:?}", invocation.policy);

    let report = RetryExecutor::production()
        .execute(
            &invocation.command,
            &invocation.policy,
            &invocation.working_directory,
            &invocation.shell,
        )
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    if args.output.is_some() || !args.json {
        write_outputs(args.output.as_deref(), &report.outputs())?;
    }

    Ok(report.exit_code())
}
