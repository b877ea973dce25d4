//! Retry executor: runs a shell command under a [`RetryPolicy`]

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::policy::{AttemptOutcome, RetryPolicy};
use super::report::{AttemptResult, ExecutionReport};
use crate::error::{ErrorCode, Result, StepGuardError};
use crate::subprocess::{ProcessCommandBuilder, ProcessRunner, SubprocessManager};

/// Shells a command may run under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shell {
    #[default]
    Bash,
    Sh,
}

impl Shell {
    pub const ALLOWED: [&'static str; 2] = ["bash", "sh"];

    pub fn program(self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Sh => "sh",
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for Shell {
    type Err = StepGuardError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "bash" => Ok(Shell::Bash),
            "sh" => Ok(Shell::Sh),
            other => Err(StepGuardError::config_with_code(
                ErrorCode::CONFIG_UNSUPPORTED_SHELL,
                format!("shell '{}' is not allowed (expected bash or sh)", other),
            )),
        }
    }
}

/// Runs commands with bounded retries
///
/// The executor holds no per-run state; every `execute` call owns its policy
/// and builds its own report, so one executor can serve concurrent callers.
#[derive(Clone)]
pub struct RetryExecutor {
    runner: Arc<dyn ProcessRunner>,
    permitted_root: Option<PathBuf>,
    capture_output: bool,
}

impl RetryExecutor {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            permitted_root: None,
            capture_output: false,
        }
    }

    pub fn production() -> Self {
        Self::new(SubprocessManager::production().runner())
    }

    /// Refuse working directories that resolve outside `root`
    pub fn with_permitted_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.permitted_root = Some(root.into());
        self
    }

    /// Pipe the command's output instead of streaming it to our stdio
    pub fn with_captured_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    /// Execute `command` under `policy`
    ///
    /// Configuration problems (bad policy bounds, empty command, shell outside
    /// the allow-list, unusable working directory) are returned as errors
    /// before anything is spawned. Every other outcome, including exhausted
    /// retries, is described by the returned report.
    pub async fn execute(
        &self,
        command: &str,
        policy: &RetryPolicy,
        working_directory: &Path,
        shell: &str,
    ) -> Result<ExecutionReport> {
        let shell: Shell = shell.parse()?;
        policy.validate()?;
        if command.trim().is_empty() {
            return Err(StepGuardError::config_with_code(
                ErrorCode::CONFIG_MISSING_REQUIRED,
                "command must not be empty",
            ));
        }
        let working_directory = self.resolve_working_directory(working_directory)?;

        debug!(
            "Running under {} in {} (max {} attempts, {} backoff, base {}s, timeout {}s)",
            shell,
            working_directory.display(),
            policy.max_retries,
            policy.backoff_strategy,
            policy.retry_delay_seconds,
            policy.timeout_seconds
        );

        let start = Instant::now();
        let mut results = Vec::new();
        let mut total_delay = Duration::ZERO;
        let mut attempt = 1;

        loop {
            let result = self
                .run_attempt(command, policy, &working_directory, shell, attempt)
                .await;
            let outcome = result.outcome;
            let exit_code = result.exit_code;
            results.push(result);

            match outcome {
                AttemptOutcome::Success => {
                    info!("Command succeeded on attempt {}/{}", attempt, policy.max_retries);
                    break;
                }
                AttemptOutcome::Retryable if attempt < policy.max_retries => {
                    let delay = policy.delay_for(attempt);
                    info!(
                        "Attempt {}/{} failed with exit code {}, retrying after {:?}",
                        attempt, policy.max_retries, exit_code, delay
                    );
                    tokio::time::sleep(delay).await;
                    total_delay += delay;
                    attempt += 1;
                }
                AttemptOutcome::Retryable => {
                    warn!(
                        "Command failed after {} attempts, last exit code {}",
                        attempt, exit_code
                    );
                    break;
                }
                AttemptOutcome::Fatal => {
                    warn!(
                        "Attempt {}/{} failed with non-retryable exit code {}",
                        attempt, policy.max_retries, exit_code
                    );
                    break;
                }
            }
        }

        Ok(ExecutionReport::from_attempts(
            results,
            start.elapsed(),
            total_delay,
        ))
    }

    async fn run_attempt(
        &self,
        command: &str,
        policy: &RetryPolicy,
        working_directory: &Path,
        shell: Shell,
        attempt: u32,
    ) -> AttemptResult {
        let process = ProcessCommandBuilder::new(shell.program())
            .arg("-c")
            .arg(command)
            .current_dir(working_directory)
            .timeout(policy.timeout())
            .capture_output(self.capture_output)
            .build();

        let start = Instant::now();
        let (exit_code, timed_out) = match self.runner.run(process).await {
            Ok(output) => (output.status.exit_code(), output.status.timed_out()),
            Err(err) => {
                warn!("Attempt {} could not start: {}", attempt, err);
                (err.as_exit_code(), false)
            }
        };

        let outcome = policy.classify(exit_code);
        debug!(
            "Attempt {} finished with exit code {} ({:?}{})",
            attempt,
            exit_code,
            outcome,
            if timed_out { ", timed out" } else { "" }
        );

        AttemptResult {
            attempt,
            exit_code,
            duration: start.elapsed(),
            timed_out,
            outcome,
        }
    }

    /// Check the working directory and canonicalize it
    pub fn resolve_working_directory(&self, dir: &Path) -> Result<PathBuf> {
        if dir.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(StepGuardError::config_with_code(
                ErrorCode::CONFIG_PATH_ERROR,
                format!(
                    "working directory '{}' must not contain '..'",
                    dir.display()
                ),
            ));
        }

        if !dir.is_dir() {
            return Err(StepGuardError::config_with_code(
                ErrorCode::CONFIG_PATH_ERROR,
                format!("working directory '{}' does not exist", dir.display()),
            ));
        }

        let canonical = dir.canonicalize().map_err(|e| {
            StepGuardError::config_with_code(
                ErrorCode::CONFIG_PATH_ERROR,
                format!("cannot resolve working directory '{}'", dir.display()),
            )
            .with_source(e)
        })?;

        if let Some(root) = &self.permitted_root {
            let root = root.canonicalize().map_err(|e| {
                StepGuardError::config_with_code(
                    ErrorCode::CONFIG_PATH_ERROR,
                    format!("cannot resolve permitted root '{}'", root.display()),
                )
                .with_source(e)
            })?;
            if !canonical.starts_with(&root) {
                return Err(StepGuardError::config_with_code(
                    ErrorCode::CONFIG_PATH_ERROR,
                    format!(
                        "working directory '{}' is outside '{}'",
                        dir.display(),
                        root.display()
                    ),
                ));
            }
        }

        Ok(canonical)
    }
}
