use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, trace, warn};

use super::error::ProcessError;

/// Exit code reported for an attempt that hit its wall-clock timeout
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// A program invocation; the program is spawned directly, never through a shell
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Wall-clock ceiling; the child is killed when it is exceeded
    pub timeout: Option<Duration>,
    /// Pipe and collect stdout/stderr instead of inheriting the parent's stdio
    pub capture_output: bool,
}

impl ProcessCommand {
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Timeout,
    Signal(i32),
}

impl ExitStatus {
    /// Collapse the status into a shell-style exit code
    ///
    /// Timeouts become 124 and signals become `128 + signal`, matching what
    /// `timeout(1)` and POSIX shells report.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Error(code) => *code,
            ExitStatus::Timeout => TIMEOUT_EXIT_CODE,
            ExitStatus::Signal(signal) => 128 + signal,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, ExitStatus::Timeout)
    }

    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            ExitStatus::Success
        } else {
            ExitStatus::Error(code)
        }
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
}

/// Runs commands with `tokio::process`
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn build(command: &ProcessCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            // A timed-out wait future is dropped; the child must die with it
            .kill_on_drop(true);

        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        if command.capture_output {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        cmd
    }

    /// `None` means the timeout fired
    async fn wait(
        child: tokio::process::Child,
        timeout: Option<Duration>,
    ) -> Result<Option<std::process::Output>, ProcessError> {
        let output = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output,
                Err(_) => return Ok(None),
            },
            None => child.wait_with_output().await,
        };
        output.map(Some).map_err(ProcessError::Io)
    }

    fn parse_exit_status(status: std::process::ExitStatus) -> ExitStatus {
        match status.code() {
            Some(0) => ExitStatus::Success,
            Some(code) => ExitStatus::Error(code),
            None => Self::parse_signal_status(status),
        }
    }

    #[cfg(unix)]
    fn parse_signal_status(status: std::process::ExitStatus) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        status
            .signal()
            .map(ExitStatus::Signal)
            .unwrap_or(ExitStatus::Error(1))
    }

    #[cfg(not(unix))]
    fn parse_signal_status(_status: std::process::ExitStatus) -> ExitStatus {
        ExitStatus::Error(1)
    }

    fn map_spawn_error(error: std::io::Error, command: &ProcessCommand) -> ProcessError {
        match error.kind() {
            std::io::ErrorKind::NotFound => ProcessError::CommandNotFound(command.program.clone()),
            std::io::ErrorKind::PermissionDenied => {
                ProcessError::PermissionDenied(command.program.clone())
            }
            _ => ProcessError::SpawnFailed {
                command: command.display(),
                source: error,
            },
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        debug!("Spawning: {}", command.display());
        if let Some(dir) = &command.working_dir {
            trace!("Working directory: {}", dir.display());
        }

        let start = tokio::time::Instant::now();
        let child = Self::build(&command).spawn().map_err(|e| {
            warn!("Failed to spawn '{}': {}", command.program, e);
            Self::map_spawn_error(e, &command)
        })?;

        let output = Self::wait(child, command.timeout).await?;
        let duration = start.elapsed();

        let result = match output {
            Some(output) => ProcessOutput {
                status: Self::parse_exit_status(output.status),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                duration,
            },
            None => {
                warn!(
                    "'{}' timed out after {:?} and was killed",
                    command.display(),
                    duration
                );
                ProcessOutput {
                    status: ExitStatus::Timeout,
                    stdout: String::new(),
                    stderr: String::new(),
                    duration,
                }
            }
        };

        debug!(
            "'{}' exited with {} in {:?}",
            command.display(),
            result.status.exit_code(),
            result.duration
        );
        if !result.stderr.is_empty() {
            trace!("Stderr: {}", result.stderr);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(ExitStatus::Success.exit_code(), 0);
        assert_eq!(ExitStatus::Error(3).exit_code(), 3);
        assert_eq!(ExitStatus::Timeout.exit_code(), TIMEOUT_EXIT_CODE);
        assert_eq!(ExitStatus::Signal(9).exit_code(), 137);
        assert!(ExitStatus::Timeout.timed_out());
        assert!(!ExitStatus::Error(124).timed_out());
    }

    #[test]
    fn test_from_code() {
        assert_eq!(ExitStatus::from_code(0), ExitStatus::Success);
        assert_eq!(ExitStatus::from_code(2), ExitStatus::Error(2));
    }

    #[cfg(unix)]
    #[test]
    fn test_parse_exit_status() {
        use std::os::unix::process::ExitStatusExt;

        let status = std::process::ExitStatus::from_raw(0);
        assert_eq!(
            TokioProcessRunner::parse_exit_status(status),
            ExitStatus::Success
        );

        // Exit code 1
        let status = std::process::ExitStatus::from_raw(256);
        assert_eq!(
            TokioProcessRunner::parse_exit_status(status),
            ExitStatus::Error(1)
        );

        // Killed by SIGKILL
        let status = std::process::ExitStatus::from_raw(9);
        assert_eq!(
            TokioProcessRunner::parse_exit_status(status),
            ExitStatus::Signal(9)
        );
    }

    #[test]
    fn test_map_spawn_error() {
        let command = ProcessCommand {
            program: "missing-tool".to_string(),
            args: vec![],
            working_dir: None,
            timeout: None,
            capture_output: true,
        };

        let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        assert!(matches!(
            TokioProcessRunner::map_spawn_error(not_found, &command),
            ProcessError::CommandNotFound(ref p) if p == "missing-tool"
        ));

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            TokioProcessRunner::map_spawn_error(denied, &command),
            ProcessError::PermissionDenied(_)
        ));

        let other = std::io::Error::new(std::io::ErrorKind::Other, "nope");
        assert!(matches!(
            TokioProcessRunner::map_spawn_error(other, &command),
            ProcessError::SpawnFailed { .. }
        ));
    }
}
