/// Conventional shell exit code for "command not found"
pub const NOT_FOUND_EXIT_CODE: i32 = 127;
/// Conventional shell exit code for "found but not executable"
pub const NOT_EXECUTABLE_EXIT_CODE: i32 = 126;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mock expectation not met: {0}")]
    MockExpectationNotMet(String),
}

impl ProcessError {
    /// Exit code a shell would have reported for this failure
    ///
    /// Spawn failures are folded into ordinary exit codes so they flow through
    /// the same retry classification as any other attempt.
    pub fn as_exit_code(&self) -> i32 {
        match self {
            ProcessError::CommandNotFound(_) => NOT_FOUND_EXIT_CODE,
            ProcessError::PermissionDenied(_) => NOT_EXECUTABLE_EXIT_CODE,
            _ => 1,
        }
    }
}
