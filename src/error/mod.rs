use std::fmt::Display;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// The unified error type for stepguard
///
/// Only programmer and configuration mistakes travel through this type.
/// Expected failures (exhausted retries, rejected input) are reported through
/// `ExecutionReport` and `ValidationResult` instead.
#[derive(Error, Debug)]
pub enum StepGuardError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] {message}")]
    Other {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StepGuardError {
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Failure outside configuration, such as writing step outputs
    pub fn other_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Other {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Other { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Append `: <context>` to the message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::Other { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    /// Get the process exit code for this error
    ///
    /// Configuration errors use the conventional sentinel 2 so callers can
    /// tell them apart from a command's own failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Other { .. } => 1,
        }
    }

    /// Numeric code from [`ErrorCode`]
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. } | Self::Other { code, .. } => *code,
        }
    }

    /// Whether this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Message printed to stderr by the binary
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, .. } => format!("Configuration problem: {}", message),
            Self::Other { message, .. } => message.clone(),
        }
    }

    /// Display form followed by every `caused by:` in the source chain
    pub fn developer_message(&self) -> String {
        let mut msg = format!("{}", self);
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            msg.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        msg
    }
}

/// Type alias for Results using StepGuardError
pub type Result<T> = std::result::Result<T, StepGuardError>;

impl From<std::io::Error> for StepGuardError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::CONFIG_NOT_FOUND,
            _ => ErrorCode::OTHER_GENERIC,
        };
        if code == ErrorCode::CONFIG_NOT_FOUND {
            StepGuardError::config_with_code(code, err.to_string()).with_source(err)
        } else {
            StepGuardError::other_with_code(code, err.to_string()).with_source(err)
        }
    }
}

impl From<serde_yaml::Error> for StepGuardError {
    fn from(err: serde_yaml::Error) -> Self {
        StepGuardError::config_with_code(ErrorCode::CONFIG_INVALID_YAML, err.to_string())
            .with_source(err)
    }
}

impl From<toml::de::Error> for StepGuardError {
    fn from(err: toml::de::Error) -> Self {
        StepGuardError::config_with_code(ErrorCode::CONFIG_INVALID_TOML, err.to_string())
            .with_source(err)
    }
}

impl From<regex::Error> for StepGuardError {
    fn from(err: regex::Error) -> Self {
        StepGuardError::config_with_code(ErrorCode::CONFIG_INVALID_PATTERN, err.to_string())
            .with_source(err)
    }
}
