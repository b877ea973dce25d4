//! Application configuration
//!
//! Verbosity comes from the command line; retry defaults and the rules
//! directory may come from an optional TOML file. Command-line flags always
//! win over file values.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ErrorCode, Result, StepGuardError};

/// Defaults for `stepguard retry`, as written under `[retry]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RetryDefaults {
    pub max_retries: Option<u32>,
    pub retry_delay: Option<u64>,
    pub backoff_strategy: Option<String>,
    pub timeout: Option<u64>,
    pub shell: Option<String>,
    pub success_codes: Option<Vec<i32>>,
    pub retry_codes: Option<Vec<i32>>,
    pub jitter: Option<bool>,
}

impl RetryDefaults {
    /// Value for a `common-retry` input, rendered the way an action passes it
    pub fn input(&self, name: &str) -> Option<String> {
        match name {
            "max-retries" => self.max_retries.map(|v| v.to_string()),
            "retry-delay" => self.retry_delay.map(|v| v.to_string()),
            "backoff-strategy" => self.backoff_strategy.clone(),
            "timeout" => self.timeout.map(|v| v.to_string()),
            "shell" => self.shell.clone(),
            "success-codes" => self.success_codes.as_deref().map(join_codes),
            "retry-codes" => self.retry_codes.as_deref().map(join_codes),
            _ => None,
        }
    }
}

fn join_codes(codes: &[i32]) -> String {
    codes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Settings under `[validation]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ValidationConfig {
    pub rules_dir: Option<PathBuf>,
}

/// Contents of a `stepguard.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub retry: RetryDefaults,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl FileConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StepGuardError::config_with_code(
                ErrorCode::CONFIG_NOT_FOUND,
                format!("cannot read config file '{}'", path.display()),
            )
            .with_source(e)
        })?;
        let config = Self::from_toml(&content).map_err(|e| e.with_context(path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Application configuration structure
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Verbosity level for logging
    pub verbose: u8,
    pub config_path: Option<PathBuf>,
    pub file: FileConfig,
}

impl AppConfig {
    pub fn new(verbose: u8) -> Self {
        Self {
            verbose,
            ..Self::default()
        }
    }

    /// Load the TOML file, if one was given
    pub fn with_config_file(mut self, path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            self.file = FileConfig::load(path)?;
            self.config_path = Some(path.to_path_buf());
        }
        Ok(self)
    }

    /// Rules directory from the file, unless the command line names one
    pub fn rules_dir(&self, cli_value: Option<&Path>) -> Option<PathBuf> {
        cli_value
            .map(Path::to_path_buf)
            .or_else(|| self.file.validation.rules_dir.clone())
    }

    /// Get the log level string based on verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_from_verbosity() {
        assert_eq!(AppConfig::new(0).log_level(), "info");
        assert_eq!(AppConfig::new(1).log_level(), "debug");
        assert_eq!(AppConfig::new(2).log_level(), "trace");
        assert_eq!(AppConfig::new(5).log_level(), "trace");
    }

    #[test]
    fn test_parse_file_config() {
        let config = FileConfig::from_toml(
            r#"
[retry]
max-retries = 5
backoff-strategy = "linear"
retry-codes = [1, 75]
jitter = true

[validation]
rules-dir = "ci/rules"
"#,
        )
        .unwrap();

        assert_eq!(config.retry.input("max-retries").as_deref(), Some("5"));
        assert_eq!(config.retry.input("backoff-strategy").as_deref(), Some("linear"));
        assert_eq!(config.retry.input("retry-codes").as_deref(), Some("1,75"));
        assert_eq!(config.retry.input("timeout"), None);
        assert_eq!(config.retry.jitter, Some(true));
        assert_eq!(config.validation.rules_dir, Some(PathBuf::from("ci/rules")));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = FileConfig::from_toml("[retry]\nretries = 3\n").unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_TOML);
    }

    #[test]
    fn test_cli_rules_dir_wins() {
        let mut config = AppConfig::new(0);
        config.file.validation.rules_dir = Some(PathBuf::from("from-file"));
        assert_eq!(config.rules_dir(None), Some(PathBuf::from("from-file")));
        assert_eq!(
            config.rules_dir(Some(Path::new("from-cli"))),
            Some(PathBuf::from("from-cli"))
        );
    }

    #[test]
    fn test_with_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[retry]\ntimeout = 30\n").unwrap();
        let config = AppConfig::new(0).with_config_file(Some(file.path())).unwrap();
        assert_eq!(config.file.retry.timeout, Some(30));

        let missing =
            AppConfig::new(0).with_config_file(Some(Path::new("/no/such/stepguard.toml")));
        assert_eq!(missing.unwrap_err().exit_code(), 2);
    }
}
