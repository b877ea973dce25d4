//! Retry policy: bounds, exit-code classification and delay computation

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::time::Duration;

use super::backoff::BackoffStrategy;
use crate::error::{ErrorCode, Result, StepGuardError};

pub const MAX_RETRIES_RANGE: RangeInclusive<u32> = 1..=10;
pub const RETRY_DELAY_RANGE: RangeInclusive<u64> = 1..=300;
pub const TIMEOUT_RANGE: RangeInclusive<u64> = 1..=3600;

/// Upper bound of the random offset added when jitter is enabled, as a
/// fraction of the base delay
const JITTER_FACTOR: f64 = 0.1;

/// How a single attempt's exit code is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Retryable,
    Fatal,
}

/// Retry configuration for one `execute` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (1-10)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between attempts in seconds (1-300)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,

    #[serde(default)]
    pub backoff_strategy: BackoffStrategy,

    /// Per-attempt wall-clock ceiling in seconds (1-3600)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_success_codes")]
    pub success_codes: BTreeSet<i32>,

    #[serde(default = "default_retry_codes")]
    pub retry_codes: BTreeSet<i32>,

    /// Add a random offset of up to 10% on top of each computed delay
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay(),
            backoff_strategy: BackoffStrategy::default(),
            timeout_seconds: default_timeout(),
            success_codes: default_success_codes(),
            retry_codes: default_retry_codes(),
            jitter: false,
        }
    }
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            policy: RetryPolicy::default(),
        }
    }

    /// Check every bound; a policy that fails here never runs an attempt
    pub fn validate(&self) -> Result<()> {
        check_range("max-retries", self.max_retries as u64, &widen(MAX_RETRIES_RANGE))?;
        check_range("retry-delay", self.retry_delay_seconds, &RETRY_DELAY_RANGE)?;
        check_range("timeout", self.timeout_seconds, &TIMEOUT_RANGE)?;

        if self.success_codes.is_empty() {
            return Err(StepGuardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                "success-codes must contain at least one exit code",
            ));
        }

        let overlap: Vec<_> = self.success_codes.intersection(&self.retry_codes).collect();
        if !overlap.is_empty() {
            tracing::debug!(
                "Exit codes {:?} are both success and retry codes; success takes precedence",
                overlap
            );
        }

        Ok(())
    }

    /// Classify an exit code
    ///
    /// Success wins over retry when a code is in both sets, and a code in
    /// neither set is fatal.
    pub fn classify(&self, exit_code: i32) -> AttemptOutcome {
        if self.success_codes.contains(&exit_code) {
            AttemptOutcome::Success
        } else if self.retry_codes.contains(&exit_code) {
            AttemptOutcome::Retryable
        } else {
            AttemptOutcome::Fatal
        }
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Delay to wait after the given (1-indexed) failed attempt, without jitter
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        self.backoff_strategy.delay(self.base_delay(), attempt)
    }

    /// Delay to wait after the given attempt, jitter included when enabled
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.calculate_delay(attempt);
        if !self.jitter {
            return delay;
        }

        let mut rng = rand::rng();
        let extra = rng.random_range(0.0..=JITTER_FACTOR);
        delay + Duration::from_secs_f64(delay.as_secs_f64() * extra)
    }
}

/// Builder for [`RetryPolicy`]; `build` validates
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    pub fn retry_delay_seconds(mut self, seconds: u64) -> Self {
        self.policy.retry_delay_seconds = seconds;
        self
    }

    pub fn backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.policy.backoff_strategy = strategy;
        self
    }

    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.policy.timeout_seconds = seconds;
        self
    }

    pub fn success_codes<I: IntoIterator<Item = i32>>(mut self, codes: I) -> Self {
        self.policy.success_codes = codes.into_iter().collect();
        self
    }

    pub fn retry_codes<I: IntoIterator<Item = i32>>(mut self, codes: I) -> Self {
        self.policy.retry_codes = codes.into_iter().collect();
        self
    }

    pub fn jitter(mut self, enabled: bool) -> Self {
        self.policy.jitter = enabled;
        self
    }

    pub fn build(self) -> Result<RetryPolicy> {
        self.policy.validate()?;
        Ok(self.policy)
    }
}

/// Parse a comma or space separated exit-code list such as `"1,2, 124"`
pub fn parse_code_list(input: &str) -> Result<BTreeSet<i32>> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>().map_err(|_| {
                StepGuardError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("'{}' is not a valid exit code", part),
                )
            })
        })
        .collect()
}

fn widen(range: RangeInclusive<u32>) -> RangeInclusive<u64> {
    (*range.start() as u64)..=(*range.end() as u64)
}

fn check_range(name: &str, value: u64, range: &RangeInclusive<u64>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(StepGuardError::config_with_code(
            ErrorCode::CONFIG_OUT_OF_RANGE,
            format!(
                "{} must be between {} and {}, got {}",
                name,
                range.start(),
                range.end(),
                value
            ),
        ))
    }
}

// Default functions for serde
fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5
}

fn default_timeout() -> u64 {
    600
}

fn default_success_codes() -> BTreeSet<i32> {
    BTreeSet::from([0])
}

fn default_retry_codes() -> BTreeSet<i32> {
    BTreeSet::from([1, 2, 124, 126, 127])
}
