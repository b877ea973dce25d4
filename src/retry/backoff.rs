//! Backoff strategies for the delay between attempts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ErrorCode, StepGuardError};

/// Backoff strategies for retry delays
///
/// Delays are computed from the base delay `d` and the 1-indexed attempt
/// number `n` that just failed:
///
/// | strategy      | delay           |
/// |---------------|-----------------|
/// | `fixed`       | `d`             |
/// | `linear`      | `d * n`         |
/// | `exponential` | `d * 2^(n - 1)` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

type DelayFn = fn(Duration, u32) -> Duration;

fn fixed_delay(base: Duration, _attempt: u32) -> Duration {
    base
}

fn linear_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt.max(1))
}

fn exponential_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    base.saturating_mul(1u32 << exponent)
}

impl BackoffStrategy {
    /// All strategies, in the order they are documented
    pub const ALL: [BackoffStrategy; 3] = [
        BackoffStrategy::Linear,
        BackoffStrategy::Exponential,
        BackoffStrategy::Fixed,
    ];

    fn delay_fn(self) -> DelayFn {
        match self {
            BackoffStrategy::Fixed => fixed_delay,
            BackoffStrategy::Linear => linear_delay,
            BackoffStrategy::Exponential => exponential_delay,
        }
    }

    /// Calculate delay after the given (1-indexed) attempt
    pub fn delay(self, base: Duration, attempt: u32) -> Duration {
        (self.delay_fn())(base, attempt)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackoffStrategy::Fixed => "fixed",
            BackoffStrategy::Linear => "linear",
            BackoffStrategy::Exponential => "exponential",
        }
    }
}

impl fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackoffStrategy {
    type Err = StepGuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(BackoffStrategy::Fixed),
            "linear" => Ok(BackoffStrategy::Linear),
            "exponential" => Ok(BackoffStrategy::Exponential),
            other => Err(StepGuardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!(
                    "unknown backoff strategy '{}' (expected linear, exponential or fixed)",
                    other
                ),
            )),
        }
    }
}
