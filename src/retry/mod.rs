//! Retry-with-backoff execution of shell commands
//!
//! A command runs up to `max_retries` times. Each attempt's exit code is
//! classified by the [`RetryPolicy`]: success stops the loop, a retryable
//! code waits for the backoff delay and tries again, anything else stops
//! immediately. The caller gets an [`ExecutionReport`] either way.

pub mod backoff;
pub mod executor;
pub mod policy;
pub mod report;

pub use backoff::BackoffStrategy;
pub use executor::{RetryExecutor, Shell};
pub use policy::{parse_code_list, AttemptOutcome, RetryPolicy, RetryPolicyBuilder};
pub use report::{AttemptResult, ExecutionReport};
