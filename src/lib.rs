//! # stepguard
//!
//! Two building blocks for CI action steps that wrap third-party tools.
//!
//! ## Usage
//!
//! ```bash
//! stepguard retry --command "npm ci" --max-retries 3 --backoff-strategy exponential
//! stepguard validate --action prettier-fix --input token --value "$TOKEN"
//! ```
//!
//! ## Modules
//!
//! - `retry` - Bounded retries with backoff and exit-code classification
//! - `validation` - Injection guard plus explicit, convention and generic input rules
//! - `subprocess` - Process runner abstraction with a scripted mock for tests
//! - `error` - Error type and numeric error codes
//! - `app` - Configuration file, logging and fatal error handling
//! - `cli` - Command-line parsing and command handlers
pub mod app;
pub mod cli;
pub mod error;
pub mod retry;
pub mod subprocess;
pub mod validation;

pub use error::{ErrorCode, Result, StepGuardError};
pub use retry::{BackoffStrategy, ExecutionReport, RetryExecutor, RetryPolicy};
pub use validation::{InputValidator, ValidationResult};
