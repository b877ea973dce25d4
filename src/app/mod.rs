//! Application module
//!
//! Configuration loading, logging setup and fatal error handling for the
//! `stepguard` binary.

pub mod config;
pub mod error_handling;
pub mod logging;

pub use config::{AppConfig, FileConfig, RetryDefaults, ValidationConfig};
pub use error_handling::handle_fatal_error;
pub use logging::init_logging;
