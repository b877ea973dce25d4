//! Error handling utilities
//!
//! This module provides centralized error handling for the application.

use tracing::error;

use crate::error::{describe_error_code, StepGuardError};

/// Handle fatal errors and exit with appropriate status code
///
/// A `StepGuardError` decides its own exit code (configuration errors exit
/// with 2). Anything else exits with 1.
///
/// # Verbose Mode Behavior
/// - `verbose = 0`: User-friendly messages only
/// - `verbose >= 1`: Includes full developer context with error chain
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);
    std::process::exit(report_error(&error, verbose))
}

/// Print the error to stderr and return the exit code to use
pub fn report_error(error: &anyhow::Error, verbose: u8) -> i32 {
    if let Some(err) = error.downcast_ref::<StepGuardError>() {
        eprintln!("Error: {}", err.user_message());

        if verbose >= 1 {
            eprintln!("E{:04}: {}", err.code(), describe_error_code(err.code()));
            eprintln!("\nContext Chain:\n{}", err.developer_message());
        }

        err.exit_code()
    } else {
        eprintln!("Error: {error}");

        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }

        1
    }
}
