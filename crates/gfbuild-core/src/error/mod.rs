//! Domain errors raised by build and launch operations.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O errors are wrapped in `Arc`
//! to satisfy the `result_large_err` Clippy lint.

use std::sync::Arc;

use thiserror::Error;

/// Errors that cross the orchestrator boundary.
///
/// Per-file compile failures never surface here; they are folded into the
/// build report so one broken grammar cannot abort a pass. Only a missing
/// compiler configuration and cooperative cancellation stop a pass outright.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// No compiler path is configured; the pass aborts before traversal.
    #[error("no GF compiler path is configured")]
    CompilerPathUnset,

    /// The pass was cancelled before completing.
    #[error("build cancelled")]
    Cancelled,
}

/// Errors raised while invoking the compiler process.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// The compiler binary does not exist at the configured path.
    #[error("compiler '{program}' not found: {source}")]
    BinaryNotFound {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The compiler process could not be started.
    #[error("failed to start compiler '{program}': {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Polling the running compiler process failed.
    #[error("failed to monitor compiler '{program}': {source}")]
    Wait {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The compiler did not finish within the configured timeout.
    #[error("compiler '{program}' timed out after {timeout_secs}s")]
    Timeout {
        /// Program that was invoked.
        program: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The invocation was cancelled and the process terminated.
    #[error("compiler invocation cancelled")]
    Cancelled,
}

/// Errors raised by the batch launch operation.
#[derive(Debug, Clone, Error)]
pub enum LaunchError {
    /// No compiler path is configured.
    #[error("no GF compiler path is configured")]
    CompilerPathUnset,

    /// The launch specification named no source files.
    #[error("no source files were provided")]
    NoFiles,

    /// Invoking the compiler failed.
    #[error(transparent)]
    Invoke(#[from] InvokeError),
}
