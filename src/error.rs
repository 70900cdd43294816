//! Error types shared across the store, registry, and application layers.
//!
//! Per-package failures (`LookupError`) never leave the reconciliation
//! pipeline; they are folded into the job's outcome. Only `AppError`
//! reaches `main` and decides the exit code.

use std::path::PathBuf;

use thiserror::Error;

use crate::logic::vercmp::VersionError;

/// Failures raised while opening, querying, or releasing the package store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A backing command could not run or exited unsuccessfully.
    #[error("{command} failed: {message}")]
    Command {
        /// Command line that was attempted.
        command: String,
        /// Human-readable reason.
        message: String,
    },

    /// A line of store output did not have the expected shape.
    #[error("unexpected package store output: {line:?}")]
    Parse {
        /// Offending line.
        line: String,
    },
}

/// Failure of a single registry lookup. Local to one job.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("registry transport error: {0}")]
    Transport(String),

    /// The registry answered with a non-success HTTP status.
    #[error("registry returned HTTP {0}")]
    Http(u16),

    /// The registry answered with an `error` envelope.
    #[error("error from registry: {0}")]
    Server(String),

    /// The response body was not valid JSON for the announced type.
    #[error("malformed registry response: {0}")]
    Decode(String),

    /// The registry does not know the package.
    #[error("package not found upstream")]
    NotFound,

    /// The envelope carried a discriminator this client does not understand.
    #[error("unrecognized registry response type {0:?}")]
    UnknownResponseType(String),

    /// The lookup did not finish within the per-job deadline.
    #[error("registry lookup timed out")]
    Timeout,

    /// The installed or remote version string could not be compared.
    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    /// The lookup or comparison panicked; the payload message is kept.
    #[error("registry lookup panicked: {0}")]
    Panicked(String),

    /// The worker that owned the job stopped before reporting it.
    #[error("reconciliation worker exited before resolving the job")]
    WorkerLost,
}

/// Fatal, run-level failures surfaced to the command-line caller.
#[derive(Debug, Error)]
pub enum AppError {
    /// The settings file exists but could not be read.
    #[error("failed to read configuration at {path}: {source}")]
    Config {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The package store could not be initialized.
    #[error("failed to initialize package store: {0}")]
    Store(#[source] StoreError),

    /// The package store could not be released at shutdown.
    #[error("could not release package store: {0}")]
    Release(#[source] StoreError),

    /// A registry request issued directly by the CLI (search mode) failed.
    #[error(transparent)]
    Registry(#[from] LookupError),

    /// Building the HTTP client or async runtime failed.
    #[error("runtime setup failed: {0}")]
    Runtime(String),
}
