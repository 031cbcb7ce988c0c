//! Runtime error types.

use thiserror::Error;

use yoai_core::TransportError;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The transport could not be created.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The polling loop stopped on a transport failure that retrying cannot fix.
    #[error("Polling stopped on fatal transport error: {0}")]
    FatalTransport(TransportError),

    /// `run` was called while the runtime was already running.
    #[error("Runtime is already running")]
    AlreadyRunning,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
