//! Unified error types for the YoAI core.
//!
//! This module provides the error taxonomy shared by every layer. Handler
//! failures are defined in `yoai-framework`, loop-level failures in
//! `yoai-runtime`.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur while talking to the bot API.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("request to '{endpoint}' failed: {reason}")]
    Request {
        /// The API endpoint that was called.
        endpoint: String,
        /// Reason for failure.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("'{endpoint}' returned HTTP {status}: {body}")]
    Status {
        /// The API endpoint that was called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The transport itself is misconfigured and can never succeed.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
}

impl TransportError {
    /// Returns `true` if retrying cannot help.
    ///
    /// Only a misconfigured transport is fatal; network and server failures
    /// are expected to clear up on a later attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}

// =============================================================================
// Update Errors
// =============================================================================

/// A raw update that lacks the fields needed to build a [`Message`](crate::Message).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedUpdate {
    /// The update is not a JSON object.
    #[error("update is not an object (got {found})")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// No chat identifier field is present.
    #[error("update has no chat identifier")]
    MissingChatId,

    /// A chat identifier is present but unusable.
    #[error("chat identifier has invalid type or value (got {found})")]
    InvalidChatId {
        /// JSON type that was found.
        found: &'static str,
    },
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for outbound API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A file scheduled for upload does not exist.
    #[error("file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A file scheduled for upload exceeds the platform limit.
    #[error("file exceeds {limit} byte limit ({size} bytes): {}", path.display())]
    FileTooLarge {
        /// Offending file.
        path: PathBuf,
        /// Actual size in bytes.
        size: u64,
        /// Maximum allowed size in bytes.
        limit: u64,
    },

    /// A file scheduled for upload could not be read.
    #[error("failed to read file {}: {reason}", path.display())]
    FileRead {
        /// Offending file.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to serialize a request payload.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
