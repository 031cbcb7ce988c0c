//! Failure reporting.
//!
//! Failures are contained at the narrowest boundary (one fetch, one update,
//! one handler invocation) and then handed to a [`FailureSink`]. Nothing in
//! the dispatch path propagates them further.

use std::fmt;
use std::sync::Arc;

use tracing::{error, warn};

use yoai_core::{MalformedUpdate, TransportError};

use crate::handler::HandlerError;

/// Which registry role a failing handler was invoked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerRole {
    /// Registered under a command token.
    Command,
    /// Registered as a generic handler.
    Generic,
}

impl fmt::Display for HandlerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Generic => f.write_str("generic"),
        }
    }
}

/// A contained failure.
#[derive(Debug, Clone)]
pub enum Failure {
    /// Fetching a batch of updates failed; the cycle was skipped.
    Transport(TransportError),

    /// One update could not be parsed; it was skipped.
    MalformedUpdate(MalformedUpdate),

    /// One handler invocation failed; sibling handlers still ran.
    Handler {
        /// Role the handler was invoked in.
        role: HandlerRole,
        /// Chat of the update being handled.
        chat_id: String,
        /// Command token, for command handlers.
        token: Option<String>,
        /// What went wrong.
        error: HandlerError,
    },

    /// A polling cycle failed outside every narrower boundary.
    LoopFatal {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "fetch failed: {e}"),
            Self::MalformedUpdate(e) => write!(f, "malformed update: {e}"),
            Self::Handler {
                role,
                chat_id,
                error,
                ..
            } => write!(f, "{role} handler failed for chat {chat_id}: {error}"),
            Self::LoopFatal { reason } => write!(f, "polling cycle failed: {reason}"),
        }
    }
}

/// Destination for contained failures.
pub trait FailureSink: Send + Sync {
    /// Records one failure. Must not panic.
    fn report(&self, failure: &Failure);
}

/// A shared failure sink.
pub type BoxedSink = Arc<dyn FailureSink>;

/// Default sink that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&self, failure: &Failure) {
        match failure {
            Failure::Transport(e) => {
                warn!(error = %e, "Failed to fetch updates, skipping cycle");
            }
            Failure::MalformedUpdate(e) => {
                warn!(error = %e, "Skipping malformed update");
            }
            Failure::Handler {
                role,
                chat_id,
                token,
                error,
            } => {
                error!(
                    role = %role,
                    chat_id = %chat_id,
                    command = token.as_deref().unwrap_or(""),
                    error = %error,
                    "Handler failed"
                );
            }
            Failure::LoopFatal { reason } => {
                error!(reason = %reason, "Polling cycle failed unexpectedly, cooling down");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display() {
        let failure = Failure::Handler {
            role: HandlerRole::Generic,
            chat_id: "B".into(),
            token: None,
            error: HandlerError::failed("boom"),
        };
        assert_eq!(
            failure.to_string(),
            "generic handler failed for chat B: handler failed: boom"
        );

        let failure = Failure::MalformedUpdate(MalformedUpdate::MissingChatId);
        assert_eq!(
            failure.to_string(),
            "malformed update: update has no chat identifier"
        );
    }

    #[test]
    fn test_tracing_sink_accepts_every_variant() {
        let sink = TracingSink;
        sink.report(&Failure::Transport(TransportError::Request {
            endpoint: "getUpdates".into(),
            reason: "timeout".into(),
        }));
        sink.report(&Failure::MalformedUpdate(MalformedUpdate::MissingChatId));
        sink.report(&Failure::LoopFatal {
            reason: "panic".into(),
        });
    }
}
