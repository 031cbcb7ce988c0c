//! Dispatch engine.
//!
//! The [`Dispatcher`] routes one raw update at a time:
//!
//! 1. Parse it into a [`Message`]. A malformed update is reported and skipped.
//! 2. If the text starts with `/`, look up its command token. A registered
//!    command handler receives the message exclusively.
//! 3. Otherwise, or when no command matches, every generic handler receives
//!    it in registration order.
//!
//! ```text
//!                        ┌── token registered ──▶ command handler (exactly one)
//! RawUpdate ─▶ Message ──┤
//!                        └── otherwise ─────────▶ generic handlers (all, in order)
//! ```
//!
//! Every handler invocation is its own failure boundary: errors and panics
//! are reported to the [`FailureSink`] and never leave
//! [`dispatch_one`](Dispatcher::dispatch_one).

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{Instrument, Level, debug, span};

use yoai_core::{Bot, Message, RawUpdate, parse_update};

use crate::command::command_token;
use crate::handler::{BoxedHandler, HandlerError, HandlerResult, UpdateContext};
use crate::registry::HandlerRegistry;
use crate::report::{BoxedSink, Failure, HandlerRole, TracingSink};

/// What happened to one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The update could not be parsed; no handler ran.
    Malformed,

    /// A command handler claimed the update.
    Command {
        /// The matched token, prefix included.
        token: String,
        /// Whether the handler succeeded.
        ok: bool,
    },

    /// The update went to the generic handlers.
    Generic {
        /// Number of handlers invoked.
        invoked: usize,
        /// Number of those that failed.
        failed: usize,
    },
}

/// Routes parsed updates to registered handlers.
///
/// Cloning is cheap; clones share the registry, bot and sink.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    bot: Arc<Bot>,
    sink: BoxedSink,
}

impl Dispatcher {
    /// Creates a dispatcher that reports failures through [`TracingSink`].
    pub fn new(registry: Arc<HandlerRegistry>, bot: Arc<Bot>) -> Self {
        Self {
            registry,
            bot,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replaces the failure sink.
    pub fn with_sink(mut self, sink: BoxedSink) -> Self {
        self.sink = sink;
        self
    }

    /// The handler registry.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// The bot handed to handlers.
    pub fn bot(&self) -> &Arc<Bot> {
        &self.bot
    }

    /// The failure sink.
    pub fn sink(&self) -> &BoxedSink {
        &self.sink
    }

    /// Dispatches one raw update.
    ///
    /// Never fails: malformed updates and handler failures are reported to the
    /// sink and summarized in the returned [`DispatchOutcome`].
    pub async fn dispatch_one(&self, raw: RawUpdate) -> DispatchOutcome {
        let message = match parse_update(&raw) {
            Ok(message) => message,
            Err(e) => {
                self.sink.report(&Failure::MalformedUpdate(e));
                return DispatchOutcome::Malformed;
            }
        };

        let span = span!(Level::DEBUG, "dispatch", chat_id = %message.chat_id());
        self.route(message).instrument(span).await
    }

    /// Dispatches a batch strictly in order, one update at a time.
    pub async fn dispatch_all(&self, batch: Vec<RawUpdate>) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::with_capacity(batch.len());
        for raw in batch {
            outcomes.push(self.dispatch_one(raw).await);
        }
        outcomes
    }

    async fn route(&self, message: Message) -> DispatchOutcome {
        let command = message
            .text()
            .and_then(command_token)
            .and_then(|token| Some((token.to_string(), self.registry.lookup_command(token)?)));

        let ctx = Arc::new(UpdateContext::new(message, Arc::clone(&self.bot)));

        if let Some((token, handler)) = command {
            debug!(command = %token, "Dispatching to command handler");
            let ok = match invoke(&handler, Arc::clone(&ctx)).await {
                Ok(()) => true,
                Err(error) => {
                    self.sink.report(&Failure::Handler {
                        role: HandlerRole::Command,
                        chat_id: ctx.chat_id().to_string(),
                        token: Some(token.clone()),
                        error,
                    });
                    false
                }
            };
            return DispatchOutcome::Command { token, ok };
        }

        let handlers = self.registry.generic_handlers();
        debug!(count = handlers.len(), "Dispatching to generic handlers");

        let mut failed = 0;
        for handler in &handlers {
            if let Err(error) = invoke(handler, Arc::clone(&ctx)).await {
                failed += 1;
                self.sink.report(&Failure::Handler {
                    role: HandlerRole::Generic,
                    chat_id: ctx.chat_id().to_string(),
                    token: None,
                    error,
                });
            }
        }

        DispatchOutcome::Generic {
            invoked: handlers.len(),
            failed,
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Runs one handler, turning a panic into [`HandlerError::Panicked`].
async fn invoke(handler: &BoxedHandler, ctx: Arc<UpdateContext>) -> HandlerResult {
    match AssertUnwindSafe(async { handler.call(ctx).await })
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(payload) => Err(HandlerError::Panicked(panic_message(payload.as_ref()))),
    }
}

/// Extracts a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
