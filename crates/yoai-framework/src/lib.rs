//! # YoAI Framework
//!
//! Routing layer for YoAI bots.
//!
//! This layer provides:
//! - [`Handler`] with a blanket implementation for async closures
//! - [`HandlerRegistry`] mapping command tokens and generic handlers
//! - [`Dispatcher`] routing each update to exactly one command handler or to
//!   every generic handler
//! - [`FailureSink`] receiving every contained failure
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use yoai_framework::{Dispatcher, HandlerRegistry, UpdateContext};
//!
//! let registry = Arc::new(HandlerRegistry::new());
//! registry.register_command("ping", |_ctx: Arc<UpdateContext>| async { "pong".to_string() });
//! registry.register_generic(|ctx: Arc<UpdateContext>| async move {
//!     tracing::info!(chat_id = %ctx.chat_id(), "message received");
//! });
//!
//! let dispatcher = Dispatcher::new(registry, bot);
//! dispatcher.dispatch_one(raw_update).await;
//! ```

pub mod command;
pub mod dispatcher;
pub mod handler;
pub mod registry;
pub mod report;

#[cfg(test)]
mod testing;

pub use command::{COMMAND_PREFIX, command_args, command_key, command_token};
pub use dispatcher::{DispatchOutcome, Dispatcher, panic_message};
pub use handler::{
    BoxedHandler, CommandHandler, GenericHandler, HandleResponse, Handler, HandlerError,
    HandlerResult, UpdateContext,
};
pub use registry::HandlerRegistry;
pub use report::{BoxedSink, Failure, FailureSink, HandlerRole, TracingSink};
