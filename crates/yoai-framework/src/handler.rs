//! Handler system.
//!
//! A handler is anything that can be invoked with an [`UpdateContext`]. Plain
//! async closures and functions qualify through a blanket implementation, and
//! their return value is turned into a reply (or an error) by
//! [`HandleResponse`].
//!
//! The same [`Handler`] trait serves both roles in the registry: a command
//! handler owns the response to its command, a generic handler observes every
//! message no command claimed.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use yoai_framework::UpdateContext;
//!
//! // No return value
//! async fn log_message(ctx: Arc<UpdateContext>) {
//!     println!("{}: {:?}", ctx.chat_id(), ctx.text());
//! }
//!
//! // Returning a String replies to the chat
//! async fn echo(ctx: Arc<UpdateContext>) -> String {
//!     ctx.args().unwrap_or_default().to_string()
//! }
//!
//! // Errors are reported as handler failures
//! async fn strict(ctx: Arc<UpdateContext>) -> Result<String, String> {
//!     ctx.text().map(str::to_uppercase).ok_or_else(|| "no text".into())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use yoai_core::{ApiError, ApiResult, Bot, Message};

use crate::command::{command_args, command_token};

// ============================================================================
// UpdateContext
// ============================================================================

/// Everything a handler gets to see for one update.
///
/// One context is created per dispatch and shared by every handler invoked
/// for that update.
#[derive(Debug)]
pub struct UpdateContext {
    message: Message,
    bot: Arc<Bot>,
}

impl UpdateContext {
    /// Creates a context for `message`.
    pub fn new(message: Message, bot: Arc<Bot>) -> Self {
        Self { message, bot }
    }

    /// The parsed message.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The bot that received the update.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// A shared handle to the bot, for work that outlives the handler.
    pub fn bot_arc(&self) -> Arc<Bot> {
        Arc::clone(&self.bot)
    }

    /// Shorthand for `message().chat_id()`.
    pub fn chat_id(&self) -> &str {
        self.message.chat_id()
    }

    /// Shorthand for `message().text()`.
    pub fn text(&self) -> Option<&str> {
        self.message.text()
    }

    /// The command token, if the text is a command.
    pub fn command(&self) -> Option<&str> {
        self.text().and_then(command_token)
    }

    /// The text after the command token, if the text is a command.
    pub fn args(&self) -> Option<&str> {
        self.text().and_then(command_args)
    }

    /// Sends `text` to the chat this update came from.
    pub async fn reply(&self, text: &str) -> ApiResult<Option<Value>> {
        self.bot.send_message(self.chat_id(), text).await
    }
}

// ============================================================================
// HandlerError
// ============================================================================

/// A failure raised by application handler code.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("handler failed: {0}")]
    Failed(String),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// Sending the handler's reply failed.
    #[error("failed to send reply: {0}")]
    Reply(#[from] ApiError),
}

impl HandlerError {
    /// Creates a [`HandlerError::Failed`] from any message.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Result of one handler invocation.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// HandleResponse
// ============================================================================

/// Turns a handler's return value into its effect.
#[async_trait]
pub trait HandleResponse: Send {
    /// Applies the response for the update in `ctx`.
    async fn into_response(self, ctx: Arc<UpdateContext>) -> HandlerResult;
}

/// `()` means the handler already did everything it wanted.
#[async_trait]
impl HandleResponse for () {
    async fn into_response(self, _ctx: Arc<UpdateContext>) -> HandlerResult {
        Ok(())
    }
}

/// A `String` is sent back to the originating chat.
#[async_trait]
impl HandleResponse for String {
    async fn into_response(self, ctx: Arc<UpdateContext>) -> HandlerResult {
        ctx.reply(&self).await?;
        Ok(())
    }
}

#[async_trait]
impl<T: HandleResponse> HandleResponse for Option<T> {
    async fn into_response(self, ctx: Arc<UpdateContext>) -> HandlerResult {
        match self {
            Some(t) => t.into_response(ctx).await,
            None => Ok(()),
        }
    }
}

/// On `Err`, the error's display text becomes a [`HandlerError::Failed`].
#[async_trait]
impl<T: HandleResponse, E: std::fmt::Display + Send> HandleResponse for Result<T, E> {
    async fn into_response(self, ctx: Arc<UpdateContext>) -> HandlerResult {
        match self {
            Ok(t) => t.into_response(ctx).await,
            Err(e) => Err(HandlerError::Failed(e.to_string())),
        }
    }
}

// ============================================================================
// Handler
// ============================================================================

/// A unit of application logic invoked for an update.
///
/// Implemented automatically for every `Fn(Arc<UpdateContext>) -> impl Future`
/// whose output implements [`HandleResponse`]. Implement it by hand for
/// handlers that carry their own state.
pub trait Handler: Send + Sync + 'static {
    /// Invokes the handler.
    fn call(&self, ctx: Arc<UpdateContext>) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: HandleResponse + 'static,
{
    fn call(&self, ctx: Arc<UpdateContext>) -> BoxFuture<'static, HandlerResult> {
        let fut = self(Arc::clone(&ctx));
        Box::pin(async move { fut.await.into_response(ctx).await })
    }
}

/// A type-erased, shareable handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// A handler registered under a command token.
pub type CommandHandler = BoxedHandler;

/// A handler invoked for messages no command claimed.
pub type GenericHandler = BoxedHandler;
