//! # YoAI
//!
//! A polling bot framework for the YoPhone YoAI bot API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐ getUpdates ┌────────┐ RawUpdate ┌────────────┐ "/cmd" ┌─────────────────┐
//! │ YoAI API │───────────▶│ Poller │──────────▶│ Dispatcher │───────▶│ command handler │
//! └──────────┘            └────────┘           └────────────┘        └─────────────────┘
//!       ▲                                            │ otherwise     ┌─────────────────┐
//!       │              sendMessage, ...              └──────────────▶│ generic handlers│
//!       └────────────────────────────────────────────────────────────└─────────────────┘
//! ```
//!
//! - **Runtime**: loads configuration, sets up logging, owns the polling loop
//! - **Dispatcher**: parses each update and routes it, one at a time
//! - **Handlers**: async closures receiving an [`UpdateContext`](prelude::UpdateContext)
//! - **Bot**: typed client for every outbound endpoint
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use yoai::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = YoaiRuntime::new()?;
//!
//!     runtime.on_command("start", |_ctx: Arc<UpdateContext>| async {
//!         "Hello!".to_string()
//!     });
//!     runtime.on_message(|ctx: Arc<UpdateContext>| async move {
//!         ctx.text().map(str::to_string)
//!     });
//!
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: read `yoai.toml` (default)
//! - `yaml-config`: read `yoai.yaml`
//! - `json-log`: allow `logging.format = "json"`

pub use yoai_core as core;
pub use yoai_framework as framework;
pub use yoai_runtime as runtime;
pub use yoai_transport as transport;

/// Commonly used types for building bots.
///
/// ```rust,ignore
/// use yoai::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime - main entry point
    pub use yoai_runtime::{RuntimeError, RuntimeResult, YoaiConfig, YoaiRuntime};

    // Handlers
    pub use yoai_framework::{
        Failure, FailureSink, HandleResponse, Handler, HandlerError, HandlerResult, UpdateContext,
    };

    // Outbound API
    pub use yoai_core::{
        ApiError, Bot, BotCommand, ButtonOption, Buttons, InlineButton, Message, RawUpdate,
    };

    // Logging macros
    pub use yoai_runtime::prelude::*;
}
