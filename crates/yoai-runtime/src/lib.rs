//! # YoAI Runtime
//!
//! Orchestration layer for YoAI bots.
//!
//! This crate provides:
//! - Layered configuration (`yoai.toml`, `YOAI_*` variables, overrides)
//! - Logging setup driven by that configuration
//! - The [`Poller`] that fetches updates and feeds the dispatcher
//! - [`YoaiRuntime`], which wires everything together
//!
//! ```ignore
//! use std::sync::Arc;
//! use yoai_runtime::YoaiRuntime;
//! use yoai_framework::UpdateContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = YoaiRuntime::new()?;
//!
//!     runtime.on_command("start", |_ctx: Arc<UpdateContext>| async {
//!         "Welcome!".to_string()
//!     });
//!
//!     // Poll until Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Failure Handling
//!
//! Failed fetches, malformed updates and failing handlers never stop the
//! loop. They are reported to a [`FailureSink`](yoai_framework::FailureSink),
//! which logs through `tracing` unless replaced with
//! [`YoaiRuntime::with_sink`]. Only a misconfigured transport ends a run.

pub mod config;
pub mod error;
pub mod logging;
pub mod polling;
pub mod runtime;

#[cfg(test)]
mod testing;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, YoaiConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use polling::{CycleOutcome, Poller, PollerStats, PollingSettings};
pub use runtime::{RuntimeBuilder, YoaiRuntime};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros and span helpers.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
