//! # YoAI Transport
//!
//! Network transport for YoAI bots.
//!
//! This crate implements the [`Transport`](yoai_core::Transport) seam defined
//! in `yoai-core` on top of `reqwest`. One client (connection pool, API key
//! header, timeout) is built up front and reused for every call.
//!
//! ## Features
//!
//! - `http-client` (default): the `reqwest` based [`HttpTransport`]
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Bot / Poller       │  (typed API calls, update fetching)
//! ├─────────────────────┤
//! │  yoai-core          │  (Transport trait)
//! ├─────────────────────┤
//! │  yoai-transport     │  <- This crate (implementation)
//! ├─────────────────────┤
//! │  Network (HTTPS)    │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use yoai_core::{Bot, HttpClientConfig};
//! use yoai_transport::HttpTransport;
//!
//! let transport = HttpTransport::new(HttpClientConfig::new("my-api-key"))?;
//! let bot = Bot::new(Arc::new(transport));
//! bot.send_message("chat-id", "Hello!").await?;
//! ```

#[cfg(feature = "http-client")]
pub mod http;

#[cfg(feature = "http-client")]
pub use http::HttpTransport;
