//! # YoAI Core
//!
//! Core building blocks for YoAI bots.
//!
//! This crate contains everything that does not depend on a concrete HTTP
//! stack or on the dispatch machinery:
//!
//! - **Updates**: [`RawUpdate`] as delivered by the API and the canonical
//!   [`Message`] produced by [`parse_update`]
//! - **Transport seam**: the [`Transport`] and [`UpdateSource`] traits that
//!   concrete clients implement
//! - **Bot API**: the typed [`Bot`] client with one method per endpoint
//! - **Errors**: [`TransportError`], [`MalformedUpdate`] and [`ApiError`]
//!
//! ```text
//! ┌───────────┐  fetch_updates  ┌─────┐  post_json   ┌───────────┐
//! │  Poller   │────────────────▶│ Bot │─────────────▶│ Transport │
//! └───────────┘                 └─────┘              └───────────┘
//!       │ RawUpdate
//!       ▼
//!  parse_update ──▶ Message
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use yoai_core::{Bot, RawUpdate, parse_update};
//!
//! let bot = Bot::new(Arc::new(my_transport));
//! for raw in bot.get_updates().await? {
//!     match parse_update(&raw) {
//!         Ok(message) => println!("{}: {:?}", message.chat_id(), message.text()),
//!         Err(e) => eprintln!("skipping update: {e}"),
//!     }
//! }
//! ```

pub mod bot;
pub mod error;
pub mod model;
pub mod transport;
pub mod update;

pub use bot::{Bot, MAX_UPLOAD_BYTES};
pub use error::{ApiError, ApiResult, MalformedUpdate, TransportError, TransportResult};
pub use model::{BotCommand, ButtonOption, Buttons, InlineButton};
pub use transport::{
    API_KEY_HEADER, BoxedTransport, DEFAULT_BASE_URL, FileUpload, HttpClientConfig, Transport,
    UpdateSource, content_type_for,
};
pub use update::{Message, RawUpdate, parse_update};
