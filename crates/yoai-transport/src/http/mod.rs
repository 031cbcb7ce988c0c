//! HTTP transport.
//!
//! This module provides the `reqwest` client for the bot API.

#[cfg(feature = "http-client")]
mod client;
#[cfg(feature = "http-client")]
pub use client::HttpTransport;
