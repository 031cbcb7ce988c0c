//! Transport seam between the bot and the network.
//!
//! The core never performs HTTP itself. It talks to a [`Transport`], a
//! request/response primitive keyed by API endpoint, and the polling loop
//! pulls updates from an [`UpdateSource`]. `yoai-transport` provides the
//! `reqwest` implementation; tests plug in in-memory fakes.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportResult;
use crate::update::RawUpdate;

/// Default API root of the YoAI bot platform.
pub const DEFAULT_BASE_URL: &str = "https://yoai.yophone.com/api/pub";

/// Header carrying the bot's API key on every request.
pub const API_KEY_HEADER: &str = "X-YoAI-API-Key";

// =============================================================================
// Transport
// =============================================================================

/// An authenticated request/response channel to the bot API.
///
/// Implementations are expected to reuse one session (connection pool and
/// auth header) for every call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs an optional JSON body to `endpoint`.
    ///
    /// Returns `Ok(None)` when the server answered successfully with an
    /// empty body.
    async fn post_json(&self, endpoint: &str, body: Option<Value>)
    -> TransportResult<Option<Value>>;

    /// POSTs a multipart form with text `fields` and `files`.
    async fn post_multipart(
        &self,
        endpoint: &str,
        fields: Vec<(String, String)>,
        files: Vec<FileUpload>,
    ) -> TransportResult<Option<Value>>;
}

/// Type alias for a shared transport.
pub type BoxedTransport = Arc<dyn Transport>;

/// Source of pending updates for the polling loop.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Fetches the next batch of unseen updates, in server order.
    async fn fetch_updates(&self) -> TransportResult<Vec<RawUpdate>>;
}

// =============================================================================
// FileUpload
// =============================================================================

/// One file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// File name reported to the server.
    pub file_name: String,
    /// MIME type of the content.
    pub content_type: String,
    /// File content.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Builds an upload for `path`, guessing the content type from its extension.
    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        Self {
            file_name,
            content_type: content_type_for(path).to_string(),
            bytes,
        }
    }
}

/// Best-effort MIME type for a file path, falling back to
/// `application/octet-stream`.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "json" => "application/json",
        "txt" => "text/plain",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

// =============================================================================
// HTTP Client Config
// =============================================================================

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// API root; endpoints are appended as `{base_url}/{endpoint}`.
    pub base_url: String,
    /// Bot API key, sent in the [`API_KEY_HEADER`] header.
    pub api_key: String,
    /// Request timeout duration.
    pub timeout: Duration,
}

impl HttpClientConfig {
    /// Creates a config for `api_key` against the default API root.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout duration.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL for `endpoint`.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::new("")
    }
}
