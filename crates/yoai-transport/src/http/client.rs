//! `reqwest` implementation of the bot API transport.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, Url};
use serde_json::Value;
use tracing::{debug, info, trace};

use yoai_core::{
    API_KEY_HEADER, FileUpload, HttpClientConfig, Transport, TransportError, TransportResult,
};

/// HTTP transport for the bot API.
///
/// Holds a single `reqwest` client so every call shares the connection pool,
/// the API key header and the timeout.
pub struct HttpTransport {
    client: Client,
    config: HttpClientConfig,
}

impl HttpTransport {
    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfig`] if the base URL does not
    /// parse, the API key is not a valid header value, or the client cannot
    /// be built.
    pub fn new(config: HttpClientConfig) -> TransportResult<Self> {
        Url::parse(&config.base_url).map_err(|e| {
            TransportError::InvalidConfig(format!("invalid base URL '{}': {e}", config.base_url))
        })?;

        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| TransportError::InvalidConfig(format!("invalid API key: {e}")))?;
        api_key.set_sensitive(true);

        let name = HeaderName::from_bytes(API_KEY_HEADER.as_bytes())
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(name, api_key);

        let client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;

        info!(url = %config.base_url, timeout = ?config.timeout, "HTTP transport ready");
        Ok(Self { client, config })
    }

    /// The configuration this transport was built from.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        self.client.post(self.config.endpoint_url(endpoint))
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> TransportResult<Option<Value>> {
        let response = request
            .send()
            .await
            .map_err(|e| request_error(endpoint, &e))?;
        read_response(endpoint, response).await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        endpoint: &str,
        body: Option<Value>,
    ) -> TransportResult<Option<Value>> {
        trace!(endpoint = %endpoint, body = ?body, "POST");
        let mut request = self.post(endpoint);
        if let Some(body) = &body {
            request = request.json(body);
        }
        self.send(endpoint, request).await
    }

    async fn post_multipart(
        &self,
        endpoint: &str,
        fields: Vec<(String, String)>,
        files: Vec<FileUpload>,
    ) -> TransportResult<Option<Value>> {
        debug!(endpoint = %endpoint, files = files.len(), "POST multipart");

        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name, value);
        }
        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)
                .map_err(|e| request_error(endpoint, &e))?;
            form = form.part("file", part);
        }

        self.send(endpoint, self.post(endpoint).multipart(form)).await
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

/// Decodes a response: non-success is an error, an empty body is `None`.
async fn read_response(endpoint: &str, response: Response) -> TransportResult<Option<Value>> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| request_error(endpoint, &e))?;

    if !status.is_success() {
        return Err(TransportError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    if body.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&body)
        .map(Some)
        .map_err(|e| TransportError::MalformedResponse(format!("{endpoint}: {e}")))
}

fn request_error(endpoint: &str, err: &reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::InvalidConfig(format!("{endpoint}: {err}"))
    } else {
        TransportError::Request {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;

    fn transport_for(server: &MockServer) -> HttpTransport {
        HttpTransport::new(HttpClientConfig::new("test-key").with_base_url(server.base_url()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_json_sends_key_and_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/sendMessage")
                    .header("x-yoai-api-key", "test-key")
                    .json_body(json!({"to": "chat-1", "text": "hi"}));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"ok": true}));
            })
            .await;

        let response = transport_for(&server)
            .post_json("sendMessage", Some(json!({"to": "chat-1", "text": "hi"})))
            .await
            .unwrap();

        assert_eq!(response, Some(json!({"ok": true})));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_success_body_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/deleteWebhook");
                then.status(200);
            })
            .await;

        let response = transport_for(&server)
            .post_json("deleteWebhook", None)
            .await
            .unwrap();
        assert_eq!(response, None);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.any_request();
                then.status(502).body("bad gateway");
            })
            .await;

        let err = transport_for(&server)
            .post_json("getUpdates", None)
            .await
            .unwrap_err();

        match err {
            TransportError::Status {
                endpoint,
                status,
                body,
            } => {
                assert_eq!(endpoint, "getUpdates");
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let err = transport_for(&server)
            .post_json("getMe", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::MalformedResponse(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_multipart_upload() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/sendMessage")
                    .header("x-yoai-api-key", "test-key")
                    .header_exists("content-type")
                    .body_contains("chat-9")
                    .body_contains("hello file")
                    .body_contains("notes.txt");
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;

        let upload = FileUpload::from_bytes(Path::new("notes.txt"), b"hello file".to_vec());
        let response = transport_for(&server)
            .post_multipart(
                "sendMessage",
                vec![
                    ("to".to_string(), "chat-9".to_string()),
                    ("text".to_string(), String::new()),
                ],
                vec![upload],
            )
            .await
            .unwrap();

        assert_eq!(response, Some(json!({"ok": true})));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_server_is_request_error() {
        let config = HttpClientConfig::new("key")
            .with_base_url("http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(2));
        let err = HttpTransport::new(config)
            .unwrap()
            .post_json("getUpdates", None)
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Request { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let err = HttpTransport::new(HttpClientConfig::new("key").with_base_url("not a url"))
            .unwrap_err();
        assert!(err.is_fatal());

        let err = HttpTransport::new(HttpClientConfig::new("bad\nkey")).unwrap_err();
        assert!(err.is_fatal());
    }
}
