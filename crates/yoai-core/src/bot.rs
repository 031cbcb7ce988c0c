//! Typed client for the YoAI bot API.
//!
//! [`Bot`] provides one strongly-typed method per API operation. Every
//! operation is a single POST through the shared [`Transport`]; the bot itself
//! holds no per-call state, so it is shared freely behind an `Arc`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use yoai_core::{Bot, Buttons, ButtonOption};
//!
//! async fn greet(bot: &Bot, chat_id: &str) -> yoai_core::ApiResult<()> {
//!     bot.send_message(chat_id, "Hello!").await?;
//!
//!     let buttons = Buttons::new()
//!         .grid(2)
//!         .option(ButtonOption::new("Yes", "yes"))
//!         .option(ButtonOption::new("No", "no"));
//!     bot.send_message_with_buttons(chat_id, "Continue?", buttons).await?;
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult, TransportError, TransportResult};
use crate::model::{BotCommand, Buttons, ButtonOption};
use crate::transport::{BoxedTransport, FileUpload, UpdateSource};
use crate::update::RawUpdate;

/// Largest file the platform accepts in one upload (50 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Client for the bot API.
pub struct Bot {
    transport: BoxedTransport,
}

impl Bot {
    /// Creates a bot on top of `transport`.
    pub fn new(transport: BoxedTransport) -> Self {
        Self { transport }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &BoxedTransport {
        &self.transport
    }

    async fn call(&self, endpoint: &str, payload: Option<Value>) -> ApiResult<Option<Value>> {
        debug!(endpoint = %endpoint, "Calling bot API");
        Ok(self.transport.post_json(endpoint, payload).await?)
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Fetches pending updates.
    ///
    /// An empty response body or a response without `data` is an empty batch.
    pub async fn get_updates(&self) -> TransportResult<Vec<RawUpdate>> {
        let Some(response) = self.transport.post_json("getUpdates", None).await? else {
            return Ok(Vec::new());
        };

        match response.get("data") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.iter().cloned().map(RawUpdate::new).collect()),
            Some(other) => Err(TransportError::MalformedResponse(format!(
                "getUpdates 'data' is not an array: {other}"
            ))),
        }
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Sends a plain text message.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> ApiResult<Option<Value>> {
        self.call("sendMessage", Some(json!({ "to": chat_id, "text": text })))
            .await
    }

    /// Sends a message with reply-keyboard options.
    pub async fn send_message_with_options(
        &self,
        chat_id: &str,
        text: &str,
        options: &[ButtonOption],
    ) -> ApiResult<Option<Value>> {
        let payload = json!({ "to": chat_id, "text": text, "options": options });
        self.call("sendMessage", Some(payload)).await
    }

    /// Sends a message with a button layout.
    pub async fn send_message_with_buttons(
        &self,
        chat_id: &str,
        text: &str,
        buttons: Buttons,
    ) -> ApiResult<Option<Value>> {
        let payload = json!({ "to": chat_id, "text": text, "buttons": buttons });
        self.call("sendMessage", Some(payload)).await
    }

    /// Sends a message whose media is fetched by the server from `media_urls`.
    pub async fn send_message_with_media_urls(
        &self,
        chat_id: &str,
        text: &str,
        media_urls: &[String],
    ) -> ApiResult<Option<Value>> {
        let payload = json!({ "to": chat_id, "text": text, "mediaURLs": media_urls });
        self.call("sendMessage", Some(payload)).await
    }

    /// Uploads local files to a chat with an optional caption.
    ///
    /// Every file is checked before anything is sent: one missing or
    /// oversized file aborts the whole upload.
    pub async fn send_files<P: AsRef<Path>>(
        &self,
        chat_id: &str,
        paths: &[P],
        caption: Option<&str>,
    ) -> ApiResult<Option<Value>> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            files.push(read_upload(path.as_ref()).await?);
        }

        let fields = vec![
            ("to".to_string(), chat_id.to_string()),
            ("text".to_string(), caption.unwrap_or_default().to_string()),
        ];

        debug!(endpoint = "sendMessage", files = files.len(), "Uploading files");
        Ok(self
            .transport
            .post_multipart("sendMessage", fields, files)
            .await?)
    }

    // =========================================================================
    // Bot configuration
    // =========================================================================

    /// Replaces the command menu shown to users.
    pub async fn configure_commands(&self, commands: &[BotCommand]) -> ApiResult<Option<Value>> {
        let response = self
            .call("setCommands", Some(json!({ "commands": commands })))
            .await?;
        if response.is_some() {
            info!(count = commands.len(), "Commands configured");
        }
        Ok(response)
    }

    /// Registers a webhook URL.
    pub async fn set_webhook(&self, webhook_url: &str) -> ApiResult<Option<Value>> {
        let response = self
            .call("setWebhook", Some(json!({ "webhookURL": webhook_url })))
            .await?;
        if response.is_some() {
            info!(url = %webhook_url, "Webhook set");
        }
        Ok(response)
    }

    /// Returns the current webhook registration.
    pub async fn get_webhook_info(&self) -> ApiResult<Option<Value>> {
        self.call("getWebhookInfo", None).await
    }

    /// Removes the webhook registration.
    pub async fn remove_webhook(&self) -> ApiResult<Option<Value>> {
        let response = self.call("deleteWebhook", None).await?;
        if response.is_some() {
            info!("Webhook deleted");
        }
        Ok(response)
    }

    /// Returns information about the bot account.
    pub async fn get_bot_info(&self) -> ApiResult<Option<Value>> {
        self.call("getMe", None).await
    }

    /// Returns a user's membership status in a channel.
    pub async fn get_channel_user_status(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> ApiResult<Option<Value>> {
        let payload = json!({ "channelId": channel_id, "userId": user_id });
        self.call("getChannelMember", Some(payload)).await
    }
}

#[async_trait]
impl UpdateSource for Bot {
    async fn fetch_updates(&self) -> TransportResult<Vec<RawUpdate>> {
        self.get_updates().await
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot").finish_non_exhaustive()
    }
}

async fn read_upload(path: &Path) -> ApiResult<FileUpload> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(file_read_error(path, &e)),
    };

    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| file_read_error(path, &e))?;
    Ok(FileUpload::from_bytes(path, bytes))
}

fn file_read_error(path: &Path, err: &std::io::Error) -> ApiError {
    ApiError::FileRead {
        path: PathBuf::from(path),
        reason: err.to_string(),
    }
}
