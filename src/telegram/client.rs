//! Telegram Bot API Client
//!
//! Minimal long-polling client over the Bot API REST surface. Only the
//! methods the bot needs: getUpdates, sendMessage, getFile and the file
//! download endpoint.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::models::*;

/// Bot API base URL
pub const API_BASE_URL: &str = "https://api.telegram.org";

pub struct TelegramClient {
    client: Client,
    /// `https://api.telegram.org/bot<token>`
    method_base: String,
    /// `https://api.telegram.org/file/bot<token>`
    file_base: String,
}

impl TelegramClient {
    /// Create a client from the `TELEGRAM_TOKEN` environment variable.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("TELEGRAM_TOKEN")
            .context("TELEGRAM_TOKEN environment variable not set")?;
        Self::new(&token)
    }

    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, API_BASE_URL)
    }

    /// Explicit base URL (tests point this at a local stub).
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            // Must outlast the long-poll hold time
            .timeout(Duration::from_secs(90))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            method_base: format!("{}/bot{}", base_url, token),
            file_base: format!("{}/file/bot{}", base_url, token),
        })
    }

    /// Unwrap the Bot API envelope, turning `ok: false` into an error.
    fn into_result<T>(resp: ApiResponse<T>, method: &str) -> Result<T> {
        if !resp.ok {
            return Err(anyhow!(
                "Telegram {} failed: {}",
                method,
                resp.description.unwrap_or_else(|| "no description".to_string())
            ));
        }
        resp.result
            .ok_or_else(|| anyhow!("Telegram {} returned ok without a result", method))
    }

    /// Long-poll for updates. Blocks server-side up to `timeout_secs`.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let body = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message".to_string()],
        };
        let resp: ApiResponse<Vec<Update>> = self
            .client
            .post(format!("{}/getUpdates", self.method_base))
            .json(&body)
            .send()
            .await
            .context("getUpdates request failed")?
            .json()
            .await
            .context("getUpdates response was not valid JSON")?;
        Self::into_result(resp, "getUpdates")
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = SendMessageRequest { chat_id, text };
        let resp: ApiResponse<Message> = self
            .client
            .post(format!("{}/sendMessage", self.method_base))
            .json(&body)
            .send()
            .await
            .context("sendMessage request failed")?
            .json()
            .await
            .context("sendMessage response was not valid JSON")?;
        Self::into_result(resp, "sendMessage").map(|_| ())
    }

    /// Resolve a file_id to a downloadable path.
    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        let resp: ApiResponse<File> = self
            .client
            .post(format!("{}/getFile", self.method_base))
            .json(&serde_json::json!({ "file_id": file_id }))
            .send()
            .await
            .context("getFile request failed")?
            .json()
            .await
            .context("getFile response was not valid JSON")?;
        Self::into_result(resp, "getFile")
    }

    /// Fetch the raw bytes behind a `getFile` path.
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}", self.file_base, file_path);
        debug!("Downloading {}", url);
        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .context("File download request failed")?
            .error_for_status()
            .context("File download returned an error status")?
            .bytes()
            .await
            .context("Failed to read file download body")?;
        Ok(bytes.to_vec())
    }

    /// Convenience: resolve and download a photo in one step.
    pub async fn download_photo(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self.get_file(file_id).await?;
        let path = file
            .file_path
            .ok_or_else(|| anyhow!("getFile returned no file_path for {}", file_id))?;
        self.download_file(&path).await
    }
}
