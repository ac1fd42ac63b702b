//! Telegram Bot API Data Models
//!
//! The subset of the Bot API types the bot consumes: long-poll updates,
//! photo messages with captions, and file descriptors for downloads.

use serde::{Deserialize, Serialize};

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    /// Error text when `ok` is false
    #[serde(default)]
    pub description: Option<String>,
}

/// One item from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    /// Unix timestamp (seconds)
    pub date: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    /// Available sizes of an attached photo, smallest first
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

impl Message {
    /// The largest rendition of an attached photo, if any.
    pub fn largest_photo(&self) -> Option<&PhotoSize> {
        self.photo.as_deref().and_then(|sizes| sizes.last())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Response from `getFile`; `file_path` feeds the file download endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub file_id: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Request body for `getUpdates` long polling.
#[derive(Debug, Serialize)]
pub struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Long-poll hold time in seconds
    pub timeout: u64,
    pub allowed_updates: Vec<String>,
}

/// Request body for `sendMessage`.
#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_update_deserializes() {
        let json = r#"{
            "update_id": 10,
            "message": {
                "message_id": 55,
                "from": {"id": 7, "username": "trader"},
                "chat": {"id": 7},
                "date": 1700000000,
                "caption": "15M",
                "photo": [
                    {"file_id": "small", "width": 90, "height": 60},
                    {"file_id": "big", "width": 1280, "height": 853, "file_size": 104200}
                ]
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let msg = update.message.unwrap();
        assert_eq!(msg.caption.as_deref(), Some("15M"));
        assert_eq!(msg.largest_photo().unwrap().file_id, "big");
    }

    #[test]
    fn test_error_envelope_deserializes() {
        let json = r#"{"ok": false, "description": "Unauthorized"}"#;
        let resp: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.description.as_deref(), Some("Unauthorized"));
        assert!(resp.result.is_none());
    }
}
