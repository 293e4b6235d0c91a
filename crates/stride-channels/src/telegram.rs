//! Telegram Bot API client.
//!
//! Long polling via `getUpdates` and `sendMessage` for responses.
//! Docs: <https://core.telegram.org/bots/api>

use serde::Deserialize;
use std::time::Duration;
use stride_core::error::StrideError;
use tracing::debug;

/// Extra headroom on the HTTP timeout over the server-side long-poll
/// timeout, so the server answers first.
const POLL_TIMEOUT_MARGIN_SECS: u64 = 5;

/// Stateless Telegram client: owns only the endpoint and credential.
#[derive(Clone)]
pub struct TgClient {
    client: reqwest::Client,
    base_url: String,
}

// --- Telegram API types ---
//
// Unknown fields are ignored on deserialization (serde default), so new
// gateway fields never break the bot.

#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// One gateway event: a monotonically increasing sequence number and an
/// optional message payload (non-message updates carry none).
#[derive(Debug, Deserialize)]
pub struct TgUpdate {
    pub update_id: i64,
    pub message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub chat: TgChat,
    /// Absent for stickers, photos, service messages.
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TgChat {
    pub id: i64,
    /// Chat type: "private", "group", "supergroup", or "channel".
    #[serde(default, rename = "type")]
    pub chat_type: String,
}

impl TgClient {
    /// Create a client for the given bot token.
    pub fn new(bot_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("https://api.telegram.org/bot{bot_token}"),
        }
    }

    /// Long-poll for updates at or after `offset`.
    ///
    /// Blocks up to `timeout_secs` on the server side and returns an empty
    /// vec when nothing arrived. Any network, decode, or API-level failure
    /// maps to [`StrideError::Gateway`]; the caller retries on its next
    /// loop iteration.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<TgUpdate>, StrideError> {
        let url = format!(
            "{}/getUpdates?offset={offset}&timeout={timeout_secs}",
            self.base_url
        );

        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(timeout_secs + POLL_TIMEOUT_MARGIN_SECS))
            .send()
            .await
            .map_err(|e| StrideError::Gateway(format!("getUpdates failed: {e}")))?;

        let body: TgResponse<Vec<TgUpdate>> = resp
            .json()
            .await
            .map_err(|e| StrideError::Gateway(format!("getUpdates parse failed: {e}")))?;

        if !body.ok {
            return Err(StrideError::Gateway(format!(
                "getUpdates rejected: {}",
                body.description.unwrap_or_default()
            )));
        }

        let updates = body.result.unwrap_or_default();
        if !updates.is_empty() {
            debug!("received {} update(s)", updates.len());
        }
        Ok(updates)
    }

    /// Send a text message to a chat. Best effort: the caller logs failures
    /// and carries on, there is no retry.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), StrideError> {
        let url = format!("{}/sendMessage", self.base_url);
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StrideError::Gateway(format!("sendMessage failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(StrideError::Gateway(format!(
                "sendMessage got {status}: {error_text}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_with_text_message() {
        let json = r#"{
            "update_id": 851,
            "message": {
                "message_id": 7,
                "chat": {"id": 555, "type": "private"},
                "text": "/create"
            }
        }"#;
        let update: TgUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.update_id, 851);
        let msg = update.message.unwrap();
        assert_eq!(msg.chat.id, 555);
        assert_eq!(msg.text.as_deref(), Some("/create"));
    }

    #[test]
    fn test_update_without_message() {
        // e.g. an edited_message update — the bot skips these.
        let json = r#"{"update_id": 852, "edited_message": {"message_id": 7}}"#;
        let update: TgUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.update_id, 852);
        assert!(update.message.is_none());
    }

    #[test]
    fn test_message_without_text() {
        // Stickers and photos carry no text.
        let json = r#"{
            "message_id": 9,
            "chat": {"id": 100, "type": "private"},
            "sticker": {"file_id": "abc"}
        }"#;
        let msg: TgMessage = serde_json::from_str(json).unwrap();
        assert!(msg.text.is_none());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{
            "update_id": 1,
            "message": {
                "message_id": 2,
                "date": 1700000000,
                "from": {"id": 42, "is_bot": false, "first_name": "A"},
                "chat": {"id": 42, "type": "private", "first_name": "A"},
                "text": "hi",
                "entities": []
            }
        }"#;
        let update: TgUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.message.unwrap().text.as_deref(), Some("hi"));
    }

    #[test]
    fn test_chat_type_defaults_when_missing() {
        let chat: TgChat = serde_json::from_str(r#"{"id": 123}"#).unwrap();
        assert_eq!(chat.chat_type, "");
    }

    #[test]
    fn test_response_envelope_error() {
        let json = r#"{"ok": false, "description": "Unauthorized"}"#;
        let body: TgResponse<Vec<TgUpdate>> = serde_json::from_str(json).unwrap();
        assert!(!body.ok);
        assert!(body.result.is_none());
        assert_eq!(body.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn test_response_envelope_batch_order() {
        let json = r#"{"ok": true, "result": [
            {"update_id": 10, "message": {"message_id": 1, "chat": {"id": 5, "type": "private"}, "text": "a"}},
            {"update_id": 11, "message": {"message_id": 2, "chat": {"id": 6, "type": "private"}, "text": "b"}}
        ]}"#;
        let body: TgResponse<Vec<TgUpdate>> = serde_json::from_str(json).unwrap();
        let updates = body.result.unwrap();
        assert_eq!(updates.len(), 2);
        assert!(updates[0].update_id < updates[1].update_id);
    }
}
