// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Minimal Telegram Bot API client.
//!
//! Only the calls the bot needs: `getMe`, long-polling `getUpdates`,
//! `sendMessage` and a multipart `sendAudio`.

use crate::config::TelegramConfig;
use crate::media::{AudioPayload, Replier};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Slack on top of the long-poll timeout before the HTTP request gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Bot API failures.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Bot API request failed: {0}")]
    Http(reqwest::Error),

    #[error("Bot API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Bot API returned ok without a result")]
    EmptyResult,
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs embed the token
        Self::Http(e.without_url())
    }
}

impl TelegramError {
    /// The token was rejected; retrying will not help.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Api { code, .. } => *code == 401,
            Self::Http(e) => e.status() == Some(reqwest::StatusCode::UNAUTHORIZED),
            Self::EmptyResult => false,
        }
    }
}

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, TelegramError> {
        if !self.ok {
            return Err(TelegramError::Api {
                code: self.error_code.unwrap_or(0),
                description: self.description.unwrap_or_default(),
            });
        }
        self.result.ok_or(TelegramError::EmptyResult)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Bot API client bound to one token.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base: String,
    poll_timeout: Duration,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(token: &str, config: &TelegramConfig) -> Result<Self, TelegramError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base: format!("{}/bot{}", config.api_url.trim_end_matches('/'), token),
            poll_timeout: config.poll_timeout(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base, method)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TelegramError> {
        // Error responses carry a JSON body too, so decode before checking status
        let envelope: ApiResponse<T> = response.json().await?;
        envelope.into_result()
    }

    /// Identity of the bot itself; also verifies the token.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        let response = self.client.get(self.method_url("getMe")).send().await?;
        Self::decode(response).await
    }

    /// Long-poll for updates with id `offset` or later.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdates {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: &["message"],
        };
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(self.poll_timeout + POLL_GRACE)
            .json(&body)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessage { chat_id, text })
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Upload an audio file to a chat.
    pub async fn send_audio(&self, chat_id: i64, audio: AudioPayload) -> Result<Message, TelegramError> {
        debug!(chat_id, filename = %audio.filename, bytes = audio.data.len(), "Uploading audio");
        let part = Part::bytes(audio.data)
            .file_name(audio.filename)
            .mime_str("audio/mpeg")?;
        // Send UTF-8 filenames as-is rather than percent-encoded
        let form = Form::new()
            .percent_encode_noop()
            .text("chat_id", chat_id.to_string())
            .text("title", audio.title)
            .part("audio", part);

        let response = self
            .client
            .post(self.method_url("sendAudio"))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }
}

/// Replies into the chat a message came from.
pub struct ChatReplier<'a> {
    client: &'a TelegramClient,
    chat_id: i64,
}

impl<'a> ChatReplier<'a> {
    pub fn new(client: &'a TelegramClient, chat_id: i64) -> Self {
        Self { client, chat_id }
    }
}

impl Replier for ChatReplier<'_> {
    async fn send_text(&self, text: &str) -> Result<(), TelegramError> {
        self.client.send_message(self.chat_id, text).await.map(|_| ())
    }

    async fn send_audio(&self, audio: AudioPayload) -> Result<(), TelegramError> {
        self.client.send_audio(self.chat_id, audio).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_update() {
        let json = r#"{
            "ok": true,
            "result": [{
                "update_id": 42,
                "message": {
                    "message_id": 7,
                    "date": 1700000000,
                    "from": {"id": 1001, "is_bot": false, "first_name": "Ann"},
                    "chat": {"id": 1001, "type": "private"},
                    "text": "https://example.com/show/1"
                }
            }]
        }"#;
        let updates = serde_json::from_str::<ApiResponse<Vec<Update>>>(json)
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(updates.len(), 1);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.from.as_ref().unwrap().id, 1001);
        assert_eq!(message.text.as_deref(), Some("https://example.com/show/1"));
    }

    #[test]
    fn test_api_error() {
        let json = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let err = serde_json::from_str::<ApiResponse<User>>(json)
            .unwrap()
            .into_result()
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Bot API error 401: Unauthorized");
    }

    #[test]
    fn test_debug_hides_token() {
        let client = TelegramClient::new("123:secret", &TelegramConfig::default()).unwrap();
        assert!(!format!("{:?}", client).contains("secret"));
        assert_eq!(
            client.method_url("getMe"),
            "https://api.telegram.org/bot123:secret/getMe"
        );
    }
}
