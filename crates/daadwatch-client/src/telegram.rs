//! Telegram Bot API client.
//!
//! Only the handful of methods the watcher needs. Every response is the Bot
//! API envelope `{ "ok": bool, "result": …, "description": … }`.

use crate::config::TelegramConfig;
use crate::errors::{delivery_error, ClientError};
use daadwatch_core::errors::Result;
use daadwatch_core::ports::Notifier;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// One entry of `getUpdates`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// The Bot API calls the `/getjson` command handler relies on
pub trait BotTransport {
    /// Pending updates from `offset` on, long-polling up to `timeout_secs`
    ///
    /// # Errors
    ///
    /// Any transport or API failure.
    fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> std::result::Result<Vec<Update>, ClientError>;

    /// # Errors
    ///
    /// Any transport or API failure.
    fn send_message(&self, chat_id: &str, text: &str) -> std::result::Result<(), ClientError>;

    /// # Errors
    ///
    /// Any transport or API failure.
    fn send_document(
        &self,
        chat_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> std::result::Result<(), ClientError>;

    /// Acknowledge every update before `offset` so it is not delivered again
    ///
    /// # Errors
    ///
    /// Any transport or API failure.
    fn acknowledge(&self, offset: i64) -> std::result::Result<(), ClientError> {
        self.get_updates(Some(offset), 0).map(|_| ())
    }
}

/// Blocking Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    /// # Errors
    ///
    /// `ClientError::Config` if no bot token is configured.
    pub fn new(config: TelegramConfig) -> std::result::Result<Self, ClientError> {
        if config.bot_token.is_blank() {
            return Err(ClientError::Config(
                "telegram bot token is not set (DAADWATCH_BOT_TOKEN or BOT_TOKEN)".into(),
            ));
        }
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token.expose(),
            method
        )
    }
}

impl BotTransport for TelegramClient {
    fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> std::result::Result<Vec<Update>, ClientError> {
        let mut query = vec![("timeout", timeout_secs.to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        let resp = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&query)
            .send()?;
        Ok(read_envelope::<Vec<Update>>(resp)?.unwrap_or_default())
    }

    fn send_message(&self, chat_id: &str, text: &str) -> std::result::Result<(), ClientError> {
        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()?;
        read_envelope::<serde_json::Value>(resp).map(|_| ())
    }

    fn send_document(
        &self,
        chat_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> std::result::Result<(), ClientError> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", Part::bytes(content).file_name(file_name.to_string()));
        let resp = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()?;
        read_envelope::<serde_json::Value>(resp).map(|_| ())
    }
}

fn read_envelope<T: DeserializeOwned>(resp: Response) -> std::result::Result<Option<T>, ClientError> {
    let status = resp.status();
    let body = resp.text()?;
    parse_envelope(status.as_u16(), &body)
}

/// Decode a Bot API response body
///
/// # Errors
///
/// `Api` when Telegram reports `ok: false`, `Status` for other non-2xx
/// responses, `Decode` for anything that is not an envelope.
pub fn parse_envelope<T: DeserializeOwned>(
    status: u16,
    body: &str,
) -> std::result::Result<Option<T>, ClientError> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(env) if env.ok => Ok(env.result),
        Ok(env) => Err(ClientError::Api(
            env.description
                .unwrap_or_else(|| format!("request failed with HTTP {}", status)),
        )),
        Err(_) if !(200..300).contains(&status) => Err(ClientError::Status {
            status,
            body: body.chars().take(200).collect(),
        }),
        Err(e) => Err(ClientError::Decode(e.to_string())),
    }
}

/// Delivers report segments to one chat via `sendMessage`, single attempt
pub struct TelegramNotifier {
    client: TelegramClient,
    chat_id: String,
}

impl TelegramNotifier {
    /// # Errors
    ///
    /// `ClientError::Config` if the token or the chat id is missing.
    pub fn new(config: TelegramConfig) -> std::result::Result<Self, ClientError> {
        if config.chat_id.trim().is_empty() {
            return Err(ClientError::Config(
                "telegram chat id is not set (DAADWATCH_CHAT_ID)".into(),
            ));
        }
        let chat_id = config.chat_id.trim().to_string();
        Ok(Self {
            client: TelegramClient::new(config)?,
            chat_id,
        })
    }
}

impl Notifier for TelegramNotifier {
    fn send(&self, segment: &str) -> Result<()> {
        self.client
            .send_message(&self.chat_id, segment)
            .map_err(|e| delivery_error("send_segment", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daadwatch_core_types::Secret;

    fn config() -> TelegramConfig {
        TelegramConfig {
            bot_token: Secret::new("123:abc"),
            chat_id: "42".to_string(),
            api_base: "https://api.telegram.org/".to_string(),
            ..TelegramConfig::default()
        }
    }

    #[test]
    fn test_method_url_embeds_token() {
        let client = TelegramClient::new(config()).unwrap();
        assert_eq!(
            client.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let cfg = TelegramConfig {
            bot_token: Secret::default(),
            ..config()
        };
        assert!(matches!(TelegramClient::new(cfg), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_notifier_requires_chat_id() {
        let cfg = TelegramConfig {
            chat_id: " ".to_string(),
            ..config()
        };
        assert!(matches!(TelegramNotifier::new(cfg), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_parse_updates_envelope() {
        let body = r#"{"ok": true, "result": [
            {"update_id": 10, "message": {"chat": {"id": 5}, "text": "/getjson"}},
            {"update_id": 11, "edited_message": {"chat": {"id": 5}}}
        ]}"#;
        let updates: Vec<Update> = parse_envelope(200, body).unwrap().unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].message.as_ref().unwrap().text.as_deref(), Some("/getjson"));
        assert!(updates[1].message.is_none());
    }

    #[test]
    fn test_api_error_uses_description() {
        let body = r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#;
        let err = parse_envelope::<serde_json::Value>(400, body).unwrap_err();
        assert!(matches!(err, ClientError::Api(ref d) if d.contains("chat not found")));
    }

    #[test]
    fn test_non_json_error_body_is_status_error() {
        let err = parse_envelope::<serde_json::Value>(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 502, .. }));
    }
}
