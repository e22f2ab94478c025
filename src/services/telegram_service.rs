use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_unique_id: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfilePhotos {
    pub total_count: i64,
    #[serde(default)]
    pub photos: Vec<Vec<PhotoSize>>,
}

impl UserProfilePhotos {
    /// File id of the first size of the most recent photo.
    pub fn first_file_id(&self) -> Option<&str> {
        if self.total_count <= 0 {
            return None;
        }
        self.photos
            .first()
            .and_then(|sizes| sizes.first())
            .map(|p| p.file_id.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramFile {
    pub file_id: String,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> TelegramResponse<T> {
    fn into_result(self) -> Result<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(Error::Telegram(
                self.description
                    .unwrap_or_else(|| "request was not successful".to_string()),
            )),
        }
    }
}

/// The slice of the Telegram Bot API this service talks to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn get_user_profile_photos(&self, user_id: i64) -> Result<UserProfilePhotos>;
    async fn get_file(&self, file_id: &str) -> Result<TelegramFile>;
    async fn download_file(&self, file_path: &str) -> Result<Bytes>;
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct TelegramService {
    client: Client,
    api_url: String,
    bot_token: String,
}

impl TelegramService {
    pub fn new(client: Client, api_url: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_url, self.bot_token, file_path)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;
        let envelope: TelegramResponse<T> = response.json().await?;
        envelope.into_result()
    }
}

#[async_trait]
impl BotApi for TelegramService {
    async fn get_user_profile_photos(&self, user_id: i64) -> Result<UserProfilePhotos> {
        self.call("getUserProfilePhotos", json!({ "user_id": user_id }))
            .await
    }

    async fn get_file(&self, file_id: &str) -> Result<TelegramFile> {
        self.call("getFile", json!({ "file_id": file_id })).await
    }

    async fn download_file(&self, file_path: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(self.file_url(file_path))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?)
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await?;
        tracing::debug!(chat_id, "Telegram message sent");
        Ok(())
    }
}
