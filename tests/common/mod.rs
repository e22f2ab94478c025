#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use chrono::Utc;
use oil_miniapp_backend::{
    error::{Error, Result},
    models::{
        settings::Settings,
        user::{NewUser, User},
    },
    routes,
    services::{
        avatar_service::AvatarStore,
        notification_service::NotificationThrottle,
        telegram_service::{BotApi, TelegramFile, UserProfilePhotos},
        user_service::UserStore,
    },
    utils::{telegram_auth::sign_init_data, token::SessionKeys},
    AppState,
};
use url::form_urlencoded::Serializer;
use uuid::Uuid;

pub const BOT_TOKEN: &str = "123456:integration-bot-token";
pub const JWT_SECRET: &str = "integration_jwt_secret";

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<Vec<User>>,
    settings: Mutex<Option<Settings>>,
}

impl InMemoryUsers {
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            settings: Mutex::new(Some(settings)),
        }
    }

    pub fn insert(&self, tg_id: i64, referral_code: &str, oil_storage_level: i32) -> User {
        let user = User {
            id: Uuid::new_v4(),
            tg_id,
            referral_code: referral_code.to_string(),
            enter_referral_code: String::new(),
            nick_name: format!("player{}", tg_id),
            tg_username: None,
            balance: 0,
            oil_storage_level,
            avatar_url: String::new(),
            created_at: Utc::now(),
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn get(&self, tg_id: i64) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.tg_id == tg_id)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for InMemoryUsers {
    async fn find_by_tg_id(&self, tg_id: i64) -> Result<Option<User>> {
        Ok(self.get(tg_id))
    }

    async fn find_by_referral_code(&self, code: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.referral_code == code)
            .cloned())
    }

    async fn referral_code_exists(&self, code: &str) -> Result<bool> {
        Ok(self.find_by_referral_code(code).await?.is_some())
    }

    async fn create(&self, new: NewUser) -> Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.tg_id == new.tg_id) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            tg_id: new.tg_id,
            referral_code: new.referral_code,
            enter_referral_code: new.enter_referral_code,
            nick_name: new.nick_name,
            tg_username: new.tg_username,
            balance: 0,
            oil_storage_level: 1,
            avatar_url: new.avatar_url,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(Some(user))
    }

    async fn settings(&self) -> Result<Option<Settings>> {
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn credit_referral(
        &self,
        tg_id: i64,
        referral_reward: i64,
        referrer_id: Uuid,
        referrer_reward: i64,
    ) -> Result<(User, User)> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.tg_id == tg_id)
            .ok_or_else(|| Error::NotFound("user".into()))?;
        user.balance += referral_reward;
        let user = user.clone();
        let referrer = users
            .iter_mut()
            .find(|u| u.id == referrer_id)
            .ok_or_else(|| Error::NotFound("referrer".into()))?;
        referrer.balance += referrer_reward;
        Ok((user, referrer.clone()))
    }
}

/// Bot double: users have no profile photos; sent messages are recorded.
#[derive(Default)]
pub struct RecordingBot {
    pub sent: Mutex<Vec<(i64, String)>>,
}

#[async_trait]
impl BotApi for RecordingBot {
    async fn get_user_profile_photos(&self, _user_id: i64) -> Result<UserProfilePhotos> {
        Ok(UserProfilePhotos::default())
    }

    async fn get_file(&self, file_id: &str) -> Result<TelegramFile> {
        Err(Error::Telegram(format!("no file {}", file_id)))
    }

    async fn download_file(&self, _file_path: &str) -> Result<Bytes> {
        Err(Error::Telegram("no files".into()))
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

pub struct NoAvatars;

#[async_trait]
impl AvatarStore for NoAvatars {
    async fn save(&self, _tg_id: i64, _source_path: &str, _data: Bytes) -> Result<String> {
        Err(Error::Internal("avatars disabled".into()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUsers>,
    pub bot: Arc<RecordingBot>,
    pub sessions: SessionKeys,
}

pub fn setup_app(users: InMemoryUsers) -> TestApp {
    setup_app_with_rps(users, 1000)
}

pub fn setup_app_with_rps(users: InMemoryUsers, rps: u32) -> TestApp {
    let users = Arc::new(users);
    let bot = Arc::new(RecordingBot::default());
    let sessions = SessionKeys::new(JWT_SECRET, "1h").expect("session keys");
    let state = AppState::from_parts(
        users.clone(),
        bot.clone(),
        Arc::new(NoAvatars),
        NotificationThrottle::with_interval(Duration::ZERO, 1),
        sessions.clone(),
        BOT_TOKEN,
    );
    let uploads = std::env::temp_dir().join("oil-miniapp-test-uploads");
    let router = routes::app_router(state, &uploads.to_string_lossy(), rps);
    TestApp {
        router,
        users,
        bot,
        sessions,
    }
}

/// Builds a correctly signed init-data string for `pairs`.
pub fn signed_init_data(pairs: &[(&str, &str)]) -> String {
    let owned: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let hash = sign_init_data(&owned, BOT_TOKEN);
    let mut serializer = Serializer::new(String::new());
    for (k, v) in &owned {
        serializer.append_pair(k, v);
    }
    serializer.append_pair("hash", &hash);
    serializer.finish()
}

pub fn user_json(id: i64, first_name: &str, username: Option<&str>) -> String {
    serde_json::json!({
        "id": id,
        "first_name": first_name,
        "username": username,
        "language_code": "en",
    })
    .to_string()
}
