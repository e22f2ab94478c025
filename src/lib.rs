pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    avatar_service::{AvatarStore, FsAvatarStore},
    notification_service::NotificationThrottle,
    registration_service::RegistrationService,
    telegram_service::{BotApi, TelegramService},
    user_service::{UserService, UserStore},
};
use crate::utils::token::SessionKeys;
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub registration: RegistrationService,
    pub sessions: SessionKeys,
    pub bot_token: Arc<str>,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let users: Arc<dyn UserStore> = Arc::new(UserService::new(pool));
        let bot: Arc<dyn BotApi> = Arc::new(TelegramService::new(
            http_client,
            config.telegram_api_url.clone(),
            config.telegram_bot_token.clone(),
        ));
        let avatars: Arc<dyn AvatarStore> = Arc::new(FsAvatarStore::new(&config.uploads_dir));
        let throttle =
            NotificationThrottle::new(config.notify_per_second, config.notify_max_concurrent);

        Ok(Self::from_parts(
            users,
            bot,
            avatars,
            throttle,
            SessionKeys::from_config(config)?,
            &config.telegram_bot_token,
        ))
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        bot: Arc<dyn BotApi>,
        avatars: Arc<dyn AvatarStore>,
        throttle: NotificationThrottle,
        sessions: SessionKeys,
        bot_token: &str,
    ) -> Self {
        let registration = RegistrationService::new(users.clone(), bot, avatars, throttle);
        Self {
            users,
            registration,
            sessions,
            bot_token: Arc::from(bot_token),
        }
    }
}
