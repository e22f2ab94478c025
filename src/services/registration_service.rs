use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::user::{NewUser, User};
use crate::services::avatar_service::AvatarStore;
use crate::services::notification_service::NotificationThrottle;
use crate::services::telegram_service::BotApi;
use crate::services::user_service::UserStore;
use crate::utils::referral::generate_referral_code;
use crate::utils::telegram_auth::WebAppUser;

pub const MAX_REFERRAL_CODE_ATTEMPTS: usize = 5;

/// First-contact registration: creates the player, re-hosts their Telegram
/// avatar and pays out referral rewards.
#[derive(Clone)]
pub struct RegistrationService {
    users: Arc<dyn UserStore>,
    bot: Arc<dyn BotApi>,
    avatars: Arc<dyn AvatarStore>,
    throttle: NotificationThrottle,
}

impl RegistrationService {
    pub fn new(
        users: Arc<dyn UserStore>,
        bot: Arc<dyn BotApi>,
        avatars: Arc<dyn AvatarStore>,
        throttle: NotificationThrottle,
    ) -> Self {
        Self {
            users,
            bot,
            avatars,
            throttle,
        }
    }

    /// Returns the existing player for `tg_user`, or registers a new one.
    ///
    /// Only avatar failures are tolerated; every other error propagates.
    pub async fn register(&self, entered_code: Option<&str>, tg_user: &WebAppUser) -> Result<User> {
        let tg_id = tg_user.id;
        if let Some(existing) = self.users.find_by_tg_id(tg_id).await? {
            return Ok(existing);
        }

        let avatar_url = match self.fetch_avatar(tg_id).await {
            Ok(Some(file_name)) => file_name,
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(tg_id, error = ?e, "Could not store Telegram avatar");
                String::new()
            }
        };

        let entered_code = entered_code.map(str::trim).unwrap_or_default();
        let referral_code = self.allocate_referral_code().await?;
        let created = self
            .users
            .create(NewUser {
                tg_id,
                referral_code,
                enter_referral_code: entered_code.to_string(),
                nick_name: tg_user.first_name.clone(),
                tg_username: tg_user.username.clone(),
                avatar_url,
            })
            .await?;

        let Some(user) = created else {
            tracing::info!(tg_id, "User registered concurrently, returning stored record");
            return self
                .users
                .find_by_tg_id(tg_id)
                .await?
                .ok_or_else(|| Error::NotFound("User not found".to_string()));
        };
        tracing::info!(tg_id, referral_code = %user.referral_code, "Registered new user");

        if entered_code.is_empty() {
            return Ok(user);
        }

        let referrer = match self.users.find_by_referral_code(entered_code).await? {
            Some(referrer) if referrer.tg_id != tg_id => referrer,
            _ => return Ok(user),
        };

        let settings = match self.users.settings().await? {
            Some(settings) => settings,
            None => {
                tracing::warn!("Settings record missing, referral rewards default to zero");
                Default::default()
            }
        };

        let (user, referrer) = self
            .users
            .credit_referral(
                tg_id,
                settings.referral_reward,
                referrer.id,
                settings.referrer_reward,
            )
            .await?;
        tracing::info!(
            tg_id,
            referrer_tg_id = referrer.tg_id,
            referral_reward = settings.referral_reward,
            referrer_reward = settings.referrer_reward,
            "Credited referral rewards"
        );

        let text = format!(
            "Congratulations🥳\nYour friend {} has successfully joined!",
            tg_user.display_name()
        );
        let bot = self.bot.clone();
        let chat_id = referrer.tg_id;
        self.throttle
            .schedule(async move { bot.send_message(chat_id, &text).await })
            .await?;

        Ok(user)
    }

    async fn fetch_avatar(&self, tg_id: i64) -> Result<Option<String>> {
        let photos = self.bot.get_user_profile_photos(tg_id).await?;
        let Some(file_id) = photos.first_file_id() else {
            return Ok(None);
        };

        let file = self.bot.get_file(file_id).await?;
        let file_path = file
            .file_path
            .ok_or_else(|| Error::Telegram("file has no download path".to_string()))?;
        let data = self.bot.download_file(&file_path).await?;
        let file_name = self.avatars.save(tg_id, &file_path, data).await?;
        Ok(Some(file_name))
    }

    async fn allocate_referral_code(&self) -> Result<String> {
        for _ in 0..MAX_REFERRAL_CODE_ATTEMPTS {
            let code = generate_referral_code();
            if !self.users.referral_code_exists(&code).await? {
                return Ok(code);
            }
            tracing::debug!("Referral code collision, retrying");
        }
        Err(Error::ReferralCodeExhausted(MAX_REFERRAL_CODE_ATTEMPTS))
    }
}
