use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::settings::Settings;
use crate::models::user::{NewUser, User};

const USER_COLUMNS: &str = "id, tg_id, referral_code, enter_referral_code, nick_name, tg_username, \
     balance, oil_storage_level, avatar_url, created_at";

/// Player persistence used by the HTTP handlers and the registration flow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_tg_id(&self, tg_id: i64) -> Result<Option<User>>;

    async fn find_by_referral_code(&self, code: &str) -> Result<Option<User>>;

    async fn referral_code_exists(&self, code: &str) -> Result<bool>;

    /// Inserts a player. Returns `None` when a row with the same `tg_id`
    /// already exists (a concurrent registration won).
    async fn create(&self, user: NewUser) -> Result<Option<User>>;

    async fn settings(&self) -> Result<Option<Settings>>;

    /// Adds `referral_reward` to the new player and `referrer_reward` to the
    /// referrer as a single unit. Returns both updated rows.
    async fn credit_referral(
        &self,
        tg_id: i64,
        referral_reward: i64,
        referrer_id: Uuid,
        referrer_reward: i64,
    ) -> Result<(User, User)>;
}

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserService {
    async fn find_by_tg_id(&self, tg_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE tg_id = $1",
            USER_COLUMNS
        ))
        .bind(tg_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_referral_code(&self, code: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE referral_code = $1",
            USER_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn referral_code_exists(&self, code: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE referral_code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists.0)
    }

    async fn create(&self, user: NewUser) -> Result<Option<User>> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (tg_id, referral_code, enter_referral_code, nick_name, tg_username, avatar_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tg_id) DO NOTHING
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.tg_id)
        .bind(&user.referral_code)
        .bind(&user.enter_referral_code)
        .bind(&user.nick_name)
        .bind(&user.tg_username)
        .bind(&user.avatar_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(created)
    }

    async fn settings(&self) -> Result<Option<Settings>> {
        let settings = sqlx::query_as::<_, Settings>(
            "SELECT referral_reward, referrer_reward FROM settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(settings)
    }

    async fn credit_referral(
        &self,
        tg_id: i64,
        referral_reward: i64,
        referrer_id: Uuid,
        referrer_reward: i64,
    ) -> Result<(User, User)> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET balance = balance + $1 WHERE tg_id = $2 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(referral_reward)
        .bind(tg_id)
        .fetch_one(&mut *tx)
        .await?;

        let referrer = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET balance = balance + $1 WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(referrer_reward)
        .bind(referrer_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((user, referrer))
    }
}
