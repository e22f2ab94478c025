use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub tg_id: i64,
    pub referral_code: String,
    #[serde(rename = "EnterReferralCode")]
    pub enter_referral_code: String,
    pub nick_name: String,
    pub tg_username: Option<String>,
    pub balance: i64,
    pub oil_storage_level: i32,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when a player is first seen.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub tg_id: i64,
    pub referral_code: String,
    pub enter_referral_code: String,
    pub nick_name: String,
    pub tg_username: Option<String>,
    pub avatar_url: String,
}
