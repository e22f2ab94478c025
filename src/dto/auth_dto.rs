use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TelegramAuthRequest {
    #[validate(length(min = 1))]
    pub init_data: String,
    #[validate(length(max = 64))]
    pub referral_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramAuthResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}
