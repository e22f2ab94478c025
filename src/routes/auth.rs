use axum::{extract::State, Json};
use serde_json::{Map, Value};
use validator::Validate;

use crate::dto::auth_dto::{TelegramAuthRequest, TelegramAuthResponse};
use crate::error::{Error, Result};
use crate::utils::query_string::{decode_query, QueryParams};
use crate::utils::telegram_auth::{parse_web_app_user, verify_init_data, WebAppUser};
use crate::AppState;

/// Init-data keys that would collide with the signature or the registered
/// JWT claims added at signing time.
const RESERVED_CLAIMS: [&str; 3] = ["hash", "iat", "exp"];

/// Session claims: the decoded init data with `user` expanded to an object.
fn session_claims(params: &QueryParams, tg_user: &WebAppUser) -> Result<Value> {
    let mut claims = Map::new();
    for (key, value) in params.iter() {
        if RESERVED_CLAIMS.contains(&key.as_str()) {
            continue;
        }
        claims.insert(key.clone(), serde_json::to_value(value)?);
    }
    claims.insert("user".to_string(), serde_json::to_value(tg_user)?);
    Ok(Value::Object(claims))
}

#[axum::debug_handler]
pub async fn telegram_login(
    State(state): State<AppState>,
    Json(payload): Json<TelegramAuthRequest>,
) -> Result<Json<TelegramAuthResponse>> {
    payload.validate()?;

    if !verify_init_data(&payload.init_data, &state.bot_token) {
        tracing::warn!("Rejected Telegram init data with invalid hash");
        return Err(Error::Unauthorized("invalid_init_data".to_string()));
    }

    let params = decode_query(&payload.init_data);
    let tg_user = parse_web_app_user(&params)
        .ok_or_else(|| Error::BadRequest("Init data does not contain a valid user".to_string()))?;

    let referral_code = payload
        .referral_code
        .as_deref()
        .filter(|code| !code.trim().is_empty())
        .or_else(|| params.first("start_param"));

    let user = state.registration.register(referral_code, &tg_user).await?;
    let issued = state.sessions.issue(&session_claims(&params, &tg_user)?)?;
    tracing::info!(tg_id = tg_user.id, "Issued session token");

    Ok(Json(TelegramAuthResponse {
        token: issued.token,
        expires_in: issued.expires_in,
        user,
    }))
}
