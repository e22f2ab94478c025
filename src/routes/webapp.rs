use axum::{extract::State, Extension, Json};

use crate::dto::webapp_dto::OilStorageResponse;
use crate::error::{Error, Result};
use crate::middleware::auth::SessionClaims;
use crate::models::user::User;
use crate::AppState;

async fn current_user(state: &AppState, claims: &SessionClaims) -> Result<User> {
    state
        .users
        .find_by_tg_id(claims.user.id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))
}

/// Current oil storage upgrade level of the calling player.
#[axum::debug_handler]
pub async fn get_oil_storage(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<OilStorageResponse>> {
    let user = current_user(&state, &claims).await.map_err(|e| {
        tracing::error!(tg_id = claims.user.id, error = ?e, "Error while reading oil storage level");
        e
    })?;

    Ok(Json(OilStorageResponse {
        oil_storage_level: user.oil_storage_level,
    }))
}

#[axum::debug_handler]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<User>> {
    let user = current_user(&state, &claims).await?;
    Ok(Json(user))
}
