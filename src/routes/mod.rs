pub mod auth;
pub mod health;
pub mod webapp;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{auth::require_session, cors::webapp_cors, rate_limit};
use crate::AppState;

pub fn app_router(state: AppState, uploads_dir: &str, webapp_rps: u32) -> Router {
    let limiter = rate_limit::RequestRateLimiter::new(webapp_rps);

    let webapp_api = Router::new()
        .route(
            "/api/webapp/upgrade/oilStorage",
            get(webapp::get_oil_storage),
        )
        .route("/api/webapp/user", get(webapp::get_me))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let public_api = Router::new().route("/api/auth/telegram", post(auth::telegram_login));

    Router::new()
        .route("/health", get(health::health))
        .merge(
            public_api
                .merge(webapp_api)
                .layer(axum::middleware::from_fn_with_state(
                    limiter,
                    rate_limit::rps_middleware,
                )),
        )
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .with_state(state)
        .layer(webapp_cors())
        .layer(TraceLayer::new_for_http())
}
