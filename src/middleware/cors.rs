use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// The mini-app is served from Telegram's WebView on a different origin.
pub fn webapp_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(Any)
}
