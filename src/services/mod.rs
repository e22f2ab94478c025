pub mod avatar_service;
pub mod notification_service;
pub mod registration_service;
pub mod telegram_service;
pub mod user_service;
