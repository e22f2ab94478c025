pub mod duration;
pub mod query_string;
pub mod referral;
pub mod telegram_auth;
pub mod token;
