use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_in: String,
    pub telegram_bot_token: String,
    pub telegram_api_url: String,
    pub uploads_dir: String,
    pub webapp_rps: u32,
    pub notify_per_second: u32,
    pub notify_max_concurrent: usize,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let jwt_secret = get_env("JWT_SECRET")?;
        if jwt_secret.trim().is_empty() {
            return Err(Error::Config("JWT_SECRET must not be empty".to_string()));
        }

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret,
            jwt_expires_in: get_env_or("JWT_EXPIRES_IN", "1h"),
            telegram_bot_token: get_env("TELEGRAM_BOT_TOKEN")?,
            telegram_api_url: get_env_or("TELEGRAM_API_URL", "https://api.telegram.org"),
            uploads_dir: get_env_or("UPLOADS_DIR", "./uploads"),
            webapp_rps: get_env_parse_or("WEBAPP_RPS", 100)?,
            notify_per_second: get_env_parse_or("NOTIFY_PER_SECOND", 2)?,
            notify_max_concurrent: get_env_parse_or("NOTIFY_MAX_CONCURRENT", 1)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
