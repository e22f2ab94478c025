use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::utils::query_string::{parse_pairs, QueryParams};

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

/// The `user` object Telegram embeds in WebApp init data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebAppUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub is_premium: Option<bool>,
    pub photo_url: Option<String>,
}

impl WebAppUser {
    /// `@username` when present, the first name otherwise.
    pub fn display_name(&self) -> String {
        match self.username.as_deref() {
            Some(username) if !username.is_empty() => format!("@{}", username),
            _ => self.first_name.clone(),
        }
    }
}

/// Parses the JSON `user` field out of decoded init data.
pub fn parse_web_app_user(params: &QueryParams) -> Option<WebAppUser> {
    let raw = params.first("user")?;
    serde_json::from_str(raw).ok()
}

fn secret_key(bot_token: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(WEB_APP_DATA_KEY)
        .expect("HMAC accepts keys of any length");
    mac.update(bot_token.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Builds the newline-joined `key=value` string Telegram signs. `hash` entries
/// are dropped and the rest sorted by key; the sort is stable so repeated keys
/// keep their relative order.
pub fn data_check_string(pairs: &[(String, String)]) -> String {
    let mut pairs: Vec<&(String, String)> = pairs.iter().filter(|(k, _)| k != "hash").collect();
    pairs.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Computes the lowercase hex tag for a set of decoded init-data pairs.
pub fn sign_init_data(pairs: &[(String, String)], bot_token: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(&secret_key(bot_token))
        .expect("HMAC accepts keys of any length");
    mac.update(data_check_string(pairs).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Checks the `hash` of a raw WebApp init-data string against `bot_token`.
///
/// Returns `false` for any mismatch, including payloads without a `hash`.
/// The tag comparison is exact and runs in constant time.
pub fn verify_init_data(init_data: &str, bot_token: &str) -> bool {
    let pairs = parse_pairs(init_data);
    let Some(hash) = pairs
        .iter()
        .find(|(k, _)| k == "hash")
        .map(|(_, v)| v.as_str())
    else {
        return false;
    };

    let calculated = sign_init_data(&pairs, bot_token);
    calculated.as_bytes().ct_eq(hash.as_bytes()).into()
}
