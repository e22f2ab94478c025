use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::utils::duration::{parse_duration_to_seconds, DEFAULT_DURATION_SECS};

/// A signed session token and the Unix time at which it stops being valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
struct Expiring<'a, T: Serialize> {
    #[serde(flatten)]
    claims: &'a T,
    iat: i64,
    exp: i64,
}

/// Seconds a token issued at `now` stays valid. Durations that do not fit an
/// `i64` expiry fall back to the default lifetime.
fn token_lifetime(expires_in: &str, now: i64) -> i64 {
    let fallback = DEFAULT_DURATION_SECS as i64;
    match i64::try_from(parse_duration_to_seconds(expires_in)) {
        Ok(secs) if now.checked_add(secs).is_some() => secs,
        _ => {
            tracing::warn!(expires_in, "Token lifetime out of range, using default");
            fallback
        }
    }
}

/// Signs `claims` as an HS256 JWT valid for `expires_in` (e.g. `"1h"`).
///
/// `expires_in` on the result is computed from the wall clock separately from
/// the `exp` claim, so the two can differ by the time spent signing.
pub fn generate_token<T: Serialize>(
    claims: &T,
    key: &EncodingKey,
    expires_in: &str,
) -> Result<IssuedToken> {
    let iat = Utc::now().timestamp();
    let lifetime = token_lifetime(expires_in, iat);
    let token = encode(
        &Header::new(Algorithm::HS256),
        &Expiring {
            claims,
            iat,
            exp: iat + lifetime,
        },
        key,
    )?;

    Ok(IssuedToken {
        token,
        expires_in: Utc::now().timestamp().saturating_add(lifetime),
    })
}

/// Signing material for session tokens, built once at startup.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expires_in: String,
}

impl SessionKeys {
    pub fn new(secret: &str, expires_in: impl Into<String>) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Config("JWT secret must not be empty".to_string()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expires_in: expires_in.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.jwt_secret, config.jwt_expires_in.clone())
    }

    pub fn issue<T: Serialize>(&self, claims: &T) -> Result<IssuedToken> {
        generate_token(claims, &self.encoding, &self.expires_in)
    }

    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<T>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}
