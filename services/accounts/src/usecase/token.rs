use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::domain::types::User;
use crate::error::AccountsError;

pub const ACCESS_TOKEN_TYPE: &str = "access";
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// JWT claims for both access and refresh tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub staff: bool,
    pub token_type: String,
    pub exp: u64,
}

#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

#[derive(Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

fn issue_token(
    user: &User,
    token_type: &str,
    exp: u64,
    secret: &str,
) -> Result<String, AccountsError> {
    let claims = TokenClaims {
        sub: user.id.to_string(),
        staff: user.is_staff,
        token_type: token_type.to_owned(),
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AccountsError::Internal(e.into()))
}

pub fn issue_token_pair(
    user: &User,
    settings: &TokenSettings,
    now: DateTime<Utc>,
) -> Result<TokenPair, AccountsError> {
    let now_secs = u64::try_from(now.timestamp()).unwrap_or_default();
    Ok(TokenPair {
        access: issue_token(
            user,
            ACCESS_TOKEN_TYPE,
            now_secs + settings.access_ttl_secs,
            &settings.secret,
        )?,
        refresh: issue_token(
            user,
            REFRESH_TOKEN_TYPE,
            now_secs + settings.refresh_ttl_secs,
            &settings.secret,
        )?,
    })
}
