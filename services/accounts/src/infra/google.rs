use std::time::Duration;

use anyhow::Context as _;
use reqwest::StatusCode;
use serde_json::Value;

use crate::domain::repository::IdentityProvider;
use crate::domain::types::ProviderProfile;
use crate::error::AccountsError;

pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Google userinfo lookup for a client-supplied OAuth access token.
#[derive(Clone)]
pub struct GoogleIdentityProvider {
    client: reqwest::Client,
    userinfo_url: String,
}

impl GoogleIdentityProvider {
    pub fn new(userinfo_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build google client")?;
        Ok(Self {
            client,
            userinfo_url,
        })
    }
}

fn text_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Build a profile from a userinfo payload. v2 uses `id`, OpenID Connect uses `sub`.
pub fn profile_from_userinfo(raw: Value) -> Result<ProviderProfile, AccountsError> {
    let uid = text_field(&raw, "id")
        .or_else(|| text_field(&raw, "sub"))
        .ok_or_else(|| AccountsError::ProviderError("userinfo has no account id".to_owned()))?;
    Ok(ProviderProfile {
        uid,
        email: text_field(&raw, "email"),
        given_name: text_field(&raw, "given_name"),
        family_name: text_field(&raw, "family_name"),
        raw,
    })
}

impl IdentityProvider for GoogleIdentityProvider {
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, AccountsError> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AccountsError::ProviderError(e.to_string()))?;

        if response.status() != StatusCode::OK {
            tracing::info!(status = %response.status(), "google rejected access token");
            return Err(AccountsError::InvalidToken);
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| AccountsError::ProviderError(e.to_string()))?;
        profile_from_userinfo(raw)
    }
}
