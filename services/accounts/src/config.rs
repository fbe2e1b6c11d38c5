use std::time::Duration;

use crate::infra::google::GOOGLE_USERINFO_URL;
use crate::infra::mailer::MailSettings;
use crate::usecase::token::TokenSettings;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Accounts service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AccountsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing JWT access and refresh tokens.
    pub jwt_secret: String,
    /// TCP port to listen on (default 3114). Env var: `ACCOUNTS_PORT`.
    pub accounts_port: u16,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    /// ZeptoMail API token. Unset means OTP emails are only logged.
    pub zeptomail_api_key: Option<String>,
    pub zeptomail_otp_template_key: Option<String>,
    pub mail_from_address: String,
    pub mail_from_name: String,
    pub google_userinfo_url: String,
    /// Bound on every outbound HTTP call (mail provider, Google).
    pub outbound_timeout_secs: u64,
}

impl AccountsConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            accounts_port: env_or("ACCOUNTS_PORT", 3114),
            access_token_ttl_secs: env_or("ACCESS_TOKEN_TTL_SECS", 300),
            refresh_token_ttl_secs: env_or("REFRESH_TOKEN_TTL_SECS", 86_400),
            zeptomail_api_key: std::env::var("ZEPTOMAIL_API_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
            zeptomail_otp_template_key: std::env::var("ZEPTOMAIL_OTP_TEMPLATE_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
            mail_from_address: std::env::var("MAIL_FROM_ADDRESS")
                .unwrap_or_else(|_| "noreply@endoville.health".to_owned()),
            mail_from_name: std::env::var("MAIL_FROM_NAME")
                .unwrap_or_else(|_| "Endoville Health".to_owned()),
            google_userinfo_url: std::env::var("GOOGLE_USERINFO_URL")
                .unwrap_or_else(|_| GOOGLE_USERINFO_URL.to_owned()),
            outbound_timeout_secs: env_or("OUTBOUND_TIMEOUT_SECS", 10),
        }
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            secret: self.jwt_secret.clone(),
            access_ttl_secs: self.access_token_ttl_secs,
            refresh_ttl_secs: self.refresh_token_ttl_secs,
        }
    }

    pub fn mail_settings(&self) -> MailSettings {
        MailSettings {
            api_key: self.zeptomail_api_key.clone(),
            template_key: self.zeptomail_otp_template_key.clone(),
            from_address: self.mail_from_address.clone(),
            from_name: self.mail_from_name.clone(),
            timeout: self.outbound_timeout(),
        }
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound_timeout_secs)
    }
}
