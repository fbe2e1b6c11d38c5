#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use endoville_domain::identifier::Identifier;

use crate::domain::types::{
    NewOtp, NewSocialAccount, NewUser, Otp, ProviderProfile, SocialAccount, User, VerifyOutcome,
};
use crate::error::AccountsError;
use crate::password;

/// Owner of user records.
pub trait UserDirectory: Send + Sync {
    /// Validate and insert a user, hashing `new.password` when set.
    ///
    /// Unique violations surface as `DuplicateEmail` / `DuplicatePhone`.
    async fn create_user(&self, new: &NewUser) -> Result<User, AccountsError>;

    /// Look up by normalized (lowercase) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountsError>;

    /// Replace the password hash. `None` makes the password unusable.
    async fn set_password(&self, user_id: i64, raw: Option<&str>) -> Result<(), AccountsError>;

    /// Set `is_active = true` and return the updated record.
    async fn activate(&self, user_id: i64) -> Result<User, AccountsError>;

    async fn touch_last_login(
        &self,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), AccountsError>;

    /// `false` for accounts without a usable password.
    async fn check_password(&self, user: &User, raw: &str) -> Result<bool, AccountsError> {
        Ok(password::verify_password(user.password_hash.as_deref(), raw).await?)
    }
}

/// Persistence for one-time passwords.
pub trait OtpRepository: Send + Sync {
    /// Delete every OTP addressed to `otp.email` or `otp.phone`, then insert
    /// `otp`, in one transaction.
    async fn replace(&self, otp: &NewOtp) -> Result<Otp, AccountsError>;

    /// Most recent OTP for the identifier. Used rows are skipped unless
    /// `include_used` is set.
    async fn find_latest(
        &self,
        identifier: &Identifier,
        include_used: bool,
    ) -> Result<Option<Otp>, AccountsError>;

    /// Lock the row, apply [`Otp::attempt`] and persist the result.
    ///
    /// Returns `None` when the row no longer exists.
    async fn apply_attempt(
        &self,
        id: i64,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(Otp, VerifyOutcome)>, AccountsError>;

    /// Delete rows with `expires_at <= now`. Returns the number removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AccountsError>;
}

/// Links between local users and external identity providers.
pub trait SocialAccountRepository: Send + Sync {
    async fn find(
        &self,
        user_id: i64,
        provider: &str,
    ) -> Result<Option<SocialAccount>, AccountsError>;

    async fn create(&self, new: &NewSocialAccount) -> Result<SocialAccount, AccountsError>;

    async fn update(
        &self,
        id: i64,
        uid: &str,
        extra_data: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<SocialAccount, AccountsError>;
}

/// Delivers OTP codes. Fire-and-forget: failures are reported as `false`.
pub trait NotificationSender: Send + Sync {
    async fn send_otp(
        &self,
        to: &Identifier,
        code: &str,
        display_name: &str,
        action: Option<&str>,
    ) -> bool;
}

/// Exchanges an OAuth access token for the holder's profile.
pub trait IdentityProvider: Send + Sync {
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, AccountsError>;
}
