use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use endoville_domain::identifier::Identifier;
use endoville_domain::user::{Gender, age_on};

use crate::error::AccountsError;

/// OTP time-to-live in seconds.
pub const OTP_TTL_SECS: i64 = 300;

/// Verification attempts allowed per OTP.
pub const OTP_MAX_ATTEMPTS: i16 = 3;

/// OTP code length in digits.
pub const OTP_LEN: usize = 6;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Column width of `first_name` and `last_name`.
pub const MAX_NAME_LEN: usize = 30;

pub const GOOGLE_PROVIDER: &str = "google";

/// Account record as owned by the user directory.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub is_active: bool,
    pub is_staff: bool,
    /// `None` means the account has no usable password.
    pub password_hash: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Email if present, else phone.
    pub fn identifier(&self) -> &str {
        self.email
            .as_deref()
            .or(self.phone.as_deref())
            .unwrap_or_default()
    }

    /// "First Last" trimmed; falls back to the identifier when no name is set.
    pub fn full_name(&self) -> String {
        if self.first_name.is_none() && self.last_name.is_none() {
            return self.identifier().to_owned();
        }
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_owned()
    }

    pub fn short_name(&self) -> &str {
        match self.first_name.as_deref() {
            Some(first) if !first.is_empty() => first,
            _ => self.identifier(),
        }
    }

    /// Name used to address the user in notifications.
    pub fn display_name(&self) -> String {
        let name = self.full_name();
        if name.is_empty() {
            self.identifier().to_owned()
        } else {
            name
        }
    }

    pub fn age(&self, today: NaiveDate) -> Option<i32> {
        self.date_of_birth.map(|dob| age_on(dob, today))
    }

    pub fn has_usable_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Input to [`crate::domain::repository::UserDirectory::create_user`].
///
/// `password` is the raw secret; the directory hashes it. `None` creates an
/// account without a usable password.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub password: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
}

impl NewUser {
    /// Directory-level invariants: some identifier is set, every set identifier
    /// is well-formed, and every field fits its column.
    pub fn validate(&self) -> Result<(), AccountsError> {
        if self.email.is_none() && self.phone.is_none() {
            return Err(AccountsError::IdentifierRequired);
        }
        if let Some(email) = self.email.as_deref() {
            Identifier::email(email)?;
        }
        if let Some(phone) = self.phone.as_deref() {
            Identifier::phone(phone)?;
        }
        check_max_len(self.first_name.as_deref(), "first_name", MAX_NAME_LEN)?;
        check_max_len(self.last_name.as_deref(), "last_name", MAX_NAME_LEN)?;
        Ok(())
    }
}

/// `FieldTooLong` when `value` has more than `max` characters.
pub fn check_max_len(
    value: Option<&str>,
    field: &'static str,
    max: usize,
) -> Result<(), AccountsError> {
    match value {
        Some(v) if v.chars().count() > max => Err(AccountsError::FieldTooLong(field, max)),
        _ => Ok(()),
    }
}

/// Stored one-time password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp {
    pub id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub code: String,
    pub is_used: bool,
    pub attempt_count: i16,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Otp {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && !self.is_expired_at(now) && self.attempt_count < OTP_MAX_ATTEMPTS
    }

    pub fn is_addressed_to(&self, identifier: &Identifier) -> bool {
        match identifier {
            Identifier::Email(email) => self.email.as_deref() == Some(email),
            Identifier::Phone(phone) => self.phone.as_deref() == Some(phone),
        }
    }

    /// Apply one verification attempt in memory.
    ///
    /// Used/expired is checked first, then the attempt cap; neither mutates.
    /// Otherwise the attempt is counted and a matching code marks the OTP used.
    pub fn attempt(&mut self, submitted: &str, now: DateTime<Utc>) -> VerifyOutcome {
        if self.is_used || self.is_expired_at(now) {
            return VerifyOutcome::Expired;
        }
        if self.attempt_count >= OTP_MAX_ATTEMPTS {
            return VerifyOutcome::MaxAttemptsExceeded;
        }
        self.attempt_count += 1;
        if self.code == submitted {
            self.is_used = true;
            VerifyOutcome::Verified
        } else {
            VerifyOutcome::Invalid {
                remaining: OTP_MAX_ATTEMPTS - self.attempt_count,
            }
        }
    }
}

/// OTP ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewOtp {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Result of one OTP verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    /// Used or past its expiry.
    Expired,
    MaxAttemptsExceeded,
    Invalid { remaining: i16 },
}

impl VerifyOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Verified)
    }

    /// Whether the attempt was counted against the OTP.
    pub fn was_counted(self) -> bool {
        matches!(self, Self::Verified | Self::Invalid { .. })
    }
}

impl fmt::Display for VerifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => f.write_str("OTP verified successfully"),
            Self::Expired => f.write_str("OTP has expired"),
            Self::MaxAttemptsExceeded => f.write_str("Maximum attempts exceeded"),
            Self::Invalid { remaining } => {
                write!(f, "Invalid OTP. Remaining attempts: {remaining}.")
            }
        }
    }
}

/// Link between a local user and an external provider identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialAccount {
    pub id: i64,
    pub user_id: i64,
    pub provider: String,
    pub uid: String,
    pub extra_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSocialAccount {
    pub user_id: i64,
    pub provider: String,
    pub uid: String,
    pub extra_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Profile returned by an identity provider for an access token.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub uid: String,
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    /// Full provider payload, stored on the social account.
    pub raw: serde_json::Value,
}
