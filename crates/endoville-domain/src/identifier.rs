//! Login identifiers: an email address or a phone number.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Phone numbers: optional `+`, optional leading `1`, then 9 to 17 digits.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?1?\d{9,17}$").expect("phone pattern compiles"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern compiles")
});

/// Column widths of the stored identifiers.
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_PHONE_LEN: usize = 17;

pub const PHONE_FORMAT_MESSAGE: &str =
    "Phone number must be entered in the format: '+1299999999'. Up to 17 digits allowed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("Either email or phone is required")]
    Missing,
    #[error("Enter a valid email address.")]
    InvalidEmail,
    #[error(
        "Phone number must be entered in the format: '+1299999999'. Up to 17 digits allowed."
    )]
    InvalidPhone,
    #[error("Ensure this field has no more than 254 characters.")]
    EmailTooLong,
    #[error("Ensure this field has no more than 17 characters.")]
    PhoneTooLong,
}

/// Trim and lowercase an email. Blank input yields `None`.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    (!email.is_empty()).then_some(email)
}

/// Trim a phone number. Blank input yields `None`.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let phone = raw.trim();
    (!phone.is_empty()).then(|| phone.to_owned())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// The value a user or a pending OTP is addressed by.
///
/// Emails are always stored normalized (trimmed, lowercase); phones are trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Email(String),
    Phone(String),
}

impl Identifier {
    pub fn email(raw: &str) -> Result<Self, IdentifierError> {
        let email = normalize_email(raw).ok_or(IdentifierError::Missing)?;
        if email.chars().count() > MAX_EMAIL_LEN {
            return Err(IdentifierError::EmailTooLong);
        }
        if !is_valid_email(&email) {
            return Err(IdentifierError::InvalidEmail);
        }
        Ok(Self::Email(email))
    }

    pub fn phone(raw: &str) -> Result<Self, IdentifierError> {
        let phone = normalize_phone(raw).ok_or(IdentifierError::Missing)?;
        if phone.chars().count() > MAX_PHONE_LEN {
            return Err(IdentifierError::PhoneTooLong);
        }
        if !is_valid_phone(&phone) {
            return Err(IdentifierError::InvalidPhone);
        }
        Ok(Self::Phone(phone))
    }

    /// Pick an identifier from optional email/phone inputs. Email wins when both
    /// are present; blank strings count as absent.
    pub fn from_parts(email: Option<&str>, phone: Option<&str>) -> Result<Self, IdentifierError> {
        match (
            email.and_then(normalize_email),
            phone.and_then(normalize_phone),
        ) {
            (Some(email), _) => Self::email(&email),
            (None, Some(phone)) => Self::phone(&phone),
            (None, None) => Err(IdentifierError::Missing),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Email(v) | Self::Phone(v) => v,
        }
    }

    pub fn as_email(&self) -> Option<&str> {
        match self {
            Self::Email(v) => Some(v),
            Self::Phone(_) => None,
        }
    }

    pub fn as_phone(&self) -> Option<&str> {
        match self {
            Self::Phone(v) => Some(v),
            Self::Email(_) => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
