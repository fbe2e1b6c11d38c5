pub mod account;
pub mod google;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use endoville_core::serde::to_rfc3339_ms;
use endoville_domain::user::Gender;

use crate::domain::types::User;
use crate::error::AccountsError;
use crate::usecase::login::LoginOutput;

/// Public view of a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub is_active: bool,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            phone: user.phone,
            first_name: user.first_name,
            last_name: user.last_name,
            gender: user.gender,
            date_of_birth: user.date_of_birth,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserResponse,
}

impl From<LoginOutput> for TokenResponse {
    fn from(out: LoginOutput) -> Self {
        Self {
            access: out.tokens.access,
            refresh: out.tokens.refresh,
            user: out.user.into(),
        }
    }
}

/// A present, non-blank field value.
pub(crate) fn required(value: Option<String>, field: &'static str) -> Result<String, AccountsError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AccountsError::FieldRequired(field)),
    }
}
