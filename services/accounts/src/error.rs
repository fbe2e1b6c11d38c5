use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use endoville_domain::identifier::{IdentifierError, MAX_EMAIL_LEN, MAX_PHONE_LEN};

use crate::domain::types::VerifyOutcome;

/// Accounts service error variants.
///
/// Every client-facing variant is scoped to a request field (see [`Self::field`]);
/// errors that belong to no single field use the key `error`.
#[derive(Debug, thiserror::Error)]
pub enum AccountsError {
    #[error("Email is required")]
    EmailRequired,
    #[error("Enter a valid email address.")]
    InvalidEmail,
    #[error(
        "Phone number must be entered in the format: '+1299999999'. Up to 17 digits allowed."
    )]
    InvalidPhone,
    #[error("Either email or phone is required")]
    IdentifierRequired,
    #[error("This field is required.")]
    FieldRequired(&'static str),
    #[error("Ensure this field has no more than 6 characters.")]
    OtpTooLong,
    #[error("Ensure this field has no more than {1} characters.")]
    FieldTooLong(&'static str, usize),
    #[error("\"{0}\" is not a valid choice.")]
    InvalidGender(String),
    #[error("A user with this email already exists.")]
    DuplicateEmail,
    #[error("A user with this phone number already exists.")]
    DuplicatePhone,
    #[error("Ensure this field has at least 8 characters.")]
    PasswordTooShort,
    #[error("User with this email does not exist.")]
    UserNotFound,
    #[error("Invalid email or password.")]
    LoginUserNotFound,
    #[error("Invalid email or password.")]
    BadPassword,
    #[error("Account is not activated. Please activate your account first.")]
    AccountInactive,
    #[error("Account is already activated.")]
    AlreadyActive,
    #[error("No valid OTP found. Please request a new one.")]
    NoOtp,
    #[error("{0}")]
    OtpInvalid(VerifyOutcome),
    #[error("access_token is required")]
    MissingAccessToken,
    #[error("Invalid or expired Google access token")]
    InvalidToken,
    #[error("Email not provided by Google")]
    MissingEmail,
    #[error("Google authentication failed: {0}")]
    ProviderError(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AccountsError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmailRequired => "EMAIL_REQUIRED",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidPhone => "INVALID_PHONE",
            Self::IdentifierRequired => "IDENTIFIER_REQUIRED",
            Self::FieldRequired(_) => "FIELD_REQUIRED",
            Self::OtpTooLong => "OTP_TOO_LONG",
            Self::FieldTooLong(..) => "FIELD_TOO_LONG",
            Self::InvalidGender(_) => "INVALID_GENDER",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::DuplicatePhone => "DUPLICATE_PHONE",
            Self::PasswordTooShort => "PASSWORD_TOO_SHORT",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::LoginUserNotFound | Self::BadPassword => "INVALID_CREDENTIALS",
            Self::AccountInactive => "ACCOUNT_INACTIVE",
            Self::AlreadyActive => "ALREADY_ACTIVE",
            Self::NoOtp => "NO_OTP",
            Self::OtpInvalid(_) => "OTP_INVALID",
            Self::MissingAccessToken => "MISSING_ACCESS_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::MissingEmail => "MISSING_EMAIL",
            Self::ProviderError(_) => "PROVIDER_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Request field the error is reported under.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmailRequired
            | Self::InvalidEmail
            | Self::DuplicateEmail
            | Self::UserNotFound
            | Self::LoginUserNotFound
            | Self::AccountInactive
            | Self::AlreadyActive => "email",
            Self::InvalidPhone | Self::DuplicatePhone => "phone",
            Self::InvalidGender(_) => "gender",
            Self::PasswordTooShort | Self::BadPassword => "password",
            Self::OtpTooLong | Self::NoOtp | Self::OtpInvalid(_) => "otp",
            Self::FieldRequired(field) | Self::FieldTooLong(field, _) => *field,
            Self::IdentifierRequired
            | Self::MissingAccessToken
            | Self::InvalidToken
            | Self::MissingEmail
            | Self::ProviderError(_)
            | Self::Internal(_) => "error",
        }
    }
}

impl From<IdentifierError> for AccountsError {
    fn from(e: IdentifierError) -> Self {
        match e {
            IdentifierError::Missing => Self::IdentifierRequired,
            IdentifierError::InvalidEmail => Self::InvalidEmail,
            IdentifierError::InvalidPhone => Self::InvalidPhone,
            IdentifierError::EmailTooLong => Self::FieldTooLong("email", MAX_EMAIL_LEN),
            IdentifierError::PhoneTooLong => Self::FieldTooLong("phone", MAX_PHONE_LEN),
        }
    }
}

impl IntoResponse for AccountsError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ProviderError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        // 4xx are expected client errors and TraceLayer already records them.
        match &self {
            Self::Internal(e) => tracing::error!(error = ?e, kind = "INTERNAL", "internal error"),
            Self::ProviderError(e) => {
                tracing::error!(error = %e, kind = "PROVIDER_ERROR", "identity provider failure")
            }
            _ => {}
        }
        let mut body = serde_json::Map::new();
        body.insert("kind".to_owned(), self.kind().into());
        body.insert(self.field().to_owned(), self.to_string().into());
        (status, axum::Json(serde_json::Value::Object(body))).into_response()
    }
}
