use axum::{Json, extract::State, http::StatusCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::types::OTP_LEN;
use crate::error::AccountsError;
use crate::handlers::{TokenResponse, UserResponse, required};
use crate::state::AppState;
use crate::usecase::account::{
    ActivateUseCase, RegisterInput, RegisterUseCase, RequestOtpUseCase, ResendOtpUseCase,
    SignupInput, SignupUseCase, VerifyOtpUseCase,
};
use crate::usecase::login::{LoginInput, LoginUseCase};

pub const REGISTERED_MESSAGE: &str =
    "Registration successful. Please check your email for OTP to activate your account.";
pub const SIGNED_UP_MESSAGE: &str = "Signup successful.";
pub const ACTIVATED_MESSAGE: &str = "Account activated successfully.";
pub const OTP_SENT_MESSAGE: &str = "OTP has been sent to your email address.";
pub const OTP_REQUESTED_MESSAGE: &str = "OTP has been sent.";

/// Required OTP field: trimmed, at most six characters.
fn otp_field(value: Option<String>) -> Result<String, AccountsError> {
    let code = required(value, "otp")?.trim().to_owned();
    if code.chars().count() > OTP_LEN {
        return Err(AccountsError::OtpTooLong);
    }
    Ok(code)
}

#[derive(Serialize)]
pub struct UserMessageResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ── POST /api/users/register ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserMessageResponse>), AccountsError> {
    let input = RegisterInput {
        email: body.email.unwrap_or_default(),
        first_name: required(body.first_name, "first_name")?,
        last_name: required(body.last_name, "last_name")?,
        password: required(body.password, "password")?,
    };
    let usecase = RegisterUseCase {
        users: state.user_directory(),
        otps: state.otp_store(),
        notifier: state.notifier.clone(),
    };
    let user = usecase.execute(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserMessageResponse {
            message: REGISTERED_MESSAGE,
            user: user.into(),
        }),
    ))
}

// ── POST /api/users/signup ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserMessageResponse>), AccountsError> {
    let usecase = SignupUseCase {
        users: state.user_directory(),
    };
    let user = usecase
        .execute(SignupInput {
            email: body.email,
            phone: body.phone,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            gender: body.gender,
            date_of_birth: body.date_of_birth,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(UserMessageResponse {
            message: SIGNED_UP_MESSAGE,
            user: user.into(),
        }),
    ))
}

// ── POST /api/users/activate ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ActivateRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

pub async fn activate(
    State(state): State<AppState>,
    Json(body): Json<ActivateRequest>,
) -> Result<Json<UserMessageResponse>, AccountsError> {
    let email = body.email.unwrap_or_default();
    let otp = otp_field(body.otp)?;
    let usecase = ActivateUseCase {
        verifier: state.credential_verifier(),
    };
    let user = usecase.execute(&email, &otp).await?;
    Ok(Json(UserMessageResponse {
        message: ACTIVATED_MESSAGE,
        user: user.into(),
    }))
}

// ── POST /api/users/send-otp ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SendOtpRequest {
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct SendOtpResponse {
    pub message: &'static str,
    pub email: Option<String>,
}

pub async fn send_otp(
    State(state): State<AppState>,
    Json(body): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, AccountsError> {
    let usecase = ResendOtpUseCase {
        users: state.user_directory(),
        otps: state.otp_store(),
        notifier: state.notifier.clone(),
    };
    let user = usecase.execute(&body.email.unwrap_or_default()).await?;
    Ok(Json(SendOtpResponse {
        message: OTP_SENT_MESSAGE,
        email: user.email,
    }))
}

// ── POST /api/users/login ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub otp: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AccountsError> {
    let input = LoginInput {
        email: body.email.unwrap_or_default(),
        password: required(body.password, "password")?,
        otp: otp_field(body.otp)?,
    };
    let usecase = LoginUseCase {
        verifier: state.credential_verifier(),
        tokens: state.tokens.clone(),
    };
    let out = usecase.execute(input).await?;
    Ok(Json(out.into()))
}

// ── POST /api/users/request-otp ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RequestOtpRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Serialize)]
pub struct RequestOtpResponse {
    pub message: &'static str,
    pub identifier: String,
}

pub async fn request_otp(
    State(state): State<AppState>,
    Json(body): Json<RequestOtpRequest>,
) -> Result<Json<RequestOtpResponse>, AccountsError> {
    let usecase = RequestOtpUseCase {
        otps: state.otp_store(),
        notifier: state.notifier.clone(),
    };
    let identifier = usecase
        .execute(body.email.as_deref(), body.phone.as_deref())
        .await?;
    Ok(Json(RequestOtpResponse {
        message: OTP_REQUESTED_MESSAGE,
        identifier: identifier.to_string(),
    }))
}

// ── POST /api/users/verify-otp ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub otp: Option<String>,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, AccountsError> {
    let otp = otp_field(body.otp)?;
    let usecase = VerifyOtpUseCase {
        otps: state.otp_store(),
    };
    let outcome = usecase
        .execute(body.email.as_deref(), body.phone.as_deref(), &otp)
        .await?;
    Ok(Json(MessageResponse {
        message: outcome.to_string(),
    }))
}
