use chrono::NaiveDate;

use endoville_domain::identifier::Identifier;
use endoville_domain::user::Gender;

use crate::domain::clock::Clock;
use crate::domain::repository::{NotificationSender, OtpRepository, UserDirectory};
use crate::domain::types::{
    MAX_NAME_LEN, MIN_PASSWORD_LEN, NewUser, User, VerifyOutcome, check_max_len,
};
use crate::error::AccountsError;
use crate::usecase::credential::{CredentialVerifier, parse_email};
use crate::usecase::otp::OtpStore;

pub const ACTIVATION_ACTION: &str = "Activate your account?";

/// Recipient name when no account is attached to the identifier.
pub const ANONYMOUS_RECIPIENT: &str = "User";

fn require_text(value: &str, field: &'static str) -> Result<String, AccountsError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AccountsError::FieldRequired(field));
    }
    Ok(value.to_owned())
}

// ── Register ─────────────────────────────────────────────────────────────────

pub struct RegisterInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

pub struct RegisterUseCase<U, R, C, N>
where
    U: UserDirectory,
    R: OtpRepository,
    C: Clock,
    N: NotificationSender,
{
    pub users: U,
    pub otps: OtpStore<R, C>,
    pub notifier: N,
}

impl<U, R, C, N> RegisterUseCase<U, R, C, N>
where
    U: UserDirectory,
    R: OtpRepository,
    C: Clock,
    N: NotificationSender,
{
    /// Create an inactive account and mail its activation OTP.
    ///
    /// A failed delivery is logged; the account stays and `send-otp` can retry.
    pub async fn execute(&self, input: RegisterInput) -> Result<User, AccountsError> {
        let identifier = parse_email(&input.email)?;
        let first_name = require_text(&input.first_name, "first_name")?;
        let last_name = require_text(&input.last_name, "last_name")?;
        check_max_len(Some(&first_name), "first_name", MAX_NAME_LEN)?;
        check_max_len(Some(&last_name), "last_name", MAX_NAME_LEN)?;
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountsError::PasswordTooShort);
        }
        if self.users.find_by_email(identifier.as_str()).await?.is_some() {
            return Err(AccountsError::DuplicateEmail);
        }

        let user = self
            .users
            .create_user(&NewUser {
                email: Some(identifier.as_str().to_owned()),
                first_name: Some(first_name),
                last_name: Some(last_name),
                password: Some(input.password),
                is_active: false,
                is_staff: false,
                ..Default::default()
            })
            .await?;
        tracing::info!(user_id = user.id, "user registered");

        let otp = self.otps.create(identifier.as_email(), None).await?;
        let delivered = self
            .notifier
            .send_otp(&identifier, &otp.code, &user.display_name(), Some(ACTIVATION_ACTION))
            .await;
        if !delivered {
            tracing::warn!(user_id = user.id, "activation OTP delivery failed");
        }
        Ok(user)
    }
}

// ── Signup ───────────────────────────────────────────────────────────────────

/// Direct signup by email and/or phone. Every other field is optional.
#[derive(Debug, Default)]
pub struct SignupInput {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Single-letter code (`M`, `F`, `O`, `N`).
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

pub struct SignupUseCase<U>
where
    U: UserDirectory,
{
    pub users: U,
}

impl<U> SignupUseCase<U>
where
    U: UserDirectory,
{
    /// Create an active account. Without a password the account can only be
    /// reached through OTP or Google login until one is set.
    pub async fn execute(&self, input: SignupInput) -> Result<User, AccountsError> {
        let email = optional_text(input.email)
            .map(|raw| Identifier::email(&raw))
            .transpose()?;
        let phone = optional_text(input.phone)
            .map(|raw| Identifier::phone(&raw))
            .transpose()?;
        if email.is_none() && phone.is_none() {
            return Err(AccountsError::IdentifierRequired);
        }

        let password = input.password.filter(|p| !p.is_empty());
        if password
            .as_deref()
            .is_some_and(|p| p.chars().count() < MIN_PASSWORD_LEN)
        {
            return Err(AccountsError::PasswordTooShort);
        }
        let gender = match optional_text(input.gender) {
            Some(code) => Some(
                Gender::from_code(&code).ok_or(AccountsError::InvalidGender(code))?,
            ),
            None => None,
        };

        let user = self
            .users
            .create_user(&NewUser {
                email: email.and_then(|id| id.as_email().map(str::to_owned)),
                phone: phone.and_then(|id| id.as_phone().map(str::to_owned)),
                first_name: optional_text(input.first_name),
                last_name: optional_text(input.last_name),
                gender,
                date_of_birth: input.date_of_birth,
                password,
                is_active: true,
                is_staff: false,
            })
            .await?;
        tracing::info!(
            user_id = user.id,
            has_password = user.has_usable_password(),
            "user signed up"
        );
        Ok(user)
    }
}

// ── Resend ───────────────────────────────────────────────────────────────────

pub struct ResendOtpUseCase<U, R, C, N>
where
    U: UserDirectory,
    R: OtpRepository,
    C: Clock,
    N: NotificationSender,
{
    pub users: U,
    pub otps: OtpStore<R, C>,
    pub notifier: N,
}

impl<U, R, C, N> ResendOtpUseCase<U, R, C, N>
where
    U: UserDirectory,
    R: OtpRepository,
    C: Clock,
    N: NotificationSender,
{
    /// Issue and send a new OTP for an existing account, active or not.
    pub async fn execute(&self, email: &str) -> Result<User, AccountsError> {
        let identifier = parse_email(email)?;
        let user = self
            .users
            .find_by_email(identifier.as_str())
            .await?
            .ok_or(AccountsError::UserNotFound)?;
        if user.is_active {
            tracing::info!(user_id = user.id, "OTP resent for already active account");
        }

        let otp = self.otps.create(identifier.as_email(), None).await?;
        let delivered = self
            .notifier
            .send_otp(&identifier, &otp.code, &user.display_name(), None)
            .await;
        if !delivered {
            tracing::warn!(user_id = user.id, "OTP delivery failed");
        }
        Ok(user)
    }
}

// ── Activate ─────────────────────────────────────────────────────────────────

pub struct ActivateUseCase<U, R, C>
where
    U: UserDirectory,
    R: OtpRepository,
    C: Clock,
{
    pub verifier: CredentialVerifier<U, R, C>,
}

impl<U, R, C> ActivateUseCase<U, R, C>
where
    U: UserDirectory,
    R: OtpRepository,
    C: Clock,
{
    pub async fn execute(&self, email: &str, code: &str) -> Result<User, AccountsError> {
        let verified = self.verifier.activate(email, code).await?;
        let user = self.verifier.users.activate(verified.user.id).await?;
        tracing::info!(user_id = user.id, "account activated");
        Ok(user)
    }
}

// ── Request / verify OTP ─────────────────────────────────────────────────────

pub struct RequestOtpUseCase<R, C, N>
where
    R: OtpRepository,
    C: Clock,
    N: NotificationSender,
{
    pub otps: OtpStore<R, C>,
    pub notifier: N,
}

impl<R, C, N> RequestOtpUseCase<R, C, N>
where
    R: OtpRepository,
    C: Clock,
    N: NotificationSender,
{
    /// Issue an OTP for any email or phone. No account is required.
    pub async fn execute(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Identifier, AccountsError> {
        let identifier = Identifier::from_parts(email, phone)?;
        let otp = self
            .otps
            .create(identifier.as_email(), identifier.as_phone())
            .await?;
        let delivered = self
            .notifier
            .send_otp(&identifier, &otp.code, ANONYMOUS_RECIPIENT, None)
            .await;
        if !delivered {
            tracing::warn!("requested OTP delivery failed");
        }
        Ok(identifier)
    }
}

pub struct VerifyOtpUseCase<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    pub otps: OtpStore<R, C>,
}

impl<R, C> VerifyOtpUseCase<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    /// Spend one attempt on the identifier's unused OTP. Touches no user.
    pub async fn execute(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        code: &str,
    ) -> Result<VerifyOutcome, AccountsError> {
        let identifier = Identifier::from_parts(email, phone)?;
        let mut otp = self
            .otps
            .repo
            .find_latest(&identifier, false)
            .await?
            .ok_or(AccountsError::NoOtp)?;
        let outcome = self.otps.verify(&mut otp, code).await?;
        if !outcome.is_success() {
            return Err(AccountsError::OtpInvalid(outcome));
        }
        Ok(outcome)
    }
}
