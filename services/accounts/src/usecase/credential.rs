use endoville_domain::identifier::{Identifier, IdentifierError};

use crate::domain::clock::Clock;
use crate::domain::repository::{OtpRepository, UserDirectory};
use crate::domain::types::{Otp, User};
use crate::error::AccountsError;
use crate::usecase::otp::OtpStore;

/// Parse a required email field. Blank input is `EmailRequired`.
pub fn parse_email(raw: &str) -> Result<Identifier, AccountsError> {
    Identifier::email(raw).map_err(|e| match e {
        IdentifierError::Missing => AccountsError::EmailRequired,
        other => other.into(),
    })
}

/// A user together with the OTP that was just consumed for them.
#[derive(Debug)]
pub struct VerifiedCredentials {
    pub user: User,
    pub otp: Otp,
}

pub struct CredentialVerifier<U, R, C>
where
    U: UserDirectory,
    R: OtpRepository,
    C: Clock,
{
    pub users: U,
    pub otps: OtpStore<R, C>,
}

impl<U, R, C> CredentialVerifier<U, R, C>
where
    U: UserDirectory,
    R: OtpRepository,
    C: Clock,
{
    /// The unused OTP for `identifier`, or the latest one at all when `allow_used`.
    pub async fn resolve_otp(
        &self,
        identifier: &Identifier,
        allow_used: bool,
    ) -> Result<Otp, AccountsError> {
        self.otps
            .repo
            .find_latest(identifier, allow_used)
            .await?
            .ok_or(AccountsError::NoOtp)
    }

    /// Consume one attempt on the identifier's OTP; anything but a match is `OtpInvalid`.
    pub async fn consume_otp(
        &self,
        identifier: &Identifier,
        code: &str,
    ) -> Result<Otp, AccountsError> {
        let mut otp = self.resolve_otp(identifier, false).await?;
        let outcome = self.otps.verify(&mut otp, code).await?;
        if !outcome.is_success() {
            return Err(AccountsError::OtpInvalid(outcome));
        }
        Ok(otp)
    }

    /// Password + OTP login check.
    ///
    /// The password is checked before the OTP is looked up, so a wrong
    /// password never spends an attempt.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        code: &str,
    ) -> Result<VerifiedCredentials, AccountsError> {
        let identifier = parse_email(email)?;
        let user = self
            .users
            .find_by_email(identifier.as_str())
            .await?
            .ok_or(AccountsError::LoginUserNotFound)?;

        if !user.is_active {
            return Err(AccountsError::AccountInactive);
        }
        if !self.users.check_password(&user, password).await? {
            return Err(AccountsError::BadPassword);
        }

        let otp = self.consume_otp(&identifier, code).await?;
        Ok(VerifiedCredentials { user, otp })
    }

    /// Check an activation request. Leaves `is_active` untouched.
    pub async fn activate(
        &self,
        email: &str,
        code: &str,
    ) -> Result<VerifiedCredentials, AccountsError> {
        let identifier = parse_email(email)?;
        let user = self
            .users
            .find_by_email(identifier.as_str())
            .await?
            .ok_or(AccountsError::UserNotFound)?;

        if user.is_active {
            return Err(AccountsError::AlreadyActive);
        }

        let otp = self.consume_otp(&identifier, code).await?;
        Ok(VerifiedCredentials { user, otp })
    }
}
