use chrono::Duration;
use rand::RngExt;

use endoville_domain::identifier::{normalize_email, normalize_phone};

use crate::domain::clock::Clock;
use crate::domain::repository::OtpRepository;
use crate::domain::types::{NewOtp, OTP_LEN, OTP_TTL_SECS, Otp, VerifyOutcome};
use crate::error::AccountsError;

fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..10u32.pow(OTP_LEN as u32));
    format!("{n:0width$}", width = OTP_LEN)
}

/// Issues and checks one-time passwords. At most one live OTP per identifier.
pub struct OtpStore<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    pub repo: R,
    pub clock: C,
}

impl<R, C> OtpStore<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    /// Replace any OTP for the identifier with a fresh 6-digit code.
    pub async fn create(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Otp, AccountsError> {
        let email = email.and_then(normalize_email);
        let phone = phone.and_then(normalize_phone);
        if email.is_none() && phone.is_none() {
            return Err(AccountsError::IdentifierRequired);
        }

        let now = self.clock.now();
        let otp = NewOtp {
            email,
            phone,
            code: generate_code(),
            created_at: now,
            expires_at: now + Duration::seconds(OTP_TTL_SECS),
        };
        self.repo.replace(&otp).await
    }

    /// Apply one attempt to `otp` and refresh it with the persisted state.
    ///
    /// A row deleted in the meantime (replaced or swept) reads as expired.
    pub async fn verify(&self, otp: &mut Otp, code: &str) -> Result<VerifyOutcome, AccountsError> {
        let now = self.clock.now();
        match self.repo.apply_attempt(otp.id, code, now).await? {
            Some((updated, outcome)) => {
                *otp = updated;
                Ok(outcome)
            }
            None => Ok(VerifyOutcome::Expired),
        }
    }

    pub fn is_valid(&self, otp: &Otp) -> bool {
        otp.is_valid_at(self.clock.now())
    }

    pub async fn cleanup_expired(&self) -> Result<u64, AccountsError> {
        let removed = self.repo.delete_expired(self.clock.now()).await?;
        tracing::info!(removed, "expired OTPs removed");
        Ok(removed)
    }
}
