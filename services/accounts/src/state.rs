use sea_orm::DatabaseConnection;

use crate::domain::clock::SystemClock;
use crate::infra::db::{DbOtpRepository, DbSocialAccountRepository, DbUserDirectory};
use crate::infra::google::GoogleIdentityProvider;
use crate::infra::mailer::OtpNotifier;
use crate::usecase::credential::CredentialVerifier;
use crate::usecase::identity::IdentityLinker;
use crate::usecase::otp::OtpStore;
use crate::usecase::token::TokenSettings;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub tokens: TokenSettings,
    pub notifier: OtpNotifier,
    pub google: GoogleIdentityProvider,
}

impl AppState {
    pub fn user_directory(&self) -> DbUserDirectory {
        DbUserDirectory {
            db: self.db.clone(),
        }
    }

    pub fn otp_repo(&self) -> DbOtpRepository {
        DbOtpRepository {
            db: self.db.clone(),
        }
    }

    pub fn social_account_repo(&self) -> DbSocialAccountRepository {
        DbSocialAccountRepository {
            db: self.db.clone(),
        }
    }

    pub fn otp_store(&self) -> OtpStore<DbOtpRepository, SystemClock> {
        OtpStore {
            repo: self.otp_repo(),
            clock: SystemClock,
        }
    }

    pub fn credential_verifier(
        &self,
    ) -> CredentialVerifier<DbUserDirectory, DbOtpRepository, SystemClock> {
        CredentialVerifier {
            users: self.user_directory(),
            otps: self.otp_store(),
        }
    }

    pub fn identity_linker(
        &self,
    ) -> IdentityLinker<DbUserDirectory, DbSocialAccountRepository, SystemClock> {
        IdentityLinker {
            users: self.user_directory(),
            social_accounts: self.social_account_repo(),
            clock: SystemClock,
        }
    }
}
