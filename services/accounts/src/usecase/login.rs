use crate::domain::clock::Clock;
use crate::domain::repository::{
    IdentityProvider, OtpRepository, SocialAccountRepository, UserDirectory,
};
use crate::domain::types::User;
use crate::error::AccountsError;
use crate::usecase::credential::CredentialVerifier;
use crate::usecase::identity::IdentityLinker;
use crate::usecase::token::{TokenPair, TokenSettings, issue_token_pair};

#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    pub tokens: TokenPair,
}

/// Issue tokens and record the login. A failed `last_login` write is logged only.
async fn complete_login<U, C>(
    users: &U,
    clock: &C,
    settings: &TokenSettings,
    mut user: User,
) -> Result<LoginOutput, AccountsError>
where
    U: UserDirectory,
    C: Clock,
{
    let now = clock.now();
    let tokens = issue_token_pair(&user, settings, now)?;
    match users.touch_last_login(user.id, now).await {
        Ok(()) => user.last_login = Some(now),
        Err(e) => tracing::warn!(user_id = user.id, error = %e, "last_login update failed"),
    }
    Ok(LoginOutput { user, tokens })
}

// ── Password + OTP ───────────────────────────────────────────────────────────

pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub otp: String,
}

pub struct LoginUseCase<U, R, C>
where
    U: UserDirectory,
    R: OtpRepository,
    C: Clock,
{
    pub verifier: CredentialVerifier<U, R, C>,
    pub tokens: TokenSettings,
}

impl<U, R, C> LoginUseCase<U, R, C>
where
    U: UserDirectory,
    R: OtpRepository,
    C: Clock,
{
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, AccountsError> {
        let verified = self
            .verifier
            .authenticate(&input.email, &input.password, &input.otp)
            .await?;
        complete_login(
            &self.verifier.users,
            &self.verifier.otps.clock,
            &self.tokens,
            verified.user,
        )
        .await
    }
}

// ── Google ───────────────────────────────────────────────────────────────────

pub struct GoogleLoginUseCase<P, U, S, C>
where
    P: IdentityProvider,
    U: UserDirectory,
    S: SocialAccountRepository,
    C: Clock,
{
    pub provider: P,
    pub linker: IdentityLinker<U, S, C>,
    pub tokens: TokenSettings,
}

impl<P, U, S, C> GoogleLoginUseCase<P, U, S, C>
where
    P: IdentityProvider,
    U: UserDirectory,
    S: SocialAccountRepository,
    C: Clock,
{
    pub async fn execute(&self, access_token: &str) -> Result<LoginOutput, AccountsError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(AccountsError::MissingAccessToken);
        }

        let profile = self.provider.fetch_profile(access_token).await?;
        let (user, created) = self.linker.link_or_create(&profile).await?;
        tracing::info!(user_id = user.id, created, "google login");

        complete_login(
            &self.linker.users,
            &self.linker.clock,
            &self.tokens,
            user,
        )
        .await
    }
}
