use endoville_domain::identifier::normalize_email;

use crate::domain::clock::Clock;
use crate::domain::repository::{SocialAccountRepository, UserDirectory};
use crate::domain::types::{
    GOOGLE_PROVIDER, MAX_NAME_LEN, NewSocialAccount, NewUser, ProviderProfile, User,
};
use crate::error::AccountsError;

/// Truncate a provider-supplied name to the column width.
fn fit_name(name: &str) -> String {
    name.chars().take(MAX_NAME_LEN).collect()
}

/// Reconciles a Google profile with a local user and its social link.
pub struct IdentityLinker<U, S, C>
where
    U: UserDirectory,
    S: SocialAccountRepository,
    C: Clock,
{
    pub users: U,
    pub social_accounts: S,
    pub clock: C,
}

impl<U, S, C> IdentityLinker<U, S, C>
where
    U: UserDirectory,
    S: SocialAccountRepository,
    C: Clock,
{
    /// Returns the user and whether it was created by this call.
    pub async fn link_or_create(
        &self,
        profile: &ProviderProfile,
    ) -> Result<(User, bool), AccountsError> {
        let email = profile
            .email
            .as_deref()
            .and_then(normalize_email)
            .ok_or(AccountsError::MissingEmail)?;

        let (user, created) = match self.users.find_by_email(&email).await? {
            Some(user) => (user, false),
            None => self.create_user(&email, profile).await?,
        };

        let now = self.clock.now();
        match self.social_accounts.find(user.id, GOOGLE_PROVIDER).await? {
            Some(link) => {
                self.social_accounts
                    .update(link.id, &profile.uid, &profile.raw, now)
                    .await?;
            }
            None => {
                self.social_accounts
                    .create(&NewSocialAccount {
                        user_id: user.id,
                        provider: GOOGLE_PROVIDER.to_owned(),
                        uid: profile.uid.clone(),
                        extra_data: profile.raw.clone(),
                        created_at: now,
                    })
                    .await?;
            }
        }

        Ok((user, created))
    }

    async fn create_user(
        &self,
        email: &str,
        profile: &ProviderProfile,
    ) -> Result<(User, bool), AccountsError> {
        let new = NewUser {
            email: Some(email.to_owned()),
            first_name: profile.given_name.as_deref().map(fit_name),
            last_name: profile.family_name.as_deref().map(fit_name),
            is_active: true,
            ..Default::default()
        };
        match self.users.create_user(&new).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "user created from google profile");
                Ok((user, true))
            }
            // Lost a race with a concurrent first login for the same email.
            Err(AccountsError::DuplicateEmail) => {
                let user = self
                    .users
                    .find_by_email(email)
                    .await?
                    .ok_or(AccountsError::DuplicateEmail)?;
                Ok((user, false))
            }
            Err(e) => Err(e),
        }
    }
}
