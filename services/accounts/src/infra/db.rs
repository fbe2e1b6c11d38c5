use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DbBackend, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    SqlErr, Statement, TransactionTrait,
};

use endoville_accounts_schema::{otps, social_accounts, users};
use endoville_domain::identifier::Identifier;
use endoville_domain::user::Gender;

use crate::domain::repository::{OtpRepository, SocialAccountRepository, UserDirectory};
use crate::domain::types::{
    NewOtp, NewSocialAccount, NewUser, Otp, SocialAccount, User, VerifyOutcome,
};
use crate::error::AccountsError;
use crate::password::hash_password;

// ── User directory ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserDirectory {
    pub db: DatabaseConnection,
}

impl UserDirectory for DbUserDirectory {
    async fn create_user(&self, new: &NewUser) -> Result<User, AccountsError> {
        new.validate()?;
        let password_hash = match new.password.as_deref() {
            Some(raw) => Some(hash_password(raw).await?),
            None => None,
        };
        let now = Utc::now();
        let model = users::ActiveModel {
            email: Set(new.email.clone()),
            phone: Set(new.phone.clone()),
            first_name: Set(new.first_name.clone()),
            last_name: Set(new.last_name.clone()),
            gender: Set(new.gender.map(|g| g.as_code().to_owned())),
            date_of_birth: Set(new.date_of_birth),
            is_active: Set(new.is_active),
            is_staff: Set(new.is_staff),
            password_hash: Set(password_hash),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(user_insert_error)?;
        Ok(user_from_model(model))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountsError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn set_password(&self, user_id: i64, raw: Option<&str>) -> Result<(), AccountsError> {
        let password_hash = match raw {
            Some(raw) => Some(hash_password(raw).await?),
            None => None,
        };
        users::ActiveModel {
            id: Set(user_id),
            password_hash: Set(password_hash),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set user password")?;
        Ok(())
    }

    async fn activate(&self, user_id: i64) -> Result<User, AccountsError> {
        let model = users::ActiveModel {
            id: Set(user_id),
            is_active: Set(true),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("activate user")?;
        Ok(user_from_model(model))
    }

    async fn touch_last_login(
        &self,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), AccountsError> {
        users::ActiveModel {
            id: Set(user_id),
            last_login: Set(Some(at)),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("touch last_login")?;
        Ok(())
    }
}

/// The unique index is authoritative for duplicates; the pre-check in
/// registration only gives the fast path.
fn user_insert_error(err: DbErr) -> AccountsError {
    match user_conflict(err.sql_err()) {
        Some(conflict) => conflict,
        None => AccountsError::Internal(anyhow::Error::new(err).context("insert user")),
    }
}

/// Postgres names the constraints `users_email_key` and `users_phone_key`.
fn user_conflict(sql_err: Option<SqlErr>) -> Option<AccountsError> {
    match sql_err? {
        SqlErr::UniqueConstraintViolation(msg) if msg.contains("phone") => {
            Some(AccountsError::DuplicatePhone)
        }
        SqlErr::UniqueConstraintViolation(_) => Some(AccountsError::DuplicateEmail),
        _ => None,
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        phone: model.phone,
        first_name: model.first_name,
        last_name: model.last_name,
        gender: model.gender.as_deref().and_then(Gender::from_code),
        date_of_birth: model.date_of_birth,
        is_active: model.is_active,
        is_staff: model.is_staff,
        password_hash: model.password_hash,
        last_login: model.last_login,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── OTP repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOtpRepository {
    pub db: DatabaseConnection,
}

/// Advisory lock keys for every identifier the OTP is addressed to, sorted so
/// concurrent writers acquire them in the same order.
fn otp_lock_keys(otp: &NewOtp) -> Vec<String> {
    let mut keys: Vec<String> = otp
        .email
        .iter()
        .map(|email| format!("otp:email:{email}"))
        .chain(otp.phone.iter().map(|phone| format!("otp:phone:{phone}")))
        .collect();
    keys.sort();
    keys
}

fn identifier_condition(identifier: &Identifier) -> Condition {
    match identifier {
        Identifier::Email(email) => Condition::all().add(otps::Column::Email.eq(email.as_str())),
        Identifier::Phone(phone) => Condition::all().add(otps::Column::Phone.eq(phone.as_str())),
    }
}

impl OtpRepository for DbOtpRepository {
    async fn replace(&self, otp: &NewOtp) -> Result<Otp, AccountsError> {
        let mut addressed = Condition::any();
        if let Some(email) = &otp.email {
            addressed = addressed.add(otps::Column::Email.eq(email.as_str()));
        }
        if let Some(phone) = &otp.phone {
            addressed = addressed.add(otps::Column::Phone.eq(phone.as_str()));
        }
        if addressed.is_empty() {
            return Err(AccountsError::IdentifierRequired);
        }

        let model = self
            .db
            .transaction::<_, otps::Model, DbErr>(|txn| {
                let otp = otp.clone();
                Box::pin(async move {
                    // Serializes concurrent replacements for the same identifier; the
                    // lock is released on commit or rollback.
                    for key in otp_lock_keys(&otp) {
                        txn.execute(Statement::from_sql_and_values(
                            DbBackend::Postgres,
                            "SELECT pg_advisory_xact_lock(hashtext($1))",
                            [key.into()],
                        ))
                        .await?;
                    }
                    otps::Entity::delete_many()
                        .filter(addressed)
                        .exec(txn)
                        .await?;
                    otps::ActiveModel {
                        email: Set(otp.email),
                        phone: Set(otp.phone),
                        code: Set(otp.code),
                        is_used: Set(false),
                        attempt_count: Set(0),
                        created_at: Set(otp.created_at),
                        expires_at: Set(otp.expires_at),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                })
            })
            .await
            .context("replace otp")?;
        Ok(otp_from_model(model))
    }

    async fn find_latest(
        &self,
        identifier: &Identifier,
        include_used: bool,
    ) -> Result<Option<Otp>, AccountsError> {
        let mut query = otps::Entity::find().filter(identifier_condition(identifier));
        if !include_used {
            query = query.filter(otps::Column::IsUsed.eq(false));
        }
        let model = query
            .order_by_desc(otps::Column::CreatedAt)
            .order_by_desc(otps::Column::Id)
            .one(&self.db)
            .await
            .context("find latest otp")?;
        Ok(model.map(otp_from_model))
    }

    async fn apply_attempt(
        &self,
        id: i64,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(Otp, VerifyOutcome)>, AccountsError> {
        let result = self
            .db
            .transaction::<_, Option<(Otp, VerifyOutcome)>, DbErr>(move |txn| {
                let submitted = submitted.to_owned();
                Box::pin(async move {
                    // Row lock serializes concurrent attempts on the same OTP.
                    let Some(model) = otps::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await?
                    else {
                        return Ok(None);
                    };
                    let mut otp = otp_from_model(model);
                    let outcome = otp.attempt(&submitted, now);
                    if outcome.was_counted() {
                        otps::ActiveModel {
                            id: Set(otp.id),
                            is_used: Set(otp.is_used),
                            attempt_count: Set(otp.attempt_count),
                            ..Default::default()
                        }
                        .update(txn)
                        .await?;
                    }
                    Ok(Some((otp, outcome)))
                })
            })
            .await
            .context("apply otp attempt")?;
        Ok(result)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AccountsError> {
        let result = otps::Entity::delete_many()
            .filter(otps::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await
            .context("delete expired otps")?;
        Ok(result.rows_affected)
    }
}

fn otp_from_model(model: otps::Model) -> Otp {
    Otp {
        id: model.id,
        email: model.email,
        phone: model.phone,
        code: model.code,
        is_used: model.is_used,
        attempt_count: model.attempt_count,
        created_at: model.created_at,
        expires_at: model.expires_at,
    }
}

// ── Social account repository ────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSocialAccountRepository {
    pub db: DatabaseConnection,
}

impl SocialAccountRepository for DbSocialAccountRepository {
    async fn find(
        &self,
        user_id: i64,
        provider: &str,
    ) -> Result<Option<SocialAccount>, AccountsError> {
        let model = social_accounts::Entity::find()
            .filter(social_accounts::Column::UserId.eq(user_id))
            .filter(social_accounts::Column::Provider.eq(provider))
            .one(&self.db)
            .await
            .context("find social account")?;
        Ok(model.map(social_account_from_model))
    }

    async fn create(&self, new: &NewSocialAccount) -> Result<SocialAccount, AccountsError> {
        let model = social_accounts::ActiveModel {
            user_id: Set(new.user_id),
            provider: Set(new.provider.clone()),
            uid: Set(new.uid.clone()),
            extra_data: Set(new.extra_data.clone()),
            created_at: Set(new.created_at),
            updated_at: Set(new.created_at),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("create social account")?;
        Ok(social_account_from_model(model))
    }

    async fn update(
        &self,
        id: i64,
        uid: &str,
        extra_data: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<SocialAccount, AccountsError> {
        let model = social_accounts::ActiveModel {
            id: Set(id),
            uid: Set(uid.to_owned()),
            extra_data: Set(extra_data.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update social account")?;
        Ok(social_account_from_model(model))
    }
}

fn social_account_from_model(model: social_accounts::Model) -> SocialAccount {
    SocialAccount {
        id: model.id,
        user_id: model.user_id,
        provider: model.provider,
        uid: model.uid,
        extra_data: model.extra_data,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
