use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use endoville_accounts::domain::clock::Clock;
use endoville_accounts::domain::repository::{
    IdentityProvider, NotificationSender, OtpRepository, SocialAccountRepository, UserDirectory,
};
use endoville_accounts::domain::types::{
    NewOtp, NewSocialAccount, NewUser, Otp, ProviderProfile, SocialAccount, User, VerifyOutcome,
};
use endoville_accounts::error::AccountsError;
use endoville_accounts::usecase::credential::CredentialVerifier;
use endoville_accounts::usecase::otp::OtpStore;
use endoville_accounts::usecase::token::TokenSettings;
use endoville_domain::identifier::Identifier;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-unit-tests-only";

pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

pub fn test_token_settings() -> TokenSettings {
    TokenSettings {
        secret: TEST_JWT_SECRET.to_owned(),
        access_ttl_secs: 300,
        refresh_ttl_secs: 86_400,
    }
}

// ── FrozenClock ──────────────────────────────────────────────────────────────

/// Manually advanced clock. Clones share the same instant.
#[derive(Clone)]
pub struct FrozenClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FrozenClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ── MockUserDirectory ────────────────────────────────────────────────────────

/// In-memory directory. Passwords are stored as `test:{raw}` to keep tests fast.
#[derive(Clone)]
pub struct MockUserDirectory {
    pub users: Arc<Mutex<Vec<User>>>,
    next_id: Arc<AtomicI64>,
    pub fail_last_login: bool,
}

impl MockUserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        let max_id = users.iter().map(|u| u.id).max().unwrap_or(0);
        Self {
            users: Arc::new(Mutex::new(users)),
            next_id: Arc::new(AtomicI64::new(max_id + 1)),
            fail_last_login: false,
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Returns a shared handle to the internal user list for post-execution inspection.
    pub fn users_handle(&self) -> Arc<Mutex<Vec<User>>> {
        Arc::clone(&self.users)
    }

    pub fn get(&self, id: i64) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }
}

impl UserDirectory for MockUserDirectory {
    async fn create_user(&self, new: &NewUser) -> Result<User, AccountsError> {
        new.validate()?;
        let mut users = self.users.lock().unwrap();
        if new.email.is_some() && users.iter().any(|u| u.email == new.email) {
            return Err(AccountsError::DuplicateEmail);
        }
        if new.phone.is_some() && users.iter().any(|u| u.phone == new.phone) {
            return Err(AccountsError::DuplicatePhone);
        }
        let now = test_now();
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            email: new.email.clone(),
            phone: new.phone.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            gender: new.gender,
            date_of_birth: new.date_of_birth,
            is_active: new.is_active,
            is_staff: new.is_staff,
            password_hash: new.password.as_deref().map(|p| format!("test:{p}")),
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountsError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn set_password(&self, user_id: i64, raw: Option<&str>) -> Result<(), AccountsError> {
        let mut users = self.users.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == user_id) {
            u.password_hash = raw.map(|p| format!("test:{p}"));
        }
        Ok(())
    }

    async fn activate(&self, user_id: i64) -> Result<User, AccountsError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AccountsError::Internal(anyhow::anyhow!("no user {user_id}")))?;
        user.is_active = true;
        Ok(user.clone())
    }

    async fn touch_last_login(
        &self,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), AccountsError> {
        if self.fail_last_login {
            return Err(AccountsError::Internal(anyhow::anyhow!("db unavailable")));
        }
        let mut users = self.users.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == user_id) {
            u.last_login = Some(at);
        }
        Ok(())
    }

    async fn check_password(&self, user: &User, raw: &str) -> Result<bool, AccountsError> {
        Ok(user.password_hash.as_deref() == Some(format!("test:{raw}").as_str()))
    }
}

// ── MockOtpRepo ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockOtpRepo {
    pub otps: Arc<Mutex<Vec<Otp>>>,
    next_id: Arc<AtomicI64>,
}

impl MockOtpRepo {
    pub fn new(otps: Vec<Otp>) -> Self {
        let max_id = otps.iter().map(|o| o.id).max().unwrap_or(0);
        Self {
            otps: Arc::new(Mutex::new(otps)),
            next_id: Arc::new(AtomicI64::new(max_id + 1)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Returns a shared handle to the internal OTP list for post-execution inspection.
    pub fn otps_handle(&self) -> Arc<Mutex<Vec<Otp>>> {
        Arc::clone(&self.otps)
    }
}

impl OtpRepository for MockOtpRepo {
    async fn replace(&self, otp: &NewOtp) -> Result<Otp, AccountsError> {
        let mut otps = self.otps.lock().unwrap();
        otps.retain(|o| {
            let same_email = otp.email.is_some() && o.email == otp.email;
            let same_phone = otp.phone.is_some() && o.phone == otp.phone;
            !(same_email || same_phone)
        });
        let created = Otp {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            email: otp.email.clone(),
            phone: otp.phone.clone(),
            code: otp.code.clone(),
            is_used: false,
            attempt_count: 0,
            created_at: otp.created_at,
            expires_at: otp.expires_at,
        };
        otps.push(created.clone());
        Ok(created)
    }

    async fn find_latest(
        &self,
        identifier: &Identifier,
        include_used: bool,
    ) -> Result<Option<Otp>, AccountsError> {
        Ok(self
            .otps
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.is_addressed_to(identifier) && (include_used || !o.is_used))
            .max_by_key(|o| (o.created_at, o.id))
            .cloned())
    }

    async fn apply_attempt(
        &self,
        id: i64,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(Otp, VerifyOutcome)>, AccountsError> {
        let mut otps = self.otps.lock().unwrap();
        Ok(otps.iter_mut().find(|o| o.id == id).map(|o| {
            let outcome = o.attempt(submitted, now);
            (o.clone(), outcome)
        }))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AccountsError> {
        let mut otps = self.otps.lock().unwrap();
        let before = otps.len();
        otps.retain(|o| o.expires_at > now);
        Ok((before - otps.len()) as u64)
    }
}

// ── MockSocialAccountRepo ────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockSocialAccountRepo {
    pub links: Arc<Mutex<Vec<SocialAccount>>>,
}

impl MockSocialAccountRepo {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn links_handle(&self) -> Arc<Mutex<Vec<SocialAccount>>> {
        Arc::clone(&self.links)
    }
}

impl SocialAccountRepository for MockSocialAccountRepo {
    async fn find(
        &self,
        user_id: i64,
        provider: &str,
    ) -> Result<Option<SocialAccount>, AccountsError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.user_id == user_id && l.provider == provider)
            .cloned())
    }

    async fn create(&self, new: &NewSocialAccount) -> Result<SocialAccount, AccountsError> {
        let mut links = self.links.lock().unwrap();
        let link = SocialAccount {
            id: links.len() as i64 + 1,
            user_id: new.user_id,
            provider: new.provider.clone(),
            uid: new.uid.clone(),
            extra_data: new.extra_data.clone(),
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        links.push(link.clone());
        Ok(link)
    }

    async fn update(
        &self,
        id: i64,
        uid: &str,
        extra_data: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<SocialAccount, AccountsError> {
        let mut links = self.links.lock().unwrap();
        let link = links
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| AccountsError::Internal(anyhow::anyhow!("no link {id}")))?;
        link.uid = uid.to_owned();
        link.extra_data = extra_data.clone();
        link.updated_at = now;
        Ok(link.clone())
    }
}

// ── MockNotifier ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SentOtp {
    pub to: Identifier,
    pub code: String,
    pub display_name: String,
    pub action: Option<String>,
}

#[derive(Clone)]
pub struct MockNotifier {
    pub sent: Arc<Mutex<Vec<SentOtp>>>,
    pub deliver: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(vec![])),
            deliver: true,
        }
    }

    pub fn failing() -> Self {
        Self {
            deliver: false,
            ..Self::new()
        }
    }

    pub fn sent_handle(&self) -> Arc<Mutex<Vec<SentOtp>>> {
        Arc::clone(&self.sent)
    }
}

impl NotificationSender for MockNotifier {
    async fn send_otp(
        &self,
        to: &Identifier,
        code: &str,
        display_name: &str,
        action: Option<&str>,
    ) -> bool {
        self.sent.lock().unwrap().push(SentOtp {
            to: to.clone(),
            code: code.to_owned(),
            display_name: display_name.to_owned(),
            action: action.map(str::to_owned),
        });
        self.deliver
    }
}

// ── MockIdentityProvider ─────────────────────────────────────────────────────

pub enum MockIdentityProvider {
    Profile(ProviderProfile),
    Rejected,
    Unreachable,
}

impl IdentityProvider for MockIdentityProvider {
    async fn fetch_profile(&self, _access_token: &str) -> Result<ProviderProfile, AccountsError> {
        match self {
            Self::Profile(profile) => Ok(profile.clone()),
            Self::Rejected => Err(AccountsError::InvalidToken),
            Self::Unreachable => Err(AccountsError::ProviderError("connection refused".to_owned())),
        }
    }
}

// ── Test fixture helpers ─────────────────────────────────────────────────────

pub fn test_user() -> User {
    User {
        id: 1,
        email: Some("user@example.com".to_owned()),
        phone: None,
        first_name: Some("Jane".to_owned()),
        last_name: Some("Doe".to_owned()),
        gender: None,
        date_of_birth: None,
        is_active: true,
        is_staff: false,
        password_hash: Some("test:correct-password".to_owned()),
        last_login: None,
        created_at: test_now(),
        updated_at: test_now(),
    }
}

pub fn inactive_user() -> User {
    User {
        is_active: false,
        ..test_user()
    }
}

pub fn test_otp(email: &str, code: &str) -> Otp {
    Otp {
        id: 100,
        email: Some(email.to_owned()),
        phone: None,
        code: code.to_owned(),
        is_used: false,
        attempt_count: 0,
        created_at: test_now(),
        expires_at: test_now() + Duration::seconds(300),
    }
}

pub fn google_profile(email: &str, uid: &str) -> ProviderProfile {
    let raw = serde_json::json!({
        "id": uid,
        "email": email,
        "given_name": "Ada",
        "family_name": "Lovelace",
    });
    ProviderProfile {
        uid: uid.to_owned(),
        email: Some(email.to_owned()),
        given_name: Some("Ada".to_owned()),
        family_name: Some("Lovelace".to_owned()),
        raw,
    }
}

pub fn otp_store(repo: MockOtpRepo, clock: FrozenClock) -> OtpStore<MockOtpRepo, FrozenClock> {
    OtpStore { repo, clock }
}

pub fn verifier(
    users: MockUserDirectory,
    otps: MockOtpRepo,
    clock: FrozenClock,
) -> CredentialVerifier<MockUserDirectory, MockOtpRepo, FrozenClock> {
    CredentialVerifier {
        users,
        otps: otp_store(otps, clock),
    }
}
