use chrono::Duration;

use endoville_accounts::domain::types::{OTP_TTL_SECS, VerifyOutcome};
use endoville_accounts::error::AccountsError;

use crate::helpers::{FrozenClock, MockOtpRepo, otp_store, test_now};

#[tokio::test]
async fn should_create_six_digit_otp_expiring_in_five_minutes() {
    let repo = MockOtpRepo::empty();
    let handle = repo.otps_handle();
    let store = otp_store(repo, FrozenClock::at(test_now()));

    let otp = store.create(Some("  User@Example.COM "), None).await.unwrap();

    assert_eq!(otp.email.as_deref(), Some("user@example.com"));
    assert_eq!(otp.phone, None);
    assert_eq!(otp.code.len(), 6);
    assert!(otp.code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(otp.attempt_count, 0);
    assert!(!otp.is_used);
    assert_eq!(otp.expires_at - otp.created_at, Duration::seconds(OTP_TTL_SECS));
    assert_eq!(handle.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_replace_previous_otp_for_same_identifier() {
    let repo = MockOtpRepo::empty();
    let handle = repo.otps_handle();
    let store = otp_store(repo, FrozenClock::at(test_now()));

    let first = store.create(Some("user@example.com"), None).await.unwrap();
    let second = store.create(Some("USER@example.com"), None).await.unwrap();
    store.create(Some("other@example.com"), None).await.unwrap();

    let otps = handle.lock().unwrap();
    assert_eq!(otps.len(), 2, "one live OTP per identifier");
    assert!(otps.iter().all(|o| o.id != first.id), "first OTP should be gone");
    assert!(otps.iter().any(|o| o.id == second.id));
}

#[tokio::test]
async fn should_issue_otp_for_phone() {
    let store = otp_store(MockOtpRepo::empty(), FrozenClock::at(test_now()));
    let otp = store.create(None, Some(" +12345678901 ")).await.unwrap();
    assert_eq!(otp.phone.as_deref(), Some("+12345678901"));
    assert_eq!(otp.email, None);
}

#[tokio::test]
async fn should_require_an_identifier() {
    let store = otp_store(MockOtpRepo::empty(), FrozenClock::at(test_now()));
    let result = store.create(Some("   "), None).await;
    assert!(
        matches!(result, Err(AccountsError::IdentifierRequired)),
        "expected IdentifierRequired, got {result:?}"
    );
}

#[tokio::test]
async fn should_exhaust_attempts_after_three_wrong_codes() {
    let repo = MockOtpRepo::empty();
    let handle = repo.otps_handle();
    let store = otp_store(repo, FrozenClock::at(test_now()));
    let mut otp = store.create(Some("user@example.com"), None).await.unwrap();
    let wrong = if otp.code == "000000" { "111111" } else { "000000" };

    for expected in [2, 1, 0] {
        let outcome = store.verify(&mut otp, wrong).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Invalid { remaining: expected });
    }
    assert_eq!(otp.attempt_count, 3);

    let right = otp.code.clone();
    let outcome = store.verify(&mut otp, &right).await.unwrap();
    assert_eq!(outcome, VerifyOutcome::MaxAttemptsExceeded);
    assert_eq!(outcome.to_string(), "Maximum attempts exceeded");
    assert_eq!(otp.attempt_count, 3);
    assert_eq!(handle.lock().unwrap()[0].attempt_count, 3, "persisted count");
    assert!(!store.is_valid(&otp));
}

#[tokio::test]
async fn should_fail_expired_otp_without_counting_attempt() {
    let clock = FrozenClock::at(test_now());
    let store = otp_store(MockOtpRepo::empty(), clock.clone());
    let mut otp = store.create(Some("user@example.com"), None).await.unwrap();

    clock.advance(Duration::seconds(OTP_TTL_SECS));
    let code = otp.code.clone();
    let outcome = store.verify(&mut otp, &code).await.unwrap();

    assert_eq!(outcome, VerifyOutcome::Expired);
    assert_eq!(outcome.to_string(), "OTP has expired");
    assert_eq!(otp.attempt_count, 0);
    assert!(!otp.is_used);
}

#[tokio::test]
async fn should_accept_correct_code_once() {
    let repo = MockOtpRepo::empty();
    let handle = repo.otps_handle();
    let store = otp_store(repo, FrozenClock::at(test_now()));
    let mut otp = store.create(Some("user@example.com"), None).await.unwrap();
    let code = otp.code.clone();

    assert_eq!(store.verify(&mut otp, &code).await.unwrap(), VerifyOutcome::Verified);
    assert!(otp.is_used);
    assert!(handle.lock().unwrap()[0].is_used, "used flag persisted");

    assert_eq!(store.verify(&mut otp, &code).await.unwrap(), VerifyOutcome::Expired);
    assert_eq!(otp.attempt_count, 1);
}

#[tokio::test]
async fn should_treat_replaced_otp_as_expired() {
    let store = otp_store(MockOtpRepo::empty(), FrozenClock::at(test_now()));
    let mut stale = store.create(Some("user@example.com"), None).await.unwrap();
    store.create(Some("user@example.com"), None).await.unwrap();

    let code = stale.code.clone();
    let outcome = store.verify(&mut stale, &code).await.unwrap();
    assert_eq!(outcome, VerifyOutcome::Expired);
}

#[tokio::test]
async fn should_remove_only_expired_otps_on_cleanup() {
    let repo = MockOtpRepo::empty();
    let handle = repo.otps_handle();
    let clock = FrozenClock::at(test_now());
    let store = otp_store(repo, clock.clone());

    store.create(Some("old@example.com"), None).await.unwrap();
    clock.advance(Duration::seconds(200));
    store.create(Some("new@example.com"), None).await.unwrap();
    clock.advance(Duration::seconds(100));

    // old expires exactly now, new has 200s left
    assert_eq!(store.cleanup_expired().await.unwrap(), 1);
    let otps = handle.lock().unwrap();
    assert_eq!(otps.len(), 1);
    assert_eq!(otps[0].email.as_deref(), Some("new@example.com"));
}
