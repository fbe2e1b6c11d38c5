use chrono::Duration;

use endoville_accounts::domain::types::GOOGLE_PROVIDER;
use endoville_accounts::error::AccountsError;
use endoville_accounts::usecase::identity::IdentityLinker;

use crate::helpers::{
    FrozenClock, MockSocialAccountRepo, MockUserDirectory, google_profile, test_now, test_user,
};

fn linker(
    users: MockUserDirectory,
    links: MockSocialAccountRepo,
    clock: FrozenClock,
) -> IdentityLinker<MockUserDirectory, MockSocialAccountRepo, FrozenClock> {
    IdentityLinker {
        users,
        social_accounts: links,
        clock,
    }
}

#[tokio::test]
async fn should_create_active_passwordless_user_on_first_login() {
    let users = MockUserDirectory::empty();
    let links = MockSocialAccountRepo::empty();
    let handle = links.links_handle();
    let l = linker(users.clone(), links, FrozenClock::at(test_now()));

    let profile = google_profile("X@Y.com", "g1");
    let (user, created) = l.link_or_create(&profile).await.unwrap();

    assert!(created);
    assert_eq!(user.email.as_deref(), Some("x@y.com"));
    assert!(user.is_active);
    assert!(!user.is_staff);
    assert!(!user.has_usable_password());
    assert_eq!(user.phone, None);
    assert_eq!(user.first_name.as_deref(), Some("Ada"));
    assert_eq!(user.last_name.as_deref(), Some("Lovelace"));

    let links = handle.lock().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].user_id, user.id);
    assert_eq!(links[0].provider, GOOGLE_PROVIDER);
    assert_eq!(links[0].uid, "g1");
    assert_eq!(links[0].extra_data, profile.raw);
}

#[tokio::test]
async fn should_overwrite_link_on_later_login() {
    let links = MockSocialAccountRepo::empty();
    let handle = links.links_handle();
    let clock = FrozenClock::at(test_now());
    let l = linker(MockUserDirectory::empty(), links, clock.clone());

    let (first, _) = l
        .link_or_create(&google_profile("x@y.com", "g1"))
        .await
        .unwrap();
    clock.advance(Duration::hours(1));
    let (second, created) = l
        .link_or_create(&google_profile("X@Y.COM", "g2"))
        .await
        .unwrap();

    assert!(!created);
    assert_eq!(first.id, second.id);
    let links = handle.lock().unwrap();
    assert_eq!(links.len(), 1, "still one link per (user, provider)");
    assert_eq!(links[0].uid, "g2");
    assert_eq!(links[0].extra_data["id"], "g2");
    assert_eq!(links[0].updated_at, test_now() + Duration::hours(1));
}

#[tokio::test]
async fn should_link_existing_account_by_email() {
    let users = MockUserDirectory::new(vec![test_user()]);
    let handle = users.users_handle();
    let l = linker(
        users,
        MockSocialAccountRepo::empty(),
        FrozenClock::at(test_now()),
    );

    let (user, created) = l
        .link_or_create(&google_profile("user@example.com", "g7"))
        .await
        .unwrap();

    assert!(!created);
    assert_eq!(user.id, test_user().id);
    assert_eq!(handle.lock().unwrap().len(), 1);
    assert_eq!(
        user.password_hash,
        test_user().password_hash,
        "existing password untouched"
    );
}

#[tokio::test]
async fn should_require_email_from_provider() {
    let mut profile = google_profile("x@y.com", "g1");
    profile.email = None;
    let links = MockSocialAccountRepo::empty();
    let handle = links.links_handle();
    let l = linker(MockUserDirectory::empty(), links, FrozenClock::at(test_now()));

    let result = l.link_or_create(&profile).await;

    assert!(
        matches!(result, Err(AccountsError::MissingEmail)),
        "expected MissingEmail, got {result:?}"
    );
    assert!(handle.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_truncate_provider_names_to_column_width() {
    let mut profile = google_profile("x@y.com", "g1");
    profile.given_name = Some("A".repeat(32));
    let l = linker(
        MockUserDirectory::empty(),
        MockSocialAccountRepo::empty(),
        FrozenClock::at(test_now()),
    );

    let (user, created) = l.link_or_create(&profile).await.unwrap();

    assert!(created);
    assert_eq!(user.first_name, Some("A".repeat(30)));
    assert_eq!(user.last_name.as_deref(), Some("Lovelace"));
}
