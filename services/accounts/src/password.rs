//! Argon2id password hashing.
//!
//! Hashing and verification are CPU-bound, so both run on the blocking pool.

use anyhow::{Context as _, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

fn hash_blocking(raw: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map_err(|e| anyhow!("hash password: {e}"))?;
    Ok(hash.to_string())
}

fn verify_blocking(stored: &str, raw: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(raw.as_bytes(), &parsed)
        .is_ok()
}

pub async fn hash_password(raw: &str) -> anyhow::Result<String> {
    let raw = raw.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&raw))
        .await
        .context("password hashing task")?
}

/// Check `raw` against a stored PHC string. A missing or unparsable hash never matches.
pub async fn verify_password(stored: Option<&str>, raw: &str) -> anyhow::Result<bool> {
    let Some(stored) = stored else {
        return Ok(false);
    };
    let (stored, raw) = (stored.to_owned(), raw.to_owned());
    tokio::task::spawn_blocking(move || verify_blocking(&stored, &raw))
        .await
        .context("password verification task")
}
