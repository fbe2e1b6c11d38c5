//! Domain types shared across Endoville services.
//!
//! Pure types only: no web or database framework dependencies.

pub mod identifier;
pub mod user;
