//! sea-orm entities for the accounts service database.

pub mod otps;
pub mod social_accounts;
pub mod users;
