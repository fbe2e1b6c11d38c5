pub mod account;
pub mod credential;
pub mod identity;
pub mod login;
pub mod otp;
pub mod token;
