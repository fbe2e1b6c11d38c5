//! User domain types.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Self-reported gender.
///
/// Wire format: single letter (`M`, `F`, `O`, `N`), same as the stored column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
    #[serde(rename = "N")]
    PreferNotToSay,
}

impl Gender {
    /// Convert from the stored single-letter code. Returns `None` for unknown codes.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            "O" => Some(Self::Other),
            "N" => Some(Self::PreferNotToSay),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Other => "O",
            Self::PreferNotToSay => "N",
        }
    }
}

/// Whole years between `date_of_birth` and `today`.
///
/// The year count only increments once `today` reaches the birthday's month/day.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let before_birthday =
        (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day());
    today.year() - date_of_birth.year() - i32::from(before_birthday)
}
