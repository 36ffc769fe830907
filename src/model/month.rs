//! The canonical `(year, month)` key of the donation ledger.
//!
//! Ledger files in the wild contain keys like `2024-January` and `2024-يناير` for the same month.
//! `MonthKey` parses every variant and always writes the English form.

use crate::model::LedgerError;
use chrono::Month;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Arabic month names, January first.
const ARABIC_MONTHS: [&str; 12] = [
    "يناير",
    "فبراير",
    "مارس",
    "أبريل",
    "مايو",
    "يونيو",
    "يوليو",
    "أغسطس",
    "سبتمبر",
    "أكتوبر",
    "نوفمبر",
    "ديسمبر",
];

/// Identifies one month of one year. Ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    /// 1-based month number.
    month: u32,
}

impl MonthKey {
    /// Creates a key from a year and a 1-based month number.
    pub fn new(year: i32, month: u32) -> Result<Self, LedgerError> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidMonthKey(format!("{year}-{month}")));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The 1-based month number.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The English month name, e.g. `January`.
    pub fn month_name(&self) -> &'static str {
        self.chrono_month().name()
    }

    /// The Arabic month name, e.g. `يناير`.
    pub fn arabic_name(&self) -> &'static str {
        ARABIC_MONTHS[self.month as usize - 1]
    }

    fn chrono_month(&self) -> Month {
        // month is validated to 1..=12 on construction
        Month::try_from(self.month as u8).unwrap_or(Month::January)
    }
}

/// Parses a month given as an English name (full or abbreviated, any case), an Arabic name, or a
/// number from 1 to 12.
pub fn parse_month(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Some(ix) = ARABIC_MONTHS.iter().position(|name| *name == s) {
        return Some(ix as u32 + 1);
    }
    if let Ok(number) = s.parse::<u32>() {
        return (1..=12).contains(&number).then_some(number);
    }
    s.parse::<Month>().ok().map(|m| m.number_from_month())
}

impl FromStr for MonthKey {
    type Err = LedgerError;

    /// Parses `<year>-<month>`, where month is anything `parse_month` accepts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidMonthKey(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.trim().parse::<i32>().map_err(|_| invalid())?;
        let month = parse_month(month).ok_or_else(invalid)?;
        MonthKey::new(year, month)
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.year, self.month_name())
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MonthKey::from_str(&s).map_err(serde::de::Error::custom)
    }
}
