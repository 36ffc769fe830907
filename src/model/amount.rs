//! Amount type for handling monetary values in the ledger files.
//!
//! This module provides the `Amount` type which wraps `Decimal`. The JSON files store amounts as
//! plain numbers, while amounts typed on the command line may carry a `MAD` currency marker and
//! thousands separators.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// The currency marker accepted around typed amounts.
const CURRENCY: &str = "MAD";

/// Represents a monetary amount.
///
/// Equality and ordering are numeric, so `100` and `100.00` are the same amount.
///
/// # Examples
///
/// Parsing with a currency marker and commas:
/// ```
/// # use donation_ledger::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("1,250.50 MAD").unwrap();
/// assert_eq!(amount.to_string(), "1,250.50");
/// ```
///
/// Serializing keeps whole amounts as integers:
/// ```
/// # use donation_ledger::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("100").unwrap();
/// assert_eq!(serde_json::to_string(&amount).unwrap(), "100");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Amounts entered by hand must be below this. Together with the two decimal places this keeps
    /// every accepted amount within the 15 significant digits that survive a JSON round trip.
    pub const LIMIT: Amount = Amount(Decimal::from_parts(1_316_134_912, 2_328, 0, false, 0));

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // Remove the currency marker if present, e.g. "MAD 50" or "50 mad"
        let without_currency = strip_currency(trimmed);

        // Remove commas (thousand separators)
        let without_commas = without_currency.replace(',', "");

        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Ok(Amount(value))
    }
}

fn strip_currency(s: &str) -> &str {
    let upper = s.to_ascii_uppercase();
    if upper.starts_with(CURRENCY) {
        s[CURRENCY.len()..].trim_start()
    } else if upper.ends_with(CURRENCY) {
        s[..s.len() - CURRENCY.len()].trim_end()
    } else {
        s
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.is_negative() {
            ("-", self.0.abs())
        } else {
            ("", self.0)
        };
        write!(
            f,
            "{sign}{}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Whole amounts are written as integers, the way they appear in hand-edited files
        if self.0.fract().is_zero() {
            if let Some(whole) = self.0.to_i64() {
                return serializer.serialize_i64(whole);
            }
        }
        // Parsing the decimal text gives the float nearest to it
        match self.0.to_string().parse::<f64>() {
            Ok(float) if float.is_finite() => serializer.serialize_f64(float),
            _ => Err(serde::ser::Error::custom(format!(
                "amount {} cannot be represented as a JSON number",
                self.0
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Accepts JSON numbers and numeric strings.
struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        // The shortest decimal that reads back as `v` is what the file was written with
        Decimal::from_str(&v.to_string())
            .map(Amount)
            .map_err(|_| E::custom(format!("{v} is not a valid amount")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Add for Amount {
    type Output = Amount;

    /// Saturates at the largest representable amount instead of overflowing.
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.copied().sum()
    }
}
