use crate::model::{parse_positive_amount, Amount, LedgerError};
use serde::{Deserialize, Serialize};

/// A single donation. Replaced wholesale when edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    name: String,
    amount: Amount,
}

impl Donation {
    /// Validates user input and builds a `Donation`. The name is trimmed.
    ///
    /// # Errors
    /// - `LedgerError::EmptyName` if the name is blank
    /// - `LedgerError::InvalidAmount` or `LedgerError::NonPositiveAmount` for a bad amount
    pub fn parse(name: &str, amount: &str) -> Result<Self, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyName);
        }
        let amount = parse_positive_amount(amount)?;
        Ok(Self {
            name: name.to_string(),
            amount,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}
