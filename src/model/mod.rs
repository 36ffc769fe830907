//! Types that represent the core data model: the donation ledger and the expense list.
mod amount;
mod donation;
mod expense;
mod ledger;
mod month;

pub use amount::{Amount, AmountError};
pub use donation::Donation;
pub use expense::{Expense, Expenses};
pub use ledger::{DonationLedger, MonthSummary};
pub use month::{parse_month, MonthKey};

/// Errors for rejected input and invalid positions. Nothing is mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("The donor name must not be empty")]
    EmptyName,

    #[error("The expense description must not be empty")]
    EmptyDescription,

    #[error("'{0}' is not a valid amount")]
    InvalidAmount(String),

    #[error("The amount must be greater than zero, got {0}")]
    NonPositiveAmount(String),

    #[error("'{0}' is not a valid date, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("'{0}' is not a valid month key, expected something like 2024-January")]
    InvalidMonthKey(String),

    #[error("There is no entry at index {index} of {collection}")]
    IndexOutOfRange { collection: String, index: usize },
}

/// Parses a user-supplied amount, rejecting anything that is not a number greater than zero.
///
/// Amounts are limited to two decimal places and must be below `Amount::LIMIT`, so that every
/// stored amount reads back from the JSON files unchanged.
pub(crate) fn parse_positive_amount(s: &str) -> Result<Amount, LedgerError> {
    let invalid = || LedgerError::InvalidAmount(s.trim().to_string());
    let amount: Amount = s.parse().map_err(|_| invalid())?;
    if !amount.is_positive() {
        return Err(LedgerError::NonPositiveAmount(s.trim().to_string()));
    }
    if amount.value().normalize().scale() > 2 || amount >= Amount::LIMIT {
        return Err(invalid());
    }
    Ok(amount)
}

/// Total donations minus total expenses.
pub fn net_balance(ledger: &DonationLedger, expenses: &Expenses) -> Amount {
    ledger.grand_total() - expenses.total()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_positive_amount() {
        assert_eq!(parse_positive_amount("25").unwrap(), Amount::from_str("25").unwrap());
        assert_eq!(
            parse_positive_amount("abc"),
            Err(LedgerError::InvalidAmount("abc".into()))
        );
        assert_eq!(
            parse_positive_amount("0"),
            Err(LedgerError::NonPositiveAmount("0".into()))
        );
        assert_eq!(
            parse_positive_amount("-5"),
            Err(LedgerError::NonPositiveAmount("-5".into()))
        );
    }

    #[test]
    fn test_parse_positive_amount_precision_and_limit() {
        assert!(parse_positive_amount("10.50").is_ok());
        assert!(parse_positive_amount("10.500").is_ok());
        assert!(parse_positive_amount("9,999,999,999,999.99").is_ok());
        for s in [
            "0.125",
            "0.1234567890123456789",
            "10000000000000",
            "12345678901234567.25",
            "79228162514264337593543950335",
        ] {
            assert_eq!(parse_positive_amount(s), Err(LedgerError::InvalidAmount(s.into())));
        }
    }

    #[test]
    fn test_net_balance_both_empty() {
        let net = net_balance(&DonationLedger::default(), &Expenses::default());
        assert_eq!(net, Amount::ZERO);
    }

    #[test]
    fn test_net_balance() {
        let ledger: DonationLedger = serde_json::from_str(
            r#"{"2023-December": [{"name": "A", "amount": 40}],
                "2024-January": [{"name": "B", "amount": 100}, {"name": "C", "amount": 10.5}]}"#,
        )
        .unwrap();
        let expenses: Expenses = serde_json::from_str(
            r#"[{"date": "2024-02-01", "amount": 30, "description": "Rent"},
                {"date": "2024-01-01", "amount": 0.5, "description": "Fee"}]"#,
        )
        .unwrap();
        let net = net_balance(&ledger, &expenses);
        assert_eq!(net, ledger.grand_total() - expenses.total());
        assert_eq!(net, Amount::from_str("120").unwrap());
    }

    #[test]
    fn test_net_balance_can_be_negative() {
        let expenses: Expenses =
            serde_json::from_str(r#"[{"date": "2024-02-01", "amount": 30, "description": "Rent"}]"#)
                .unwrap();
        let net = net_balance(&DonationLedger::default(), &expenses);
        assert!(net.is_negative());
        assert_eq!(net, Amount::from_str("-30").unwrap());
    }
}
