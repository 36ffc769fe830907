//! The flat expense list.

use crate::model::{parse_positive_amount, Amount, LedgerError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    date: NaiveDate,
    amount: Amount,
    description: String,
}

impl Expense {
    /// Validates user input and builds an `Expense`. The description is trimmed.
    pub fn parse(date: &str, amount: &str, description: &str) -> Result<Self, LedgerError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| LedgerError::InvalidDate(date.trim().to_string()))?;
        let amount = parse_positive_amount(amount)?;
        let description = description.trim();
        if description.is_empty() {
            return Err(LedgerError::EmptyDescription);
        }
        Ok(Self {
            date,
            amount,
            description: description.to_string(),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Expenses, most recent first once any mutation has happened.
///
/// Like `DonationLedger`, mutations return a new list instead of modifying `self`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expenses(Vec<Expense>);

impl Expenses {
    pub fn new(expenses: Vec<Expense>) -> Self {
        Self(expenses)
    }

    pub fn add_expense(&self, expense: Expense) -> Self {
        let mut next = self.0.clone();
        next.push(expense);
        Self::sorted(next)
    }

    pub fn edit_expense(&self, index: usize, expense: Expense) -> Result<Self, LedgerError> {
        let mut next = self.0.clone();
        let slot = next.get_mut(index).ok_or_else(|| out_of_range(index))?;
        *slot = expense;
        Ok(Self::sorted(next))
    }

    pub fn remove_expense(&self, index: usize) -> Result<Self, LedgerError> {
        if index >= self.0.len() {
            return Err(out_of_range(index));
        }
        let mut next = self.0.clone();
        next.remove(index);
        Ok(Self::sorted(next))
    }

    /// Sum of all expense amounts.
    pub fn total(&self) -> Amount {
        self.0.iter().map(Expense::amount).sum()
    }

    pub fn get(&self, index: usize) -> Option<&Expense> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expense> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Descending by date. `sort_by` is stable, so same-day expenses keep their relative order.
    fn sorted(mut expenses: Vec<Expense>) -> Self {
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Self(expenses)
    }
}

fn out_of_range(index: usize) -> LedgerError {
    LedgerError::IndexOutOfRange {
        collection: "expenses".to_string(),
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn expense(date: &str, amount: &str, description: &str) -> Expense {
        Expense::parse(date, amount, description).unwrap()
    }

    fn dates(expenses: &Expenses) -> Vec<String> {
        expenses.iter().map(|e| e.date().to_string()).collect()
    }

    #[test]
    fn test_parse_validates() {
        assert!(matches!(
            Expense::parse("01/02/2024", "5", "x"),
            Err(LedgerError::InvalidDate(_))
        ));
        assert!(matches!(
            Expense::parse("2024-02-30", "5", "x"),
            Err(LedgerError::InvalidDate(_))
        ));
        assert!(matches!(
            Expense::parse("2024-02-01", "-5", "x"),
            Err(LedgerError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            Expense::parse("2024-02-01", "five", "x"),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(
            Expense::parse("2024-02-01", "5", "  "),
            Err(LedgerError::EmptyDescription)
        );
    }

    #[test]
    fn test_add_sorts_descending() {
        let expenses = Expenses::new(vec![
            expense("2024-03-01", "1", "March"),
            expense("2024-02-01", "1", "February"),
        ]);
        let after = expenses.add_expense(expense("2024-01-01", "1", "January"));
        assert_eq!(dates(&after), vec!["2024-03-01", "2024-02-01", "2024-01-01"]);
    }

    #[test]
    fn test_add_newer_goes_first() {
        let expenses = Expenses::default()
            .add_expense(expense("2024-01-01", "1", "a"))
            .add_expense(expense("2024-06-01", "1", "b"))
            .add_expense(expense("2024-03-01", "1", "c"));
        assert_eq!(dates(&expenses), vec!["2024-06-01", "2024-03-01", "2024-01-01"]);
    }

    #[test]
    fn test_sort_is_stable_for_same_day() {
        let expenses = Expenses::default()
            .add_expense(expense("2024-01-01", "1", "first"))
            .add_expense(expense("2024-01-01", "2", "second"))
            .add_expense(expense("2024-01-01", "3", "third"));
        let descriptions: Vec<&str> = expenses.iter().map(Expense::description).collect();
        assert_eq!(descriptions, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_edit_resorts() {
        let expenses = Expenses::default()
            .add_expense(expense("2024-03-01", "1", "a"))
            .add_expense(expense("2024-02-01", "1", "b"));
        let after = expenses
            .edit_expense(1, expense("2024-04-01", "9", "b moved"))
            .unwrap();
        assert_eq!(dates(&after), vec!["2024-04-01", "2024-03-01"]);
        assert_eq!(after.get(0).unwrap().description(), "b moved");
        assert!(expenses.edit_expense(2, expense("2024-04-01", "9", "x")).is_err());
    }

    #[test]
    fn test_remove() {
        let expenses = Expenses::default()
            .add_expense(expense("2024-03-01", "1", "a"))
            .add_expense(expense("2024-02-01", "1", "b"));
        let after = expenses.remove_expense(0).unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after.get(0).unwrap().description(), "b");
        assert_eq!(
            expenses.remove_expense(5),
            Err(LedgerError::IndexOutOfRange {
                collection: "expenses".into(),
                index: 5
            })
        );
    }

    #[test]
    fn test_total_ignores_order() {
        let a = Expenses::new(vec![
            expense("2024-01-01", "10.25", "a"),
            expense("2024-02-01", "4", "b"),
            expense("2024-03-01", "0.75", "c"),
        ]);
        let b = Expenses::new(vec![
            expense("2024-03-01", "0.75", "c"),
            expense("2024-01-01", "10.25", "a"),
            expense("2024-02-01", "4", "b"),
        ]);
        assert_eq!(a.total(), b.total());
        assert_eq!(a.total(), Amount::from_str("15").unwrap());
        assert_eq!(Expenses::default().total(), Amount::ZERO);
    }

    #[test]
    fn test_json_shape() {
        let expenses = Expenses::default().add_expense(expense("2024-01-05", "12.5", "Printing"));
        assert_eq!(
            serde_json::to_string(&expenses).unwrap(),
            r#"[{"date":"2024-01-05","amount":12.5,"description":"Printing"}]"#
        );
    }
}
