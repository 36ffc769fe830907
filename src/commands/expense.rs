use crate::app::App;
use crate::args::{ExpenseArgs, ExpenseEditArgs, IndexArgs};
use crate::commands::{settle, Out, Saved};
use crate::model::{Amount, Expense, Expenses};
use crate::store::CollectionKind;
use crate::Result;
use serde::Serialize;
use std::fmt::Write;

/// The expense list after a change.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseChange {
    pub count: usize,
    pub total: Amount,
    pub saved: Saved,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseList {
    pub expenses: Vec<Expense>,
    pub total: Amount,
}

pub async fn expense_add(app: &App, args: &ExpenseArgs) -> Result<Out<ExpenseChange>> {
    app.require_admin()?;
    let expense = parse(args)?;
    let expenses: Expenses = app.persistence().current().await;
    let next = expenses.add_expense(expense);
    let saved = settle(CollectionKind::Expenses, app.persistence().save(&next).await)?;
    Ok(change(&next, saved, "Added an expense"))
}

pub async fn expense_edit(app: &App, args: &ExpenseEditArgs) -> Result<Out<ExpenseChange>> {
    app.require_admin()?;
    let expense = parse(args.expense())?;
    let expenses: Expenses = app.persistence().current().await;
    let next = expenses.edit_expense(args.index(), expense)?;
    let saved = settle(CollectionKind::Expenses, app.persistence().save(&next).await)?;
    Ok(change(&next, saved, "Updated an expense"))
}

pub async fn expense_remove(app: &App, args: &IndexArgs) -> Result<Out<ExpenseChange>> {
    app.require_admin()?;
    let expenses: Expenses = app.persistence().current().await;
    let next = expenses.remove_expense(args.index())?;
    let saved = settle(CollectionKind::Expenses, app.persistence().save(&next).await)?;
    Ok(change(&next, saved, "Removed an expense"))
}

/// Lists the expenses in stored order with the index that `edit` and `remove` take.
pub async fn expense_list(app: &App) -> Result<Out<ExpenseList>> {
    let expenses: Expenses = app.persistence().current().await;
    let total = expenses.total();
    let mut message = String::new();
    for (i, e) in expenses.iter().enumerate() {
        let _ = writeln!(
            message,
            "[{i}] {} {}: {}",
            e.date(),
            e.description(),
            e.amount()
        );
    }
    let _ = write!(message, "Total: {total}");
    Ok(Out::new(
        message,
        ExpenseList {
            expenses: expenses.iter().cloned().collect(),
            total,
        },
    ))
}

fn parse(args: &ExpenseArgs) -> Result<Expense> {
    Ok(Expense::parse(
        args.date(),
        args.amount(),
        args.description(),
    )?)
}

fn change(expenses: &Expenses, saved: Saved, what: &str) -> Out<ExpenseChange> {
    let total = expenses.total();
    Out::new(
        format!(
            "{what}, the expense total is now {total} ({})",
            saved.describe()
        ),
        ExpenseChange {
            count: expenses.len(),
            total,
            saved,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_add_keeps_descending_order() {
        let env = TestEnv::new().await;
        let app = env.admin_app().await;
        for (date, amount) in [("2024-01-05", "10"), ("2024-03-01", "20"), ("2024-02-10", "5")] {
            expense_add(&app, &ExpenseArgs::new(date, amount, "Supplies"))
                .await
                .unwrap();
        }
        let out = expense_list(&app).await.unwrap();
        let list = out.structure().unwrap();
        let dates: Vec<String> = list.expenses.iter().map(|e| e.date().to_string()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-02-10", "2024-01-05"]);
        assert_eq!(list.total.to_string(), "35.00");
        assert!(out.message().starts_with("[0] 2024-03-01 Supplies: 20.00"));
    }

    #[tokio::test]
    async fn test_edit_and_remove() {
        let env = TestEnv::new().await;
        let app = env.admin_app().await;
        expense_add(&app, &ExpenseArgs::new("2024-01-05", "10", "Rent"))
            .await
            .unwrap();
        expense_add(&app, &ExpenseArgs::new("2024-01-06", "4", "Tea"))
            .await
            .unwrap();

        // Moving Rent to a later date moves it to the front
        let out = expense_edit(
            &app,
            &ExpenseEditArgs::new(1, ExpenseArgs::new("2024-02-01", "12", "Rent")),
        )
        .await
        .unwrap();
        assert_eq!(out.structure().unwrap().total.to_string(), "16.00");
        let expenses: Expenses = app.persistence().current().await;
        assert_eq!(expenses.get(0).unwrap().description(), "Rent");

        let out = expense_remove(&app, &IndexArgs::new(0)).await.unwrap();
        assert_eq!(out.structure().unwrap().count, 1);
        assert!(expense_remove(&app, &IndexArgs::new(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_expenses_are_rejected() {
        let env = TestEnv::new().await;
        let app = env.admin_app().await;
        for args in [
            ExpenseArgs::new("05/01/2024", "10", "Rent"),
            ExpenseArgs::new("2024-01-05", "-1", "Rent"),
            ExpenseArgs::new("2024-01-05", "10", " "),
        ] {
            assert!(expense_add(&app, &args).await.is_err());
        }
        let expenses: Expenses = app.persistence().current().await;
        assert!(expenses.is_empty());
    }

    #[tokio::test]
    async fn test_expense_commands_require_admin() {
        let env = TestEnv::new().await;
        let app = env.app().await;
        let args = ExpenseArgs::new("2024-01-05", "10", "Rent");
        assert!(expense_add(&app, &args).await.is_err());
        assert!(expense_remove(&app, &IndexArgs::new(0)).await.is_err());
        assert!(expense_list(&app).await.is_ok());
    }
}
