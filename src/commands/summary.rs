use crate::app::App;
use crate::commands::Out;
use crate::model::{net_balance, Amount, DonationLedger, Expenses};
use crate::Result;
use serde::Serialize;
use std::fmt::Write;

/// The donations of one year.
#[derive(Debug, Clone, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub total: Amount,
}

impl YearTotal {
    /// Every year in `ledger`, most recent first.
    pub(crate) fn all(ledger: &DonationLedger) -> Vec<Self> {
        ledger
            .years()
            .into_iter()
            .map(|year| YearTotal {
                year,
                total: ledger.year_total(year),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub years: Vec<YearTotal>,
    pub donations: Amount,
    pub expenses: Amount,
    pub balance: Amount,
}

/// Totals from the current session state.
pub async fn summary(app: &App) -> Result<Out<Summary>> {
    let ledger: DonationLedger = app.persistence().current().await;
    let expenses: Expenses = app.persistence().current().await;
    let summary = Summary {
        years: YearTotal::all(&ledger),
        donations: ledger.grand_total(),
        expenses: expenses.total(),
        balance: net_balance(&ledger, &expenses),
    };

    let mut message = String::new();
    for y in &summary.years {
        let _ = writeln!(message, "Donations {}: {}", y.year, y.total);
    }
    let _ = writeln!(message, "Total donations: {}", summary.donations);
    let _ = writeln!(message, "Total expenses: {}", summary.expenses);
    let _ = write!(message, "Balance: {}", summary.balance);
    Ok(Out::new(message, summary))
}
