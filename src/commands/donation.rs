use crate::app::App;
use crate::args::{
    DonationAddArgs, DonationEditArgs, DonationListArgs, DonationRemoveArgs, MonthArgs,
};
use crate::commands::summary::YearTotal;
use crate::commands::{settle, Out, Saved};
use crate::model::{Amount, Donation, DonationLedger, MonthKey, MonthSummary};
use crate::store::CollectionKind;
use crate::Result;
use serde::Serialize;
use std::fmt::Write;

/// The month a donation command changed, as it is after the change.
#[derive(Debug, Clone, Serialize)]
pub struct DonationChange {
    pub key: MonthKey,
    pub donations: Vec<Donation>,
    pub month_total: Amount,
    pub saved: Saved,
}

/// The three views of `ledger donation list`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DonationList {
    Years {
        years: Vec<YearTotal>,
        total: Amount,
    },
    Months {
        year: i32,
        months: Vec<MonthSummary>,
        total: Amount,
    },
    Donations {
        key: MonthKey,
        donations: Vec<Donation>,
        total: Amount,
    },
}

pub async fn donation_add(app: &App, args: &DonationAddArgs) -> Result<Out<DonationChange>> {
    app.require_admin()?;
    let key = args.month().key()?;
    let donation = Donation::parse(args.name(), args.amount())?;
    let ledger: DonationLedger = app.persistence().current().await;
    let next = ledger.add_donation(key, donation);
    let saved = settle(CollectionKind::Donations, app.persistence().save(&next).await)?;
    Ok(change(&next, key, saved, "Added a donation to"))
}

pub async fn donation_edit(app: &App, args: &DonationEditArgs) -> Result<Out<DonationChange>> {
    app.require_admin()?;
    let key = args.month().key()?;
    let donation = Donation::parse(args.name(), args.amount())?;
    let ledger: DonationLedger = app.persistence().current().await;
    let next = ledger.edit_donation(key, args.index(), donation)?;
    let saved = settle(CollectionKind::Donations, app.persistence().save(&next).await)?;
    Ok(change(&next, key, saved, "Updated a donation in"))
}

pub async fn donation_remove(
    app: &App,
    args: &DonationRemoveArgs,
) -> Result<Out<DonationChange>> {
    app.require_admin()?;
    let key = args.month().key()?;
    let ledger: DonationLedger = app.persistence().current().await;
    let next = ledger.remove_donation(key, args.index())?;
    let saved = settle(CollectionKind::Donations, app.persistence().save(&next).await)?;
    Ok(change(&next, key, saved, "Removed a donation from"))
}

/// Lists the years with their totals, the months of `--year`, or the donations of `--year` and
/// `--month`.
pub async fn donation_list(app: &App, args: &DonationListArgs) -> Result<Out<DonationList>> {
    let ledger: DonationLedger = app.persistence().current().await;
    let mut message = String::new();
    let list = match (args.year(), args.month()) {
        (Some(year), Some(month)) => {
            let key = MonthArgs::new(year, month).key()?;
            let donations = ledger.donations(&key).to_vec();
            let total = ledger.month_total(&key);
            let _ = writeln!(message, "{key} ({}): {total}", key.arabic_name());
            for (i, d) in donations.iter().enumerate() {
                let _ = writeln!(message, "  [{i}] {}: {}", d.name(), d.amount());
            }
            DonationList::Donations {
                key,
                donations,
                total,
            }
        }
        (Some(year), None) => {
            let months = ledger.months(year);
            let total = ledger.year_total(year);
            let _ = writeln!(message, "{year}: {total}");
            for m in &months {
                let _ = writeln!(
                    message,
                    "  {} ({}): {} from {} donations",
                    m.key.month_name(),
                    m.key.arabic_name(),
                    m.total,
                    m.count
                );
            }
            DonationList::Months {
                year,
                months,
                total,
            }
        }
        // Clap rejects --month without --year.
        (None, _) => {
            let years = YearTotal::all(&ledger);
            let total = ledger.grand_total();
            for y in &years {
                let _ = writeln!(message, "{}: {}", y.year, y.total);
            }
            let _ = write!(message, "Total: {total}");
            DonationList::Years { years, total }
        }
    };
    Ok(Out::new(message.trim_end(), list))
}

fn change(ledger: &DonationLedger, key: MonthKey, saved: Saved, verb: &str) -> Out<DonationChange> {
    let month_total = ledger.month_total(&key);
    Out::new(
        format!(
            "{verb} {key}, the month total is now {month_total} ({})",
            saved.describe()
        ),
        DonationChange {
            key,
            donations: ledger.donations(&key).to_vec(),
            month_total,
            saved,
        },
    )
}
