use crate::app::App;
use crate::commands::Out;
use crate::model::{DonationLedger, Expenses};
use crate::store::Collection;
use crate::Result;
use anyhow::{bail, Context};
use serde::Serialize;
use tracing::{debug, warn};

/// How much data a pull or push moved.
#[derive(Debug, Clone, Serialize)]
pub struct Counts {
    pub months: usize,
    pub donations: usize,
    pub expenses: usize,
}

impl Counts {
    fn new(ledger: &DonationLedger, expenses: &Expenses) -> Self {
        Self {
            months: ledger.len(),
            donations: ledger.donation_count(),
            expenses: expenses.len(),
        }
    }
}

/// Loads both collections through the full fallback chain. When GitHub can be reached, this
/// replaces the local cache with what is published there.
pub async fn pull(app: &App) -> Result<Out<Counts>> {
    let ledger: DonationLedger = pull_one(app).await;
    let expenses: Expenses = pull_one(app).await;
    let counts = Counts::new(&ledger, &expenses);
    Ok(Out::new(
        format!(
            "Loaded {} donations in {} months and {} expenses",
            counts.donations, counts.months, counts.expenses
        ),
        counts,
    ))
}

/// Loads `T`, warning when that replaced a cached copy holding changes that never reached GitHub.
async fn pull_one<T: Collection + PartialEq>(app: &App) -> T {
    let cached: Option<T> = app.persistence().cached().await;
    let loaded: T = app.persistence().load().await;
    if cached.is_some_and(|cached| cached != loaded) {
        warn!(
            "The local {} differed from GitHub and were replaced, unpushed changes are lost",
            T::KIND
        );
    }
    loaded
}

/// Writes the locally cached collections to GitHub. Unlike the other commands, a failed remote
/// write is an error here because it is the whole point of the command.
pub async fn push(app: &App) -> Result<Out<Counts>> {
    app.require_admin()?;
    if app.persistence().token().is_none() {
        bail!("No GitHub token is set, run 'ledger token set' first");
    }
    let ledger: DonationLedger = app.persistence().current().await;
    let expenses: Expenses = app.persistence().current().await;

    let outcome = app
        .persistence()
        .save(&ledger)
        .await
        .context("Unable to push the donations")?;
    debug!("Donations: {outcome}");
    let outcome = app
        .persistence()
        .save(&expenses)
        .await
        .context("Unable to push the expenses")?;
    debug!("Expenses: {outcome}");

    let counts = Counts::new(&ledger, &expenses);
    Ok(Out::new(
        format!(
            "Saved {} donations and {} expenses to GitHub",
            counts.donations, counts.expenses
        ),
        counts,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{DonationAddArgs, MonthArgs};
    use crate::commands::donation_add;
    use crate::store::LocalCache;
    use crate::test::TestEnv;

    const DONATIONS: &str = r#"{
  "2024-January": [{"name": "A", "amount": 100}],
  "2024-يناير": [{"name": "B", "amount": 50}]
}"#;

    async fn cached(cache: &LocalCache, key: &str) -> Option<String> {
        cache.get(key).await.unwrap()
    }

    #[tokio::test]
    async fn test_pull_refreshes_cache() {
        let env = TestEnv::new().await;
        env.remote()
            .put_file(env.config().donations_path(), DONATIONS)
            .await;
        let app = env.app().await;

        let out = pull(&app).await.unwrap();
        let counts = out.structure().unwrap();
        assert_eq!(counts.months, 1);
        assert_eq!(counts.donations, 2);
        assert_eq!(counts.expenses, 0);

        let cache = env.config().local_cache();
        let text = cached(&cache, "donations").await.unwrap();
        let ledger: DonationLedger = serde_json::from_str(&text).unwrap();
        assert_eq!(ledger.year_total(2024).to_string(), "150.00");
        assert_eq!(cached(&cache, "expenses").await.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_pull_offline_uses_cache() {
        let env = TestEnv::new().await;
        env.remote()
            .put_file(env.config().donations_path(), DONATIONS)
            .await;
        let app = env.app().await;
        pull(&app).await.unwrap();

        env.remote().set_reachable(false).await;
        let out = pull(&app).await.unwrap();
        assert_eq!(out.structure().unwrap().donations, 2);
    }

    #[tokio::test]
    async fn test_pull_replaces_unpushed_changes() {
        let env = TestEnv::new().await;
        let app = env.synced_app().await;
        env.remote().accept_only("another token").await;
        let args = DonationAddArgs::new(MonthArgs::new(2024, "March"), "Sara", "25");
        donation_add(&app, &args).await.unwrap();

        let out = pull(&app).await.unwrap();
        assert_eq!(out.structure().unwrap().donations, 0);
        let ledger: DonationLedger = app.persistence().current().await;
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_push_requires_admin_and_token() {
        let env = TestEnv::new().await;
        let app = env.app().await;
        assert!(push(&app).await.is_err());
        let app = env.admin_app().await;
        let err = push(&app).await.unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[tokio::test]
    async fn test_push_uploads_local_changes() {
        let env = TestEnv::new().await;
        let app = env.admin_app().await;
        let args = DonationAddArgs::new(MonthArgs::new(2024, "March"), "Sara", "25");
        donation_add(&app, &args).await.unwrap();
        assert_eq!(env.remote().writes().await, 0);

        let app = env.synced_app().await;
        let out = push(&app).await.unwrap();
        assert_eq!(out.structure().unwrap().donations, 1);
        assert_eq!(env.remote().writes().await, 2);
        let remote = env
            .remote()
            .file(env.config().donations_path())
            .await
            .unwrap();
        assert!(remote.contains("2024-March"));
        assert!(remote.contains("Sara"));
    }

    #[tokio::test]
    async fn test_push_fails_when_remote_is_down() {
        let env = TestEnv::new().await;
        let app = env.synced_app().await;
        env.remote().set_reachable(false).await;
        assert!(push(&app).await.is_err());
    }
}
