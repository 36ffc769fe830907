//! The persistence helper that keeps a collection in both tiers.
//!
//! Loading walks a fallback chain (remote, local cache, bundled snapshot, empty) and never fails.
//! Saving writes the local cache first and then tries the remote, so a failed remote write leaves
//! the local tier ahead of the remote one.

use crate::api::{Remote, RemoteError, Token};
use crate::model::{DonationLedger, Expenses};
use crate::store::bundled;
use crate::store::local::{self, LocalCache};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Identifies one of the two persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Donations,
    Expenses,
}

serde_plain::derive_display_from_serialize!(CollectionKind);
serde_plain::derive_fromstr_from_deserialize!(CollectionKind);

impl CollectionKind {
    /// The local cache key that holds this collection.
    pub fn cache_key(self) -> &'static str {
        match self {
            CollectionKind::Donations => local::DONATIONS,
            CollectionKind::Expenses => local::EXPENSES,
        }
    }

    fn commit_message(self) -> &'static str {
        match self {
            CollectionKind::Donations => "Update donations data via ledger cli",
            CollectionKind::Expenses => "Update expenses data via ledger cli",
        }
    }

    fn bundled(self) -> &'static str {
        match self {
            CollectionKind::Donations => bundled::DONATIONS,
            CollectionKind::Expenses => bundled::EXPENSES,
        }
    }
}

/// A collection that can be loaded and saved as a whole.
pub trait Collection: Serialize + DeserializeOwned + Default + Send + Sync {
    const KIND: CollectionKind;
}

impl Collection for DonationLedger {
    const KIND: CollectionKind = CollectionKind::Donations;
}

impl Collection for Expenses {
    const KIND: CollectionKind = CollectionKind::Expenses;
}

/// Where each collection lives in the remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePaths {
    donations: String,
    expenses: String,
}

impl RemotePaths {
    pub fn new(donations: impl Into<String>, expenses: impl Into<String>) -> Self {
        Self {
            donations: donations.into(),
            expenses: expenses.into(),
        }
    }

    pub fn get(&self, kind: CollectionKind) -> &str {
        match kind {
            CollectionKind::Donations => &self.donations,
            CollectionKind::Expenses => &self.expenses,
        }
    }
}

/// The result of a save that was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    /// Both tiers hold the new value.
    Synced,
    /// Only the local tier was written because no token is configured.
    LocalOnly,
}

serde_plain::derive_display_from_serialize!(SaveOutcome);

/// Why a save was not fully applied.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// Nothing was persisted.
    #[error("Unable to write {kind} to the local cache at {}", .path.display())]
    LocalWriteFailed {
        kind: CollectionKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The local tier holds the new value but the remote does not.
    #[error("The {kind} were saved locally but could not be written to GitHub")]
    RemoteSyncFailed {
        kind: CollectionKind,
        #[source]
        source: RemoteError,
    },

    /// The local tier holds the new value. The remote file could be fetched but not parsed, so it
    /// was left untouched.
    #[error("The {kind} were saved locally, the invalid {kind} file on GitHub was not replaced")]
    RemoteUnreadable {
        kind: CollectionKind,
        #[source]
        source: serde_json::Error,
    },

    /// Another save of the same collection has not finished.
    #[error("A save of the {0} is already in progress")]
    SaveInProgress(CollectionKind),
}

/// Keeps the donation ledger and the expense list in the local cache and the remote.
pub struct Persistence {
    local: LocalCache,
    remote: Box<dyn Remote>,
    paths: RemotePaths,
    token: Option<Token>,
    donations_snapshot: String,
    expenses_snapshot: String,
    donations_guard: Mutex<()>,
    expenses_guard: Mutex<()>,
}

impl Persistence {
    pub fn new(local: LocalCache, remote: Box<dyn Remote>, paths: RemotePaths) -> Self {
        Self {
            local,
            remote,
            paths,
            token: None,
            donations_snapshot: CollectionKind::Donations.bundled().to_string(),
            expenses_snapshot: CollectionKind::Expenses.bundled().to_string(),
            donations_guard: Mutex::new(()),
            expenses_guard: Mutex::new(()),
        }
    }

    /// Replaces the snapshot used when neither tier has data for `kind`.
    pub fn with_snapshot(mut self, kind: CollectionKind, snapshot: impl Into<String>) -> Self {
        match kind {
            CollectionKind::Donations => self.donations_snapshot = snapshot.into(),
            CollectionKind::Expenses => self.expenses_snapshot = snapshot.into(),
        }
        self
    }

    pub fn local(&self) -> &LocalCache {
        &self.local
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Sets the token used for remote writes. Without one, saves only reach the local tier.
    pub fn set_token(&mut self, token: Option<Token>) {
        self.token = token;
    }

    /// Checks that `token` can read the donations file through the authenticated API.
    pub async fn check_token(&self, token: &Token) -> Result<(), RemoteError> {
        let path = self.paths.get(CollectionKind::Donations);
        self.remote.content_id(path, token).await.map(|_| ())
    }

    /// Loads `T` from the first tier that has it: the remote, the local cache, the bundled
    /// snapshot, and finally an empty collection. A successful remote read replaces the cached
    /// copy.
    pub async fn load<T: Collection>(&self) -> T {
        let kind = T::KIND;
        let path = self.paths.get(kind);
        match self.remote.fetch(path).await {
            Ok(text) => match serde_json::from_str::<T>(&text) {
                Ok(value) => {
                    debug!("Loaded {kind} from the remote");
                    self.refresh_cache(&value).await;
                    return value;
                }
                Err(e) => warn!("The remote {kind} file at {path} is not valid: {e}"),
            },
            Err(e) => warn!("Unable to fetch the {kind} from the remote: {e}"),
        }

        match self.cached::<T>().await {
            Some(value) => {
                info!("Using the locally cached {kind}");
                return value;
            }
            None => debug!("There are no usable {kind} in the local cache"),
        }

        match serde_json::from_str::<T>(self.snapshot(kind)) {
            Ok(value) => {
                info!("Using the bundled {kind}");
                value
            }
            Err(e) => {
                warn!("The bundled {kind} are not valid, starting empty: {e}");
                T::default()
            }
        }
    }

    /// The session state of `T`: the locally cached copy, or the result of `load` when there is
    /// none.
    pub async fn current<T: Collection>(&self) -> T {
        match self.cached::<T>().await {
            Some(value) => value,
            None => self.load().await,
        }
    }

    /// Writes `value` to the local cache and then, if a token is set, to the remote.
    pub async fn save<T: Collection>(&self, value: &T) -> Result<SaveOutcome, SaveError> {
        let kind = T::KIND;
        let _guard = self
            .guard(kind)
            .try_lock()
            .map_err(|_| SaveError::SaveInProgress(kind))?;

        let json = to_json(value).map_err(|source| SaveError::LocalWriteFailed {
            kind,
            path: self.local.path(kind.cache_key()),
            source,
        })?;
        self.local
            .set(kind.cache_key(), &json)
            .await
            .map_err(|source| SaveError::LocalWriteFailed {
                kind,
                path: self.local.path(kind.cache_key()),
                source,
            })?;
        debug!("Wrote the {kind} to the local cache");

        let Some(token) = &self.token else {
            info!("No GitHub token is set, the {kind} were only saved locally");
            return Ok(SaveOutcome::LocalOnly);
        };

        let path = self.paths.get(kind);
        self.check_remote::<T>(path)
            .await
            .map_err(|source| SaveError::RemoteUnreadable { kind, source })?;
        let remote = async {
            let sha = self.remote.content_id(path, token).await?;
            self.remote
                .replace(path, token, &json, &sha, kind.commit_message())
                .await
        };
        remote
            .await
            .map_err(|source| SaveError::RemoteSyncFailed { kind, source })?;
        info!("Saved the {kind} to GitHub");
        Ok(SaveOutcome::Synced)
    }

    /// Fails when the remote copy of `T` can be fetched but not parsed. A failed fetch is left to
    /// the write that follows.
    async fn check_remote<T: Collection>(&self, path: &str) -> Result<(), serde_json::Error> {
        match self.remote.fetch(path).await {
            Ok(text) => serde_json::from_str::<T>(&text).map(|_| ()),
            Err(e) => {
                debug!("Unable to fetch the {} before replacing them: {e}", T::KIND);
                Ok(())
            }
        }
    }

    fn guard(&self, kind: CollectionKind) -> &Mutex<()> {
        match kind {
            CollectionKind::Donations => &self.donations_guard,
            CollectionKind::Expenses => &self.expenses_guard,
        }
    }

    fn snapshot(&self, kind: CollectionKind) -> &str {
        match kind {
            CollectionKind::Donations => &self.donations_snapshot,
            CollectionKind::Expenses => &self.expenses_snapshot,
        }
    }

    /// Reads and parses the cached copy of `T`. Unreadable or invalid entries are logged and
    /// treated as missing.
    pub async fn cached<T: Collection>(&self) -> Option<T> {
        let kind = T::KIND;
        let text = match self.local.get(kind.cache_key()).await {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!("Unable to read the cached {kind}: {e}");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("The cached {kind} are not valid: {e}");
                None
            }
        }
    }

    async fn refresh_cache<T: Collection>(&self, value: &T) {
        let kind = T::KIND;
        let result = match to_json(value) {
            Ok(json) => self.local.set(kind.cache_key(), &json).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!("Unable to update the cached {kind}: {e}");
        }
    }
}

/// Pretty JSON with two-space indentation, the layout of the files in the repository.
fn to_json<T: Serialize>(value: &T) -> std::io::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestRemote;
    use crate::model::{Donation, Expense, MonthKey};
    use tempfile::TempDir;

    const DONATIONS_PATH: &str = "src/data/donations.json";
    const EXPENSES_PATH: &str = "src/data/expenses.json";

    fn paths() -> RemotePaths {
        RemotePaths::new(DONATIONS_PATH, EXPENSES_PATH)
    }

    fn persistence(dir: &TempDir, remote: &TestRemote) -> Persistence {
        Persistence::new(
            LocalCache::new(dir.path().join(".cache")),
            Box::new(remote.clone()),
            paths(),
        )
    }

    fn ledger() -> DonationLedger {
        DonationLedger::default().add_donation(
            MonthKey::new(2024, 1).unwrap(),
            Donation::parse("Ahmad", "100").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_local_round_trip_with_unreachable_remote() {
        let dir = TempDir::new().unwrap();
        let remote = TestRemote::unreachable();
        let p = persistence(&dir, &remote);

        let outcome = p.save(&ledger()).await.unwrap();
        assert_eq!(outcome, SaveOutcome::LocalOnly);
        let loaded: DonationLedger = p.load().await;
        assert_eq!(loaded, ledger());
        assert_eq!(loaded.year_total(2024).to_string(), "100.00");
    }

    #[tokio::test]
    async fn test_load_prefers_remote_and_refreshes_cache() {
        let dir = TempDir::new().unwrap();
        let remote = TestRemote::new();
        remote
            .put_file(DONATIONS_PATH, r#"{"2024-يناير":[{"name":"Ahmad","amount":100}]}"#)
            .await;
        let p = persistence(&dir, &remote);
        p.local().set(local::DONATIONS, "{}").await.unwrap();

        let loaded: DonationLedger = p.load().await;
        assert_eq!(loaded, ledger());
        let cached = p.local().get(local::DONATIONS).await.unwrap().unwrap();
        assert!(cached.contains("2024-January"));
    }

    #[tokio::test]
    async fn test_load_falls_back_to_cache_then_snapshot() {
        let dir = TempDir::new().unwrap();
        let remote = TestRemote::unreachable();
        let p = persistence(&dir, &remote).with_snapshot(
            CollectionKind::Expenses,
            r#"[{"date":"2024-02-01","amount":5,"description":"Bread"}]"#,
        );

        let expenses: Expenses = p.load().await;
        assert_eq!(expenses.len(), 1);

        let cached = Expenses::default()
            .add_expense(Expense::parse("2024-03-01", "7", "Milk").unwrap())
            .add_expense(Expense::parse("2024-03-02", "8", "Tea").unwrap());
        p.save(&cached).await.unwrap();
        let expenses: Expenses = p.load().await;
        assert_eq!(expenses, cached);
    }

    #[tokio::test]
    async fn test_load_defaults_when_everything_fails() {
        let dir = TempDir::new().unwrap();
        let remote = TestRemote::new();
        remote.put_file(DONATIONS_PATH, "not json").await;
        let p = persistence(&dir, &remote)
            .with_snapshot(CollectionKind::Donations, "{\"2024-May\": 5}");
        p.local().set(local::DONATIONS, "[1, 2").await.unwrap();

        let loaded: DonationLedger = p.load().await;
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_save_synced() {
        let dir = TempDir::new().unwrap();
        let remote = TestRemote::new();
        remote.put_file(DONATIONS_PATH, "{}").await;
        let mut p = persistence(&dir, &remote);
        p.set_token(Token::new("ghp_test"));

        let outcome = p.save(&ledger()).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Synced);
        assert_eq!(remote.writes().await, 1);
        let written = remote.file(DONATIONS_PATH).await.unwrap();
        assert!(written.contains("\n  \"2024-January\": ["));
        assert_eq!(
            serde_json::from_str::<DonationLedger>(&written).unwrap(),
            ledger()
        );
        assert_eq!(
            p.local().get(local::DONATIONS).await.unwrap(),
            Some(written)
        );
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_local_write() {
        let dir = TempDir::new().unwrap();
        let remote = TestRemote::new();
        remote.put_file(DONATIONS_PATH, "{}").await;
        remote.accept_only("good").await;
        let mut p = persistence(&dir, &remote);
        p.set_token(Token::new("bad"));

        let err = p.save(&ledger()).await.unwrap_err();
        assert!(matches!(
            err,
            SaveError::RemoteSyncFailed {
                kind: CollectionKind::Donations,
                source: RemoteError::Unauthorized,
            }
        ));
        assert_eq!(remote.file(DONATIONS_PATH).await.as_deref(), Some("{}"));
        let current: DonationLedger = p.current().await;
        assert_eq!(current, ledger());
    }

    #[tokio::test]
    async fn test_invalid_remote_file_is_not_replaced() {
        let dir = TempDir::new().unwrap();
        let remote = TestRemote::new();
        let broken = r#"{"2023-May": [{"name": "Old", "amount": "five hundred"}]}"#;
        remote.put_file(DONATIONS_PATH, broken).await;
        let mut p = persistence(&dir, &remote);
        p.set_token(Token::new("t"));

        // The load falls back to an empty ledger, which must not reach the remote
        let loaded: DonationLedger = p.load().await;
        assert!(loaded.is_empty());
        let err = p.save(&ledger()).await.unwrap_err();
        assert!(matches!(
            err,
            SaveError::RemoteUnreadable {
                kind: CollectionKind::Donations,
                ..
            }
        ));
        assert_eq!(remote.file(DONATIONS_PATH).await.as_deref(), Some(broken));
        assert_eq!(remote.writes().await, 0);
        let cached: Option<DonationLedger> = p.cached().await;
        assert_eq!(cached, Some(ledger()));
    }

    #[tokio::test]
    async fn test_unrecognized_remote_keys_survive_a_save() {
        let dir = TempDir::new().unwrap();
        let remote = TestRemote::new();
        remote
            .put_file(
                DONATIONS_PATH,
                concat!(
                    r#"{"2023-May":[{"name":"Old","amount":500}],"#,
                    r#""2024-Ramadan":[{"name":"R","amount":2}]}"#
                ),
            )
            .await;
        let mut p = persistence(&dir, &remote);
        p.set_token(Token::new("t"));

        let current: DonationLedger = p.current().await;
        let next = current.add_donation(
            MonthKey::new(2024, 6).unwrap(),
            Donation::parse("New", "1").unwrap(),
        );
        assert_eq!(p.save(&next).await.unwrap(), SaveOutcome::Synced);

        let written = remote.file(DONATIONS_PATH).await.unwrap();
        assert!(written.contains("\"Old\""));
        assert!(written.contains("\"2024-Ramadan\""));
        assert!(written.contains("\"New\""));
    }

    #[tokio::test]
    async fn test_missing_remote_file_is_a_sync_failure() {
        let dir = TempDir::new().unwrap();
        let remote = TestRemote::new();
        let mut p = persistence(&dir, &remote);
        p.set_token(Token::new("t"));
        let err = p.save(&Expenses::default()).await.unwrap_err();
        assert!(matches!(
            err,
            SaveError::RemoteSyncFailed {
                source: RemoteError::NotFound(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_local_write_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let remote = TestRemote::new();
        remote.put_file(DONATIONS_PATH, "{}").await;
        let mut p = Persistence::new(LocalCache::new(&blocker), Box::new(remote.clone()), paths());
        p.set_token(Token::new("t"));

        let err = p.save(&ledger()).await.unwrap_err();
        assert!(matches!(err, SaveError::LocalWriteFailed { .. }));
        assert_eq!(remote.writes().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_save_is_rejected() {
        let dir = TempDir::new().unwrap();
        let remote = TestRemote::unreachable();
        let p = persistence(&dir, &remote);

        let held = p.guard(CollectionKind::Donations).lock().await;
        let err = p.save(&ledger()).await.unwrap_err();
        assert!(matches!(
            err,
            SaveError::SaveInProgress(CollectionKind::Donations)
        ));
        // The other collection is not blocked
        p.save(&Expenses::default()).await.unwrap();
        drop(held);
        p.save(&ledger()).await.unwrap();
    }

    #[tokio::test]
    async fn test_current_reads_cache_before_remote() {
        let dir = TempDir::new().unwrap();
        let remote = TestRemote::new();
        remote
            .put_file(DONATIONS_PATH, r#"{"2023-March":[{"name":"B","amount":1}]}"#)
            .await;
        let p = persistence(&dir, &remote);

        // Empty cache: falls back to the full load
        let current: DonationLedger = p.current().await;
        assert_eq!(current.years(), vec![2023]);

        p.save(&ledger()).await.unwrap();
        let current: DonationLedger = p.current().await;
        assert_eq!(current, ledger());
    }

    #[tokio::test]
    async fn test_check_token() {
        let dir = TempDir::new().unwrap();
        let remote = TestRemote::new();
        remote.put_file(DONATIONS_PATH, "{}").await;
        remote.accept_only("good").await;
        let p = persistence(&dir, &remote);
        assert!(p.check_token(&Token::new("good").unwrap()).await.is_ok());
        assert!(matches!(
            p.check_token(&Token::new("bad").unwrap()).await,
            Err(RemoteError::Unauthorized)
        ));
    }

    #[test]
    fn test_collection_kind_display() {
        assert_eq!(CollectionKind::Donations.to_string(), "donations");
        assert_eq!(CollectionKind::Expenses.cache_key(), "expenses");
        assert_eq!(SaveOutcome::LocalOnly.to_string(), "local_only");
    }
}
