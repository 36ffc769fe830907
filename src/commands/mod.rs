//! Command handlers for the ledger CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod admin;
mod donation;
mod expense;
mod init;
mod summary;
mod sync;
mod theme;
mod token;

use crate::store::{CollectionKind, SaveError, SaveOutcome};
use crate::Result;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info, warn};

pub use admin::{admin_login, admin_logout, admin_status};
pub use donation::{donation_add, donation_edit, donation_list, donation_remove, DonationList};
pub use expense::{expense_add, expense_edit, expense_list, expense_remove};
pub use init::init;
pub use summary::{summary, Summary};
pub use sync::{pull, push};
pub use theme::theme;
pub use token::{token_remove, token_set, token_status};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Where a change ended up after a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Saved {
    /// Saved locally and on GitHub.
    Synced,
    /// Saved locally. No token is set.
    LocalOnly,
    /// Saved locally. Writing to GitHub failed.
    LocalAhead,
}

impl Saved {
    fn describe(self) -> &'static str {
        match self {
            Saved::Synced => "saved locally and on GitHub",
            Saved::LocalOnly => "saved locally only, set a token to save to GitHub",
            Saved::LocalAhead => {
                "saved locally but not on GitHub, run 'ledger push' to retry before any \
                 'ledger pull', which would replace it"
            }
        }
    }
}

/// Turns the result of a save into a `Saved`. A failed remote write is only a warning because the
/// local tier already holds the change. Any other failure means nothing was saved.
fn settle(
    kind: CollectionKind,
    result: std::result::Result<SaveOutcome, SaveError>,
) -> Result<Saved> {
    match result {
        Ok(SaveOutcome::Synced) => Ok(Saved::Synced),
        Ok(SaveOutcome::LocalOnly) => Ok(Saved::LocalOnly),
        Err(e @ (SaveError::RemoteSyncFailed { .. } | SaveError::RemoteUnreadable { .. })) => {
            warn!("{:#}", anyhow::Error::from(e));
            Ok(Saved::LocalAhead)
        }
        Err(e) => Err(anyhow::Error::from(e).context(format!("The {kind} were not saved"))),
    }
}
