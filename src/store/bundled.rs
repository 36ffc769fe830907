//! Snapshots compiled into the binary, used when neither the remote nor the local cache has data.

/// The bundled donation ledger.
pub const DONATIONS: &str = include_str!("data/donations.json");

/// The bundled expense list.
pub const EXPENSES: &str = include_str!("data/expenses.json");
