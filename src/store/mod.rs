//! Persistence of the ledger: a local cache directory in front of the remote files.

pub mod bundled;
pub(crate) mod local;
mod persist;
mod session;

pub use local::LocalCache;
pub use persist::{
    Collection, CollectionKind, Persistence, RemotePaths, SaveError, SaveOutcome,
};
pub use session::Session;
