//! The remote tier: a JSON file published on GitHub Pages and updated through the GitHub
//! contents API.
//!
//! `Remote` is the seam. `GitHubRemote` talks to GitHub and `TestRemote` keeps files in memory so
//! the program can run top-to-bottom without the network.

mod error;
mod github;
mod test_remote;

use crate::{Config, Result};
use std::fmt::{Debug, Formatter};

pub use error::RemoteError;
pub use github::GitHubRemote;
pub use test_remote::TestRemote;

/// When this environment variable is set and non-empty, `Mode::Test` is used.
const TEST_MODE_ENV: &str = "LEDGER_SYNC_IN_TEST_MODE";

/// Selects the `Remote` implementation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    GitHub,
    Test,
}

impl Mode {
    /// Returns `Mode::Test` when `LEDGER_SYNC_IN_TEST_MODE` is set to a non-empty value.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::GitHub,
        }
    }
}

/// The bearer token used for remote writes. `Debug` does not print the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Returns `None` for a blank token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into().trim().to_string();
        (!token.is_empty()).then_some(Self(token))
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(****)")
    }
}

/// Access to the remote copy of the ledger files.
#[async_trait::async_trait]
pub trait Remote: Send + Sync {
    /// Fetches the published file at `path` without authentication, bypassing caches.
    async fn fetch(&self, path: &str) -> std::result::Result<String, RemoteError>;

    /// Returns the identifier (the git blob sha) of the current content at `path`. Needed to
    /// replace the file.
    async fn content_id(&self, path: &str, token: &Token)
        -> std::result::Result<String, RemoteError>;

    /// Replaces the file at `path` with `content`. `content_id` must identify the current content
    /// or the remote rejects the write.
    async fn replace(
        &self,
        path: &str,
        token: &Token,
        content: &str,
        content_id: &str,
        message: &str,
    ) -> std::result::Result<(), RemoteError>;
}

/// Creates the `Remote` for `mode`.
pub fn remote(config: &Config, mode: Mode) -> Result<Box<dyn Remote>> {
    Ok(match mode {
        Mode::GitHub => Box::new(GitHubRemote::new(config)?),
        Mode::Test => Box::new(TestRemote::seeded(config)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_rejects_blank() {
        assert!(Token::new("").is_none());
        assert!(Token::new("   ").is_none());
        assert_eq!(Token::new(" abc ").unwrap().secret(), "abc");
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("ghp_secret").unwrap();
        assert!(!format!("{token:?}").contains("ghp_secret"));
    }
}
