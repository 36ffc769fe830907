//! Implements the `Remote` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without talking to GitHub.

use crate::api::{Remote, RemoteError, Token};
use crate::store::bundled;
use crate::Config;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct TestFile {
    content: String,
    sha: String,
}

#[derive(Debug, Default)]
struct TestRemoteState {
    files: HashMap<String, TestFile>,
    /// When false, every call fails with `RemoteError::Unreachable`.
    reachable: bool,
    /// When set, only this token may read shas and write.
    accepted_token: Option<String>,
    revision: u64,
    writes: usize,
}

impl TestRemoteState {
    fn next_sha(&mut self) -> String {
        self.revision += 1;
        format!("{:040x}", self.revision)
    }

    fn check_token(&self, token: &Token) -> Result<(), RemoteError> {
        match &self.accepted_token {
            Some(accepted) if accepted != token.secret() => Err(RemoteError::Unauthorized),
            _ => Ok(()),
        }
    }
}

/// An implementation of the `Remote` trait that does not use the network. Clones share the same
/// files, so a test can keep a handle to inspect what the code under test wrote.
#[derive(Debug, Clone)]
pub struct TestRemote {
    state: Arc<Mutex<TestRemoteState>>,
}

impl Default for TestRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRemote {
    /// A reachable remote without any files that accepts any token.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TestRemoteState {
                reachable: true,
                ..TestRemoteState::default()
            })),
        }
    }

    /// A remote that fails every call.
    pub fn unreachable() -> Self {
        Self {
            state: Arc::new(Mutex::new(TestRemoteState::default())),
        }
    }

    /// A remote seeded with the bundled snapshots at the configured paths.
    pub fn seeded(config: &Config) -> Self {
        let mut state = TestRemoteState {
            reachable: true,
            ..TestRemoteState::default()
        };
        for (path, content) in [
            (config.donations_path(), bundled::DONATIONS),
            (config.expenses_path(), bundled::EXPENSES),
        ] {
            let sha = state.next_sha();
            state.files.insert(
                path.to_string(),
                TestFile {
                    content: content.to_string(),
                    sha,
                },
            );
        }
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Adds or replaces a file.
    pub async fn put_file(&self, path: &str, content: &str) {
        let mut state = self.state.lock().await;
        let sha = state.next_sha();
        state.files.insert(
            path.to_string(),
            TestFile {
                content: content.to_string(),
                sha,
            },
        );
    }

    /// Returns the current content of a file.
    pub async fn file(&self, path: &str) -> Option<String> {
        self.state
            .lock()
            .await
            .files
            .get(path)
            .map(|f| f.content.clone())
    }

    /// Returns the current sha of a file.
    pub async fn sha(&self, path: &str) -> Option<String> {
        self.state
            .lock()
            .await
            .files
            .get(path)
            .map(|f| f.sha.clone())
    }

    pub async fn set_reachable(&self, reachable: bool) {
        self.state.lock().await.reachable = reachable;
    }

    /// Only `token` will be accepted from now on.
    pub async fn accept_only(&self, token: &str) {
        self.state.lock().await.accepted_token = Some(token.to_string());
    }

    /// Number of successful `replace` calls.
    pub async fn writes(&self) -> usize {
        self.state.lock().await.writes
    }
}

#[async_trait::async_trait]
impl Remote for TestRemote {
    async fn fetch(&self, path: &str) -> Result<String, RemoteError> {
        let state = self.state.lock().await;
        if !state.reachable {
            return Err(RemoteError::Unreachable);
        }
        state
            .files
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }

    async fn content_id(&self, path: &str, token: &Token) -> Result<String, RemoteError> {
        let state = self.state.lock().await;
        if !state.reachable {
            return Err(RemoteError::Unreachable);
        }
        state.check_token(token)?;
        state
            .files
            .get(path)
            .map(|f| f.sha.clone())
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }

    async fn replace(
        &self,
        path: &str,
        token: &Token,
        content: &str,
        content_id: &str,
        _message: &str,
    ) -> Result<(), RemoteError> {
        let mut state = self.state.lock().await;
        if !state.reachable {
            return Err(RemoteError::Unreachable);
        }
        state.check_token(token)?;
        match state.files.get(path) {
            Some(current) if current.sha != content_id => {
                return Err(RemoteError::Conflict(format!(
                    "{path} is at {} but {content_id} was given",
                    current.sha
                )))
            }
            None => return Err(RemoteError::NotFound(path.to_string())),
            Some(_) => {}
        }
        let sha = state.next_sha();
        state.files.insert(
            path.to_string(),
            TestFile {
                content: content.to_string(),
                sha,
            },
        );
        state.writes += 1;
        Ok(())
    }
}
