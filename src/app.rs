//! Everything a command needs once the ledger home has been loaded.

use crate::api::{self, Mode, Remote};
use crate::store::{Persistence, RemotePaths, Session};
use crate::{Config, Result};
use anyhow::{ensure, Context};
use tracing::debug;

/// The loaded configuration, the persistence helper and the session state.
pub struct App {
    config: Config,
    persistence: Persistence,
    session: Session,
}

impl App {
    /// Opens the ledger described by `config`, talking to the remote selected by `mode`.
    pub async fn open(config: Config, mode: Mode) -> Result<Self> {
        let remote = api::remote(&config, mode)?;
        Self::with_remote(config, remote).await
    }

    pub async fn with_remote(config: Config, remote: Box<dyn Remote>) -> Result<Self> {
        let local = config.local_cache();
        let session = Session::load(&local)
            .await
            .context("Unable to load the session state")?;
        debug!(
            "Session: admin={}, dark_mode={}, token={}",
            session.is_admin(),
            session.dark_mode(),
            session.token().is_some()
        );
        let paths = RemotePaths::new(config.donations_path(), config.expenses_path());
        let mut persistence = Persistence::new(local, remote, paths);
        persistence.set_token(session.token().cloned());
        Ok(Self {
            config,
            persistence,
            session,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Writes the session to the local cache and hands the current token to the persistence
    /// helper.
    pub async fn save_session(&mut self) -> Result<()> {
        self.session.save(self.persistence.local()).await?;
        self.persistence.set_token(self.session.token().cloned());
        Ok(())
    }

    /// Fails unless admin mode is on.
    pub fn require_admin(&self) -> Result<()> {
        ensure!(
            self.session.is_admin(),
            "This command changes the ledger and needs admin mode, run 'ledger admin login' first"
        );
        Ok(())
    }
}
