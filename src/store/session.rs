//! Per-profile state kept in the local cache: the admin flag, the theme and the GitHub token.

use crate::api::Token;
use crate::store::local::{self, LocalCache};
use crate::Result;
use anyhow::Context;

/// Session state loaded once from the `LocalCache` and passed to whatever needs it.
///
/// The admin flag only gates which commands the CLI offers. It is not access control: anyone who
/// can write the cache directory can set it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    is_admin: bool,
    dark_mode: bool,
    token: Option<Token>,
}

impl Session {
    pub async fn load(cache: &LocalCache) -> Result<Self> {
        let is_admin = cache
            .get_flag(local::IS_ADMIN)
            .await
            .context("Unable to read the admin flag")?;
        let dark_mode = cache
            .get_flag(local::DARK_MODE)
            .await
            .context("Unable to read the theme preference")?;
        let token = cache
            .get(local::GITHUB_TOKEN)
            .await
            .context("Unable to read the GitHub token")?
            .and_then(Token::new);
        Ok(Self {
            is_admin,
            dark_mode,
            token,
        })
    }

    /// Writes every field back to `cache`. An absent token removes the stored one.
    pub async fn save(&self, cache: &LocalCache) -> Result<()> {
        let admin = if self.is_admin {
            cache.set_flag(local::IS_ADMIN, true).await
        } else {
            cache.remove(local::IS_ADMIN).await
        };
        admin.context("Unable to write the admin flag")?;
        cache
            .set_flag(local::DARK_MODE, self.dark_mode)
            .await
            .context("Unable to write the theme preference")?;
        let token = match &self.token {
            Some(token) => cache.set(local::GITHUB_TOKEN, token.secret()).await,
            None => cache.remove(local::GITHUB_TOKEN).await,
        };
        token.context("Unable to write the GitHub token")?;
        Ok(())
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn set_admin(&mut self, is_admin: bool) {
        self.is_admin = is_admin;
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) {
        self.dark_mode = dark_mode;
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn set_token(&mut self, token: Option<Token>) {
        self.token = token;
    }
}
