use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its cache subdirectory and an initial `config.json`.
///
/// # Arguments
/// - `ledger_home` - The directory that will be the root of data directory, e.g. `$HOME/ledger`
/// - `owner` and `repo` - The GitHub repository that holds the ledger files
/// - `pages_url` - Where that repository is published, if not at the default GitHub Pages URL
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(
    ledger_home: &Path,
    owner: &str,
    repo: &str,
    pages_url: Option<&str>,
) -> Result<Out<()>> {
    let config = Config::create(ledger_home, owner, repo, pages_url)
        .await
        .context("Unable to create the data directory and config")?;
    Ok(format!(
        "Successfully created the ledger directory at {} for {}/{}",
        config.root().display(),
        config.owner(),
        config.repo()
    )
    .into())
}
