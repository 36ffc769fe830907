//! Configuration file handling for the ledger.
//!
//! The configuration file is stored at `$LEDGER_HOME/config.json` and names the GitHub repository
//! that holds the ledger files, where those files are published, and the admin password.

use crate::store::LocalCache;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "ledger";
const CONFIG_VERSION: u8 = 1;
const CACHE: &str = ".cache";
const CONFIG_JSON: &str = "config.json";
const DEFAULT_API_URL: &str = "https://api.github.com/";
const DEFAULT_DONATIONS_PATH: &str = "src/data/donations.json";
const DEFAULT_EXPENSES_PATH: &str = "src/data/expenses.json";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// The repository used when `init` is not told otherwise.
pub const DEFAULT_OWNER: &str = "sayprob";
pub const DEFAULT_REPO: &str = "website-for-yassin";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$LEDGER_HOME` and from there it loads `$LEDGER_HOME/config.json`. It also knows
/// where the local cache lives inside the ledger home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    cache: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    pages_url: Url,
    api_url: Url,
}

impl Config {
    /// Creates the data directory, its cache subdirectory and an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/ledger`
    /// - `owner` - The GitHub user or organization that owns the repository
    /// - `repo` - The repository that holds the ledger files
    /// - `pages_url` - Where the repository is published. Defaults to
    ///   `https://<owner>.github.io/<repo>/`
    ///
    /// # Errors
    /// - Returns an error if any file operations fail or a URL is invalid.
    pub async fn create(
        dir: impl Into<PathBuf>,
        owner: &str,
        repo: &str,
        pages_url: Option<&str>,
    ) -> Result<Self> {
        let owner = owner.trim();
        let repo = repo.trim();
        if owner.is_empty() || repo.is_empty() {
            bail!("The repository owner and name must not be empty");
        }

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the ledger home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;
        utils::make_dir(&root.join(CACHE)).await?;

        let config_file = ConfigFile {
            pages_url: match pages_url {
                Some(url) => url.to_string(),
                None => default_pages_url(owner, repo),
            },
            owner: owner.to_string(),
            repo: repo.to_string(),
            ..ConfigFile::default()
        };
        let config = Self::from_file(root, config_file)?;
        config.config_file.save(&config.config_path).await?;
        Ok(config)
    }

    /// This will
    /// - validate that the `ledger_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the cache directory exists
    /// - return the loaded configuration object
    pub async fn load(ledger_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = ledger_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Ledger Home is missing, run 'ledger init' first")?;
        let _ = utils::read_dir(&root)
            .await
            .context("Ledger Home is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let config = Self::from_file(root, config_file)?;
        if !config.cache.is_dir() {
            bail!(
                "The cache directory is missing '{}'",
                config.cache.display()
            )
        }
        Ok(config)
    }

    fn from_file(root: PathBuf, config_file: ConfigFile) -> Result<Self> {
        let pages_url = Url::parse(&config_file.pages_url)
            .with_context(|| format!("Invalid pages_url '{}'", config_file.pages_url))?;
        let api_url = Url::parse(&config_file.api_url)
            .with_context(|| format!("Invalid api_url '{}'", config_file.api_url))?;
        Ok(Self {
            cache: root.join(CACHE),
            config_path: root.join(CONFIG_JSON),
            root,
            config_file,
            pages_url,
            api_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn cache(&self) -> &Path {
        &self.cache
    }

    /// The local tier of the persistence helper.
    pub fn local_cache(&self) -> LocalCache {
        LocalCache::new(&self.cache)
    }

    pub fn owner(&self) -> &str {
        &self.config_file.owner
    }

    pub fn repo(&self) -> &str {
        &self.config_file.repo
    }

    pub fn pages_url(&self) -> &Url {
        &self.pages_url
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn donations_path(&self) -> &str {
        &self.config_file.donations_path
    }

    pub fn expenses_path(&self) -> &str {
        &self.config_file.expenses_path
    }

    pub fn admin_password(&self) -> &str {
        &self.config_file.admin_password
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "ledger",
///   "config_version": 1,
///   "owner": "sayprob",
///   "repo": "website-for-yassin",
///   "pages_url": "https://sayprob.github.io/website-for-yassin/",
///   "api_url": "https://api.github.com/",
///   "donations_path": "src/data/donations.json",
///   "expenses_path": "src/data/expenses.json",
///   "admin_password": "admin123"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "ledger"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The GitHub user or organization that owns the repository
    owner: String,

    /// The repository that holds the ledger files
    repo: String,

    /// The GitHub Pages URL the files are read from
    pages_url: String,

    /// The GitHub REST API base URL the files are written through
    #[serde(default = "default_api_url")]
    api_url: String,

    /// Path of the donations file inside the repository
    #[serde(default = "default_donations_path")]
    donations_path: String,

    /// Path of the expenses file inside the repository
    #[serde(default = "default_expenses_path")]
    expenses_path: String,

    /// The shared secret for `ledger admin login`
    #[serde(default = "default_admin_password")]
    admin_password: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            pages_url: default_pages_url(DEFAULT_OWNER, DEFAULT_REPO),
            api_url: default_api_url(),
            donations_path: default_donations_path(),
            expenses_path: default_expenses_path(),
            admin_password: default_admin_password(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or names another application
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

fn default_pages_url(owner: &str, repo: &str) -> String {
    format!("https://{owner}.github.io/{repo}/")
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_donations_path() -> String {
    DEFAULT_DONATIONS_PATH.to_string()
}

fn default_expenses_path() -> String {
    DEFAULT_EXPENSES_PATH.to_string()
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}
