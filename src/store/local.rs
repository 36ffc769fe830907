//! The local tier: a directory of small files, one per key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::trace;

/// Cache key of the donation ledger.
pub const DONATIONS: &str = "donations";
/// Cache key of the expense list.
pub const EXPENSES: &str = "expenses";
/// Cache key of the admin flag (`"true"`/`"false"`).
pub const IS_ADMIN: &str = "isAdmin";
/// Cache key of the dark mode preference (`"true"`/`"false"`).
pub const DARK_MODE: &str = "darkMode";
/// Cache key of the GitHub token.
pub const GITHUB_TOKEN: &str = "github_token";

/// A string key/value store backed by files in `dir`. Values are written atomically by writing a
/// temporary file and renaming it over the old value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file that holds the value of `key`.
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Returns the value of `key`, or `None` if it has never been set.
    pub async fn get(&self, key: &str) -> std::io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Sets `key` to `value`.
    pub async fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path(key);
        let tmp = self.dir.join(format!(".{key}.tmp"));
        fs::write(&tmp, value).await?;
        if key == GITHUB_TOKEN {
            restrict_permissions(&tmp)?;
        }
        fs::rename(&tmp, &path).await?;
        trace!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    /// Removes `key`. Removing a key that is not set is not an error.
    pub async fn remove(&self, key: &str) -> std::io::Result<()> {
        match fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Reads a `"true"`/`"false"` flag. Anything other than `"true"` is false.
    pub async fn get_flag(&self, key: &str) -> std::io::Result<bool> {
        Ok(self.get(key).await?.is_some_and(|v| v.trim() == "true"))
    }

    pub async fn set_flag(&self, key: &str, value: bool) -> std::io::Result<()> {
        self.set(key, if value { "true" } else { "false" }).await
    }
}

/// Set restrictive permissions on Unix-like systems
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = LocalCache::new(dir.path().join("cache"));
        assert_eq!(cache.get(DONATIONS).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let cache = LocalCache::new(dir.path().join("cache"));
        cache.set(EXPENSES, "[]").await.unwrap();
        assert_eq!(cache.get(EXPENSES).await.unwrap().as_deref(), Some("[]"));
        cache.set(EXPENSES, "[1]").await.unwrap();
        assert_eq!(cache.get(EXPENSES).await.unwrap().as_deref(), Some("[1]"));
        cache.remove(EXPENSES).await.unwrap();
        assert_eq!(cache.get(EXPENSES).await.unwrap(), None);
        cache.remove(EXPENSES).await.unwrap();
    }

    #[tokio::test]
    async fn test_flags() {
        let dir = TempDir::new().unwrap();
        let cache = LocalCache::new(dir.path());
        assert!(!cache.get_flag(IS_ADMIN).await.unwrap());
        cache.set_flag(IS_ADMIN, true).await.unwrap();
        assert!(cache.get_flag(IS_ADMIN).await.unwrap());
        cache.set(IS_ADMIN, "yes").await.unwrap();
        assert!(!cache.get_flag(IS_ADMIN).await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let cache = LocalCache::new(dir.path());
        cache.set(GITHUB_TOKEN, "secret").await.unwrap();
        let mode = std::fs::metadata(cache.path(GITHUB_TOKEN))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_set_fails_when_dir_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let cache = LocalCache::new(&blocker);
        assert!(cache.set(DONATIONS, "{}").await.is_err());
    }
}
