//! JSON-file backed [`KeyValueStore`]
//!
//! All keys live in one JSON object. Writes go to a sibling `.tmp` file that
//! is then renamed over the original, so a crash never leaves a torn file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use nowplaying_common::auth::KeyValueStore;
use nowplaying_domain::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::errors::InfraError;

pub const TOKEN_FILE_NAME: &str = "tokens.json";

/// Durable store kept in a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    /// Store at `<dir>/tokens.json`, or under [`default_data_dir`] when `dir`
    /// is `None`.
    pub fn in_dir(dir: Option<&str>) -> Self {
        let dir = dir.map(PathBuf::from).unwrap_or_else(default_data_dir);
        Self::new(dir.join(TOKEN_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(InfraError::from(err).into()),
        };

        match serde_json::from_slice(&data) {
            Ok(map) => Ok(map),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Store file is corrupt; starting empty");
                Ok(BTreeMap::new())
            }
        }
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if map.is_empty() {
            return match fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(InfraError::from(err).into()),
            };
        }

        let data = serde_json::to_vec_pretty(map).map_err(InfraError::from)?;
        let temp_path = self.path.with_extension("tmp");

        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent).await.map_err(InfraError::from)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&temp_path).await.map_err(InfraError::from)?;
        file.write_all(&data).await.map_err(InfraError::from)?;
        file.sync_all().await.map_err(InfraError::from)?;
        drop(file);

        fs::rename(&temp_path, &self.path).await.map_err(InfraError::from)?;
        debug!(path = %self.path.display(), keys = map.len(), "Store file written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map().await?.remove(key))
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(key).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}

/// Platform data directory for the client.
///
/// `$XDG_DATA_HOME/nowplaying`, else `$HOME/.local/share/nowplaying`, else
/// `./.nowplaying`.
pub fn default_data_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join("nowplaying");
    }
    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".local").join("share").join("nowplaying");
    }
    PathBuf::from(".nowplaying")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn set_get_remove_roundtrip_through_disk() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested").join(TOKEN_FILE_NAME));

        assert!(store.get("spotify_token_set").await.unwrap().is_none());

        store.set("spotify_token_set", r#"{"access_token":"AT1"}"#).await.unwrap();
        store.set("other", "value").await.unwrap();

        let reopened = FileStore::new(store.path().to_path_buf());
        assert_eq!(
            reopened.get("spotify_token_set").await.unwrap().as_deref(),
            Some(r#"{"access_token":"AT1"}"#)
        );

        reopened.remove("spotify_token_set").await.unwrap();
        assert!(store.get("spotify_token_set").await.unwrap().is_none());
        assert_eq!(store.get("other").await.unwrap().as_deref(), Some("value"));
    }

    #[tokio::test]
    async fn removing_last_key_deletes_file() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(dir.path().to_str());

        store.set("k", "v").await.unwrap();
        assert!(store.path().exists());

        store.remove("k").await.unwrap();
        assert!(!store.path().exists());
        // Idempotent.
        store.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(TOKEN_FILE_NAME);
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileStore::new(&path);
        assert!(store.get("k").await.unwrap().is_none());

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join(TOKEN_FILE_NAME));
        store.set("k", "v").await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
