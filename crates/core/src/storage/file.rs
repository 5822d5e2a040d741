//! File-backed store
//!
//! # Storage Location
//!
//! - **macOS/iOS**: `~/Library/Application Support/sideboard/`
//! - **Linux/Android**: `~/.local/share/sideboard/`
//! - **Windows**: `%LOCALAPPDATA%\sideboard\`
//!
//! Mobile hosts usually pass their sandbox directory explicitly via
//! [`FileStore::with_dir`].
//!
//! One file per key: `<sanitized key>.json`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::error::{CoreError, Result};

/// Directory-backed [`KeyValueStore`]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Store under the platform data directory
    pub fn new() -> Result<Self> {
        let data_dir = dirs::data_local_dir()
            .ok_or(CoreError::NoDataDir)?
            .join("sideboard");
        Self::with_dir(data_dir)
    }

    /// Store under an explicit directory (created if missing)
    pub fn with_dir(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        tracing::debug!("File store at {}", data_dir.display());
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Map a logical key to its file
    ///
    /// Keys like `@@sideboard_currentGame` keep only `[A-Za-z0-9_-]`.
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        self.data_dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        // Readers never see a partially written file
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{COUNTER_SETTINGS_KEY, CURRENT_GAME_KEY};

    #[test]
    fn test_key_sanitizing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_dir(dir.path()).unwrap();
        assert_eq!(
            store.path_for(CURRENT_GAME_KEY),
            dir.path().join("sideboard_currentGame.json")
        );
        assert_ne!(store.path_for(CURRENT_GAME_KEY), store.path_for(COUNTER_SETTINGS_KEY));
    }

    #[tokio::test]
    async fn test_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_dir(dir.path().join("nested")).unwrap();

        assert_eq!(store.get(CURRENT_GAME_KEY).await.unwrap(), None);

        store.set(CURRENT_GAME_KEY, "[]").await.unwrap();
        assert_eq!(store.get(CURRENT_GAME_KEY).await.unwrap(), Some("[]".to_string()));

        store.set(CURRENT_GAME_KEY, "[1]").await.unwrap();
        assert_eq!(store.get(CURRENT_GAME_KEY).await.unwrap(), Some("[1]".to_string()));

        store.remove(CURRENT_GAME_KEY).await.unwrap();
        assert_eq!(store.get(CURRENT_GAME_KEY).await.unwrap(), None);
        store.remove(CURRENT_GAME_KEY).await.unwrap();
    }
}
