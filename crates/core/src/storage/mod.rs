//! Local key-value persistence
//!
//! Values are JSON strings stored under fixed logical keys. Reads and writes are
//! best-effort: callers go through [`load_json`] / [`save_json`], which log
//! failures and degrade to "nothing persisted" instead of returning errors.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Key holding the serialized player list of the current session
pub const CURRENT_GAME_KEY: &str = "@@sideboard_currentGame";
/// Key holding the player count and starting life of the current session
pub const CURRENT_ROSTER_KEY: &str = "@sideboard_currentRoster";
/// Key holding the last-used game settings
pub const COUNTER_SETTINGS_KEY: &str = "@sideboard_counterSettings";

/// Async string key-value store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read value, `None` if the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove key (absent key is not an error)
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Load and decode a JSON value
///
/// Returns `None` when the key is absent, unreadable, or holds invalid JSON.
pub async fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::error!("Failed to read {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Discarding unreadable value under {}: {}", key, e);
            None
        }
    }
}

/// Encode and write a JSON value, logging on failure
///
/// Returns whether the write succeeded.
pub async fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("Failed to encode {}: {}", key, e);
            return false;
        }
    };

    match store.set(key, &raw).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to write {}: {}", key, e);
            false
        }
    }
}

/// Remove a key, logging on failure
pub async fn remove_key(store: &dyn KeyValueStore, key: &str) -> bool {
    match store.remove(key).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to remove {}: {}", key, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GameSettings, GameType};

    #[tokio::test]
    async fn test_load_absent_key() {
        let store = MemoryStore::new();
        let loaded: Option<GameSettings> = load_json(&store, COUNTER_SETTINGS_KEY).await;
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryStore::new();
        let settings = GameSettings::new(3, 30, GameType::Mtg);
        assert!(save_json(&store, COUNTER_SETTINGS_KEY, &settings).await);

        let loaded: Option<GameSettings> = load_json(&store, COUNTER_SETTINGS_KEY).await;
        assert_eq!(loaded, Some(settings));
    }

    #[tokio::test]
    async fn test_load_garbage_is_none() {
        let store = MemoryStore::new();
        store.set(COUNTER_SETTINGS_KEY, "{not json").await.unwrap();
        let loaded: Option<GameSettings> = load_json(&store, COUNTER_SETTINGS_KEY).await;
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let store = MemoryStore::new();
        store.set_failing(true);

        assert!(!save_json(&store, CURRENT_GAME_KEY, &Vec::<u32>::new()).await);
        let loaded: Option<Vec<u32>> = load_json(&store, CURRENT_GAME_KEY).await;
        assert!(loaded.is_none());
        assert!(!remove_key(&store, CURRENT_GAME_KEY).await);
    }
}
