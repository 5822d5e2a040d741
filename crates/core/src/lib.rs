//! Sideboard Core - Shared logic for the Sideboard companion app
//!
//! This crate provides:
//! - Life-counter session store with debounced history
//! - Game settings form and validation
//! - Card search (Scryfall) with pagination
//! - Local key-value persistence
//! - d20 roller
//! - Error types

// Version constants
pub const APP_VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod debounce;
pub mod dice;
pub mod error;
pub mod search;
pub mod session;
pub mod settings;
pub mod storage;
pub mod types;

// Re-export common types
pub use config::{AppConfig, HistoryOrder, SearchConfig, SessionConfig};
pub use dice::{roll_d20, FlickDetector};
pub use error::{CoreError, Result};
pub use search::{CardProvider, ProviderKey, ProviderRegistry, SearchController, SearchState};
pub use session::{SessionSnapshot, SessionStore};
pub use settings::{SettingsForm, SettingsManager, ValidationErrors};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use types::{CardSearchResult, GameSettings, GameType, LifeChange, Player, PlayerId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constants_defined() {
        assert!(APP_VERSION_STRING.starts_with("0.1"));
    }
}
