//! Last-used settings persistence and session start

use serde::Deserialize;
use std::sync::Arc;

use super::form::SettingsForm;
use super::validation::ValidationErrors;
use crate::storage::{remove_key, save_json, KeyValueStore, COUNTER_SETTINGS_KEY, CURRENT_GAME_KEY};
use super::form::FORM_DEFAULT_LIFE;
use crate::types::{GameSettings, GameType, MIN_PLAYERS};

/// Saved settings with every field optional (older saves may lack some)
#[derive(Debug, Deserialize)]
struct StoredSettings {
    players: Option<u32>,
    life: Option<i64>,
    #[serde(rename = "gameType")]
    game_type: Option<GameType>,
}

/// Reads and writes the last-used game settings
pub struct SettingsManager {
    storage: Arc<dyn KeyValueStore>,
}

impl SettingsManager {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Last-used settings, or the form defaults when none are saved
    pub async fn load_last_used(&self) -> SettingsForm {
        let stored: Option<StoredSettings> =
            crate::storage::load_json(self.storage.as_ref(), COUNTER_SETTINGS_KEY).await;

        match stored {
            Some(stored) => {
                let settings = GameSettings::new(
                    stored.players.unwrap_or(MIN_PLAYERS),
                    stored.life.unwrap_or(FORM_DEFAULT_LIFE),
                    stored.game_type.unwrap_or_default(),
                );
                tracing::debug!("Loaded last-used settings: {:?}", settings);
                SettingsForm::from_settings(&settings)
            }
            None => SettingsForm::default(),
        }
    }

    /// Validate the form, save it as last-used, and drop the saved game
    ///
    /// On success the caller starts a new session with the returned settings.
    /// Storage failures are logged; they do not block the start.
    pub async fn start(&self, form: &SettingsForm) -> Result<GameSettings, ValidationErrors> {
        let settings = form.validate()?;

        save_json(self.storage.as_ref(), COUNTER_SETTINGS_KEY, &settings).await;
        remove_key(self.storage.as_ref(), CURRENT_GAME_KEY).await;

        tracing::info!(
            "Settings accepted: {} players, {} life, {}",
            settings.players,
            settings.life,
            settings.game_type.as_str()
        );
        Ok(settings)
    }
}
