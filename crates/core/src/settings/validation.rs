//! Field-level validation of game settings

use std::fmt;

use crate::types::{GameSettings, MAX_LIFE, MAX_PLAYERS, MIN_LIFE, MIN_PLAYERS};

/// Settings input field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsField {
    Players,
    Life,
}

/// One rejected field with its user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: SettingsField,
    pub message: String,
}

impl FieldError {
    pub fn players() -> Self {
        Self {
            field: SettingsField::Players,
            message: format!(
                "Players must be an integer between {} and {}.",
                MIN_PLAYERS, MAX_PLAYERS
            ),
        }
    }

    pub fn life() -> Self {
        Self {
            field: SettingsField::Life,
            message: format!(
                "Life total must be an integer between {} and {}.",
                MIN_LIFE, MAX_LIFE
            ),
        }
    }
}

/// All field errors found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Message for a field, if it was rejected
    pub fn message_for(&self, field: SettingsField) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub(crate) fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

pub(crate) fn players_in_range(players: i64) -> bool {
    (MIN_PLAYERS as i64..=MAX_PLAYERS as i64).contains(&players)
}

pub(crate) fn life_in_range(life: i64) -> bool {
    (MIN_LIFE..=MAX_LIFE).contains(&life)
}

/// Check bounds of already-typed settings
pub fn validate(settings: &GameSettings) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if !players_in_range(settings.players as i64) {
        errors.push(FieldError::players());
    }
    if !life_in_range(settings.life) {
        errors.push(FieldError::life());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl GameSettings {
    /// See [`validate`]
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate(self)
    }
}
