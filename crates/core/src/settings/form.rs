//! Raw text input for the "track new game" form

use super::validation::{life_in_range, players_in_range, FieldError, ValidationErrors};
use crate::types::{GameSettings, GameType, MIN_PLAYERS};

/// Max characters accepted in the players field
pub const PLAYERS_INPUT_MAX_LEN: usize = 2;
/// Max characters accepted in the life field
pub const LIFE_INPUT_MAX_LEN: usize = 4;
/// Starting life the form shows when nothing was saved
pub const FORM_DEFAULT_LIFE: i64 = 20;

/// Unvalidated form state as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    players: String,
    life: String,
    game_type: GameType,
}

impl SettingsForm {
    /// Form pre-filled from settings
    pub fn from_settings(settings: &GameSettings) -> Self {
        Self {
            players: settings.players.to_string(),
            life: settings.life.to_string(),
            game_type: settings.game_type,
        }
    }

    pub fn players(&self) -> &str {
        &self.players
    }

    pub fn life(&self) -> &str {
        &self.life
    }

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    /// Accept players input; non-digits are stripped, over-long input ignored
    ///
    /// Returns whether the field changed.
    pub fn set_players(&mut self, text: &str) -> bool {
        Self::accept(&mut self.players, text, PLAYERS_INPUT_MAX_LEN)
    }

    /// Accept life input; non-digits are stripped, over-long input ignored
    pub fn set_life(&mut self, text: &str) -> bool {
        Self::accept(&mut self.life, text, LIFE_INPUT_MAX_LEN)
    }

    /// Switch game type and load its default players/life
    pub fn select_game_type(&mut self, game_type: GameType) {
        self.game_type = game_type;
        let (players, life) = game_type.defaults();
        self.players = players.to_string();
        self.life = life.to_string();
    }

    /// Parse and bounds-check both fields
    pub fn validate(&self) -> Result<GameSettings, ValidationErrors> {
        let players = parse_int(&self.players).filter(|p| players_in_range(*p));
        let life = parse_int(&self.life).filter(|l| life_in_range(*l));

        let mut errors = ValidationErrors::default();
        if players.is_none() {
            errors.push(FieldError::players());
        }
        if life.is_none() {
            errors.push(FieldError::life());
        }

        match (players, life) {
            (Some(players), Some(life)) => Ok(GameSettings::new(players as u32, life, self.game_type)),
            _ => Err(errors),
        }
    }

    /// Errors to display next to the inputs
    ///
    /// Empty fields are not flagged until the user types something.
    pub fn visible_errors(&self) -> Vec<FieldError> {
        match self.validate() {
            Ok(_) => Vec::new(),
            Err(errors) => errors
                .errors
                .into_iter()
                .filter(|e| match e.field {
                    super::SettingsField::Players => !self.players.is_empty(),
                    super::SettingsField::Life => !self.life.is_empty(),
                })
                .collect(),
        }
    }

    /// Whether the start action is enabled
    pub fn can_start(&self) -> bool {
        self.validate().is_ok()
    }

    fn accept(field: &mut String, text: &str, max_len: usize) -> bool {
        let clean: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        if clean.len() > max_len {
            return false;
        }
        *field = clean;
        true
    }
}

impl SettingsForm {
    /// Settings the form starts from when nothing was saved
    pub fn default_settings() -> GameSettings {
        GameSettings::new(MIN_PLAYERS, FORM_DEFAULT_LIFE, GameType::default())
    }

    /// The form's settings if valid, otherwise [`Self::default_settings`]
    pub fn settings_or_default(&self) -> GameSettings {
        self.validate().unwrap_or_else(|_| Self::default_settings())
    }
}

impl Default for SettingsForm {
    fn default() -> Self {
        Self::from_settings(&Self::default_settings())
    }
}

fn parse_int(text: &str) -> Option<i64> {
    if text.is_empty() {
        return None;
    }
    text.parse::<i64>().ok()
}
