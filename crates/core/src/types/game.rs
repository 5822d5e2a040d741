//! Game settings chosen before a life-counter session

use serde::{Deserialize, Serialize};

pub const MIN_PLAYERS: u32 = 1;
pub const MAX_PLAYERS: u32 = 6;

pub const MIN_LIFE: i64 = 0;
pub const MAX_LIFE: i64 = 2_147_483_647;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum GameType {
    #[default]
    #[serde(rename = "MTG")]
    Mtg,
    #[serde(rename = "EDH")]
    Edh,
    #[serde(rename = "Lorcana")]
    Lorcana,
}

impl GameType {
    pub const ALL: [GameType; 3] = [GameType::Mtg, GameType::Edh, GameType::Lorcana];

    /// Default (players, life) for this game type
    pub fn defaults(self) -> (u32, i64) {
        match self {
            GameType::Mtg => (2, 20),
            GameType::Edh => (4, 40),
            GameType::Lorcana => (2, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameType::Mtg => "MTG",
            GameType::Edh => "EDH",
            GameType::Lorcana => "Lorcana",
        }
    }

    /// Parse the label used on the wire and in the UI
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == label)
    }
}

/// Session parameters (players, starting life, game type)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSettings {
    pub players: u32,
    pub life: i64,
    #[serde(rename = "gameType")]
    pub game_type: GameType,
}

impl GameSettings {
    pub fn new(players: u32, life: i64, game_type: GameType) -> Self {
        Self {
            players,
            life,
            game_type,
        }
    }

    /// Settings pre-filled from a game type's defaults
    pub fn for_game_type(game_type: GameType) -> Self {
        let (players, life) = game_type.defaults();
        Self::new(players, life, game_type)
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::for_game_type(GameType::Mtg)
    }
}
