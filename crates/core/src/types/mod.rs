//! Domain types for the life counter and card search

mod card;
mod game;
mod player;

pub use card::{CardSearchResult, SearchPage};
pub use game::{GameSettings, GameType, MAX_LIFE, MAX_PLAYERS, MIN_LIFE, MIN_PLAYERS};
pub use player::{now_millis, LifeChange, Player, PlayerId};
