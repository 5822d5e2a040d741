//! Player and life-history types

use serde::{Deserialize, Serialize};

/// Stable per-session player identifier (1..=N)
pub type PlayerId = u32;

/// One coalesced entry in a player's life history
///
/// Created once per flush and never edited afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifeChange {
    /// Unix timestamp (milliseconds) of the flush
    pub timestamp: u64,
    /// Sum of all deltas applied since the previous flush
    pub delta: i64,
    /// Life total at flush time
    pub total: i64,
}

impl LifeChange {
    pub fn new(timestamp: u64, delta: i64, total: i64) -> Self {
        Self {
            timestamp,
            delta,
            total,
        }
    }

    /// Signed label the way the history list renders it ("+3", "-2", "0")
    pub fn delta_label(&self) -> String {
        if self.delta > 0 {
            format!("+{}", self.delta)
        } else {
            self.delta.to_string()
        }
    }
}

/// A player in the current session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub life: i64,
    #[serde(default)]
    pub history: Vec<LifeChange>,
}

impl Player {
    /// Create player with empty history
    pub fn new(id: PlayerId, life: i64) -> Self {
        Self {
            id,
            life,
            history: Vec::new(),
        }
    }

    /// Build the roster for a fresh session (ids start at 1)
    pub fn roster(count: u32, life: i64) -> Vec<Player> {
        (1..=count).map(|id| Player::new(id, life)).collect()
    }
}

/// Unix timestamp in milliseconds
pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
