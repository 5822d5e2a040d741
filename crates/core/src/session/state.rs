//! Life-counter state machine
//!
//! [`SessionState::apply`] is the only place player state changes. The async
//! [`SessionStore`](super::SessionStore) feeds it events (taps, timer flushes,
//! resets) and publishes the resulting [`SessionSnapshot`] to subscribers.

use std::collections::BTreeMap;

use crate::config::HistoryOrder;
use crate::types::{LifeChange, Player, PlayerId};

/// Input to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Fresh roster of `players` players at `life`
    Initialize { players: u32, life: i64 },
    /// Replace roster with a previously persisted one
    Restore { players: Vec<Player> },
    /// Tap: change life now, stage delta for the next flush
    ApplyDelta { player_id: PlayerId, delta: i64 },
    /// Debounce timer fired for one player
    Flush { player_id: PlayerId, timestamp: u64 },
    /// Flush every player with pending deltas
    FlushAll { timestamp: u64 },
    /// Discard the session
    Reset,
}

/// Staged, not yet flushed, delta sum for one player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDelta {
    pub player_id: PlayerId,
    pub sum: i64,
}

/// Read-only view handed to subscribers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub players: Vec<Player>,
    pub pending: Vec<PendingDelta>,
}

impl SessionSnapshot {
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Pending sum for a player (0 when nothing is staged)
    pub fn pending_for(&self, id: PlayerId) -> i64 {
        self.pending
            .iter()
            .find(|p| p.player_id == id)
            .map(|p| p.sum)
            .unwrap_or(0)
    }
}

/// Players plus per-player pending accumulators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    players: Vec<Player>,
    /// Present only while a flush is outstanding (a zero sum is still recorded)
    pending: BTreeMap<PlayerId, i64>,
    history_order: HistoryOrder,
}

impl SessionState {
    pub fn new(history_order: HistoryOrder) -> Self {
        Self {
            players: Vec::new(),
            pending: BTreeMap::new(),
            history_order,
        }
    }

    /// Transition to the next state
    ///
    /// Events naming an unknown player leave the state unchanged.
    pub fn apply(mut self, event: SessionEvent) -> SessionState {
        match event {
            SessionEvent::Initialize { players, life } => {
                self.players = Player::roster(players, life);
                self.pending.clear();
            }
            SessionEvent::Restore { players } => {
                self.players = players;
                self.pending.clear();
            }
            SessionEvent::ApplyDelta { player_id, delta } => {
                match self.players.iter_mut().find(|p| p.id == player_id) {
                    Some(player) => {
                        player.life = player.life.saturating_add(delta);
                        let sum = self.pending.entry(player_id).or_insert(0);
                        *sum = sum.saturating_add(delta);
                    }
                    None => tracing::debug!("Ignoring delta for unknown player {}", player_id),
                }
            }
            SessionEvent::Flush {
                player_id,
                timestamp,
            } => {
                self.flush_one(player_id, timestamp);
            }
            SessionEvent::FlushAll { timestamp } => {
                let ids: Vec<PlayerId> = self.pending.keys().copied().collect();
                for id in ids {
                    self.flush_one(id, timestamp);
                }
            }
            SessionEvent::Reset => {
                self.players.clear();
                self.pending.clear();
            }
        }
        self
    }

    fn flush_one(&mut self, player_id: PlayerId, timestamp: u64) {
        let Some(sum) = self.pending.remove(&player_id) else {
            return;
        };
        let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) else {
            return;
        };

        // Total is read now, not when the delta was staged
        let entry = LifeChange::new(timestamp, sum, player.life);
        match self.history_order {
            HistoryOrder::NewestFirst => player.history.insert(0, entry),
            HistoryOrder::OldestFirst => player.history.push(entry),
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    pub fn life_of(&self, id: PlayerId) -> Option<i64> {
        self.players.iter().find(|p| p.id == id).map(|p| p.life)
    }

    pub fn has_pending(&self, id: PlayerId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            players: self.players.clone(),
            pending: self
                .pending
                .iter()
                .map(|(&player_id, &sum)| PendingDelta { player_id, sum })
                .collect(),
        }
    }
}
