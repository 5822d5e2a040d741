//! Background writer for the current-game key
//!
//! All writes go through one task fed by a channel, so they land in the order
//! the state changed. Failures are logged and dropped.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::storage::{remove_key, save_json, KeyValueStore, CURRENT_GAME_KEY, CURRENT_ROSTER_KEY};
use crate::types::Player;

/// Player count and starting life a session was created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub players: u32,
    pub life: i64,
}

enum PersistCommand {
    Save(Vec<Player>),
    SaveRoster(Roster),
    Clear,
    Barrier(oneshot::Sender<()>),
}

/// Handle to the persistence task
///
/// Dropping the last handle closes the channel and lets the task finish its
/// queue and exit.
#[derive(Clone)]
pub struct PersistWorker {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl PersistWorker {
    /// Spawn the writer task
    pub fn spawn(store: Arc<dyn KeyValueStore>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<PersistCommand>();

        let handle = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    PersistCommand::Save(players) => {
                        if save_json(store.as_ref(), CURRENT_GAME_KEY, &players).await {
                            tracing::trace!("Persisted {} players", players.len());
                        }
                    }
                    PersistCommand::SaveRoster(roster) => {
                        save_json(store.as_ref(), CURRENT_ROSTER_KEY, &roster).await;
                    }
                    PersistCommand::Clear => {
                        remove_key(store.as_ref(), CURRENT_GAME_KEY).await;
                        remove_key(store.as_ref(), CURRENT_ROSTER_KEY).await;
                    }
                    PersistCommand::Barrier(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("Persistence task stopped");
        });

        (Self { tx }, handle)
    }

    /// Queue a write of the full player list
    pub fn save(&self, players: Vec<Player>) {
        if self.tx.send(PersistCommand::Save(players)).is_err() {
            tracing::warn!("Persistence task gone, dropping save");
        }
    }

    /// Queue a write of the session roster
    pub fn save_roster(&self, roster: Roster) {
        if self.tx.send(PersistCommand::SaveRoster(roster)).is_err() {
            tracing::warn!("Persistence task gone, dropping roster save");
        }
    }

    /// Queue removal of the saved game
    pub fn clear(&self) {
        if self.tx.send(PersistCommand::Clear).is_err() {
            tracing::warn!("Persistence task gone, dropping clear");
        }
    }

    /// Wait until every command queued before this call has been processed
    pub async fn sync(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(PersistCommand::Barrier(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}
