//! Session store for the life counter
//!
//! Owns the player list, per-player debounce timers, and the persistence task.
//! Every mutation goes through [`SessionState::apply`]; after each one the new
//! snapshot is published on a `watch` channel and queued for persistence.

use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use super::persist::{PersistWorker, Roster};
use super::state::{SessionEvent, SessionSnapshot, SessionState};
use crate::config::SessionConfig;
use crate::debounce::Debouncer;
use crate::error::{CoreError, Result};
use crate::storage::{load_json, KeyValueStore, CURRENT_GAME_KEY, CURRENT_ROSTER_KEY};
use crate::types::{now_millis, GameSettings, Player, PlayerId};

struct Inner {
    state: SessionState,
    /// Bumped whenever the session is replaced; stale flushes compare against it
    epoch: u64,
    timers: Debouncer<PlayerId>,
    /// Roster used by `reset`
    roster: Roster,
}

struct Shared {
    inner: Mutex<Inner>,
    updates: watch::Sender<SessionSnapshot>,
    persist: PersistWorker,
}

impl Shared {
    /// Apply event, then publish and persist the result
    fn commit(&self, inner: &mut Inner, event: SessionEvent) {
        let state = std::mem::take(&mut inner.state);
        inner.state = state.apply(event);

        let snapshot = inner.state.snapshot();
        self.persist.save(snapshot.players.clone());
        self.updates.send_replace(snapshot);
    }

    fn set_roster(&self, inner: &mut Inner, roster: Roster) {
        inner.roster = roster;
        self.persist.save_roster(roster);
    }
}

/// Life-counter session store
///
/// Cheap to clone; clones share the same session. Must be created inside a
/// Tokio runtime.
#[derive(Clone)]
pub struct SessionStore {
    shared: Arc<Shared>,
    config: SessionConfig,
    storage: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Create an empty store (no players until `initialize` or `load`)
    pub fn new(storage: Arc<dyn KeyValueStore>, config: SessionConfig) -> Self {
        let (persist, _task) = PersistWorker::spawn(storage.clone());
        let (updates, _) = watch::channel(SessionSnapshot::default());

        let inner = Inner {
            state: SessionState::new(config.history_order),
            epoch: 0,
            timers: Debouncer::new(config.flush_interval),
            roster: Roster { players: 0, life: 0 },
        };

        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                updates,
                persist,
            }),
            config,
            storage,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replace the session with `players` players at `starting_life`
    pub async fn initialize(&self, players: u32, starting_life: i64) {
        let mut inner = self.shared.inner.lock().await;
        Self::teardown(&mut inner);
        self.shared.set_roster(
            &mut inner,
            Roster {
                players,
                life: starting_life,
            },
        );
        self.shared.commit(
            &mut inner,
            SessionEvent::Initialize {
                players,
                life: starting_life,
            },
        );
        tracing::info!("New session: {} players at {} life", players, starting_life);
    }

    /// Restore the persisted session, or initialize fresh if there is none
    ///
    /// Returns whether a saved session was restored. A restored session keeps
    /// its own roster for `reset`. `players` and `starting_life` apply when
    /// nothing is saved; `starting_life` also stands in for a missing roster.
    pub async fn load(&self, players: u32, starting_life: i64) -> bool {
        let saved: Option<Vec<Player>> = load_json(self.storage.as_ref(), CURRENT_GAME_KEY).await;

        match saved {
            Some(saved) if !saved.is_empty() => {
                let stored: Option<Roster> =
                    load_json(self.storage.as_ref(), CURRENT_ROSTER_KEY).await;
                // A roster that disagrees with the saved players is stale
                let roster = stored
                    .filter(|r| r.players as usize == saved.len())
                    .unwrap_or(Roster {
                        players: saved.len() as u32,
                        life: starting_life,
                    });

                let mut inner = self.shared.inner.lock().await;
                Self::teardown(&mut inner);
                self.shared.set_roster(&mut inner, roster);
                tracing::info!("Restored session with {} players", saved.len());
                self.shared
                    .commit(&mut inner, SessionEvent::Restore { players: saved });
                true
            }
            _ => {
                self.initialize(players, starting_life).await;
                false
            }
        }
    }

    /// Apply a life change for one player
    ///
    /// Life changes immediately; the delta is staged and becomes a history
    /// entry once the player has been idle for the flush interval. Returns the
    /// player's new life total.
    pub async fn apply_delta(&self, player_id: PlayerId, delta: i64) -> Result<i64> {
        let mut inner = self.shared.inner.lock().await;
        if !inner.state.contains(player_id) {
            return Err(CoreError::PlayerNotFound(player_id));
        }

        self.shared
            .commit(&mut inner, SessionEvent::ApplyDelta { player_id, delta });
        let life = inner
            .state
            .life_of(player_id)
            .ok_or(CoreError::PlayerNotFound(player_id))?;

        let epoch = inner.epoch;
        let shared = Arc::downgrade(&self.shared);
        inner.timers.schedule(player_id, async move {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let mut inner = shared.inner.lock().await;
            if inner.epoch != epoch {
                tracing::debug!("Dropping stale flush for player {}", player_id);
                return;
            }
            shared.commit(
                &mut inner,
                SessionEvent::Flush {
                    player_id,
                    timestamp: now_millis(),
                },
            );
            tracing::debug!("Flushed history for player {}", player_id);
        });

        Ok(life)
    }

    /// Discard the current session and start one from `settings`
    ///
    /// Pending timers are cancelled and the saved game is removed before the
    /// new roster is written.
    pub async fn start_new(&self, settings: &GameSettings) {
        let mut inner = self.shared.inner.lock().await;
        Self::teardown(&mut inner);
        self.shared.persist.clear();
        self.shared.set_roster(
            &mut inner,
            Roster {
                players: settings.players,
                life: settings.life,
            },
        );
        self.shared.commit(&mut inner, SessionEvent::Reset);
        self.shared.commit(
            &mut inner,
            SessionEvent::Initialize {
                players: settings.players,
                life: settings.life,
            },
        );
        tracing::info!(
            "Started {} session: {} players at {} life",
            settings.game_type.as_str(),
            settings.players,
            settings.life
        );
    }

    /// Restart with the current roster size and starting life
    pub async fn reset(&self) {
        let mut inner = self.shared.inner.lock().await;
        Self::teardown(&mut inner);
        let Roster { players, life } = inner.roster;
        self.shared
            .commit(&mut inner, SessionEvent::Initialize { players, life });
        tracing::info!("Session reset");
    }

    /// Flush every pending accumulator now (e.g. app going to background)
    pub async fn flush_all(&self) {
        let mut inner = self.shared.inner.lock().await;
        inner.timers.cancel_all();
        self.shared.commit(
            &mut inner,
            SessionEvent::FlushAll {
                timestamp: now_millis(),
            },
        );
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.shared.inner.lock().await.state.snapshot()
    }

    /// Single player by id
    pub async fn player(&self, id: PlayerId) -> Option<Player> {
        let inner = self.shared.inner.lock().await;
        inner.state.players().iter().find(|p| p.id == id).cloned()
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Number of debounce timers still waiting to fire
    pub async fn pending_timers(&self) -> usize {
        self.shared.inner.lock().await.timers.pending_count()
    }

    /// Wait for all queued persistence writes to finish
    pub async fn sync(&self) {
        self.shared.persist.sync().await;
    }

    fn teardown(inner: &mut Inner) {
        let cancelled = inner.timers.cancel_all();
        if cancelled > 0 {
            tracing::debug!("Cancelled {} pending flushes", cancelled);
        }
        inner.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{session_config, HistoryOrder};
    use crate::storage::MemoryStore;
    use crate::types::{GameType, LifeChange};
    use std::time::Duration;

    fn store_with(storage: Arc<MemoryStore>) -> SessionStore {
        SessionStore::new(storage, SessionConfig::default())
    }

    async fn saved_players(storage: &MemoryStore) -> Option<Vec<Player>> {
        load_json(storage, CURRENT_GAME_KEY).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_window_yields_one_entry() {
        let store = store_with(Arc::new(MemoryStore::new()));
        store.initialize(2, 20).await;

        for delta in [-1, -1, -3, 2] {
            store.apply_delta(1, delta).await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert!(store.player(1).await.unwrap().history.is_empty());

        tokio::time::sleep(Duration::from_millis(1000)).await;

        let player = store.player(1).await.unwrap();
        assert_eq!(player.life, 17);
        assert_eq!(player.history.len(), 1);
        assert_eq!(player.history[0].delta, -3);
        assert_eq!(player.history[0].total, 17);
    }

    #[tokio::test(start_paused = true)]
    async fn test_life_is_immediate() {
        let store = store_with(Arc::new(MemoryStore::new()));
        store.initialize(2, 20).await;

        assert_eq!(store.apply_delta(2, 5).await.unwrap(), 25);
        assert_eq!(store.apply_delta(2, -1).await.unwrap(), 24);
        assert_eq!(store.snapshot().await.pending_for(2), 4);
        assert_eq!(store.pending_timers().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_produce_separate_entries() {
        let store = store_with(Arc::new(MemoryStore::new()));
        store.initialize(1, 20).await;

        store.apply_delta(1, -2).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        store.apply_delta(1, 4).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let history = store.player(1).await.unwrap().history;
        assert_eq!(history.len(), 2);
        assert_eq!((history[0].delta, history[0].total), (4, 22));
        assert_eq!((history[1].delta, history[1].total), (-2, 18));
    }

    #[tokio::test(start_paused = true)]
    async fn test_players_debounce_independently() {
        let store = store_with(Arc::new(MemoryStore::new()));
        store.initialize(2, 20).await;

        store.apply_delta(1, -1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        store.apply_delta(2, -1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        // Player 1 idle for 1.2s, player 2 only 0.6s
        assert_eq!(store.player(1).await.unwrap().history.len(), 1);
        assert!(store.player(2).await.unwrap().history.is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.player(2).await.unwrap().history.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_player() {
        let store = store_with(Arc::new(MemoryStore::new()));
        store.initialize(2, 20).await;
        assert!(matches!(
            store.apply_delta(3, 1).await,
            Err(CoreError::PlayerNotFound(3))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_new_session() {
        let store = store_with(Arc::new(MemoryStore::new()));
        store.initialize(2, 20).await;
        store.apply_delta(1, -5).await.unwrap();

        store
            .start_new(&GameSettings::new(4, 40, GameType::Edh))
            .await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.players.len(), 4);
        assert!(snapshot
            .players
            .iter()
            .all(|p| p.life == 40 && p.history.is_empty()));
        assert!(snapshot.pending.is_empty());
        assert_eq!(store.pending_timers().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_flush_never_reaches_new_session() {
        let store = store_with(Arc::new(MemoryStore::new()));
        store.initialize(2, 20).await;
        store.apply_delta(1, -5).await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        store.start_new(&GameSettings::new(2, 20, GameType::Mtg)).await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        let player = store.player(1).await.unwrap();
        assert_eq!(player.life, 20);
        assert!(player.history.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_keeps_roster() {
        let store = store_with(Arc::new(MemoryStore::new()));
        store.initialize(3, 30).await;
        store.apply_delta(2, -10).await.unwrap();

        store.reset().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.players, Player::roster(3, 30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_after_restore_uses_saved_roster() {
        let storage = Arc::new(MemoryStore::new());
        let store = store_with(storage.clone());
        store.initialize(4, 40).await;
        store.apply_delta(3, -7).await.unwrap();
        store.sync().await;

        let reloaded = store_with(storage);
        assert!(reloaded.load(2, 20).await);
        assert_eq!(reloaded.snapshot().await.players[2].life, 33);

        reloaded.reset().await;
        assert_eq!(reloaded.snapshot().await.players, Player::roster(4, 40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_without_roster_keeps_player_count() {
        let storage = Arc::new(MemoryStore::new());
        let saved = serde_json::to_string(&Player::roster(3, 25)).unwrap();
        storage.set(CURRENT_GAME_KEY, &saved).await.unwrap();

        let store = store_with(storage);
        assert!(store.load(2, 20).await);

        store.reset().await;
        assert_eq!(store.snapshot().await.players, Player::roster(3, 20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_all() {
        let store = store_with(Arc::new(MemoryStore::new()));
        store.initialize(2, 20).await;
        store.apply_delta(1, -2).await.unwrap();
        store.apply_delta(2, 3).await.unwrap();

        store.flush_all().await;
        assert_eq!(store.pending_timers().await, 0);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.players[0].history[0].delta, -2);
        assert_eq!(snapshot.players[1].history[0].delta, 3);
        assert!(snapshot.pending.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_restores_identical_state() {
        let storage = Arc::new(MemoryStore::new());
        let store = store_with(storage.clone());
        store.initialize(2, 20).await;
        store.apply_delta(1, -4).await.unwrap();
        store.apply_delta(2, 2).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        store.apply_delta(1, -1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        store.sync().await;
        let before = store.snapshot().await.players;

        let reloaded = store_with(storage);
        assert!(reloaded.load(4, 40).await);
        let after = reloaded.snapshot().await.players;

        assert_eq!(before, after);
        assert_eq!(after[0].life, 15);
        assert_eq!(after[0].history.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_without_saved_state_initializes() {
        let store = store_with(Arc::new(MemoryStore::new()));
        assert!(!store.load(4, 40).await);
        assert_eq!(store.snapshot().await.players, Player::roster(4, 40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_storage_failures_are_not_surfaced() {
        let storage = Arc::new(MemoryStore::new());
        storage.set_failing(true);
        let store = store_with(storage.clone());

        assert!(!store.load(2, 20).await);
        assert_eq!(store.apply_delta(1, -1).await.unwrap(), 19);
        store.sync().await;
        assert!(saved_players(&storage).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_change_is_persisted() {
        let storage = Arc::new(MemoryStore::new());
        let store = store_with(storage.clone());
        store.initialize(2, 20).await;
        store.apply_delta(2, -7).await.unwrap();
        store.sync().await;

        // Pending deltas are already reflected in the saved life
        let saved = saved_players(&storage).await.unwrap();
        assert_eq!(saved[1].life, 13);
        assert!(saved[1].history.is_empty());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        store.sync().await;
        let saved = saved_players(&storage).await.unwrap();
        assert_eq!(saved[1].history, vec![store.player(2).await.unwrap().history[0]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_updates() {
        let store = store_with(Arc::new(MemoryStore::new()));
        let mut rx = store.subscribe();
        store.initialize(2, 20).await;
        store.apply_delta(1, 3).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.player(1).unwrap().life, 23);
        assert_eq!(snapshot.pending_for(1), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_interval_and_order() {
        let config = session_config(Duration::from_millis(250), HistoryOrder::OldestFirst);
        let store = SessionStore::new(Arc::new(MemoryStore::new()), config);
        store.initialize(1, 10).await;

        store.apply_delta(1, 1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        store.apply_delta(1, 2).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let history = store.player(1).await.unwrap().history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].total, 11);
        assert_eq!(history[1], LifeChange { timestamp: history[1].timestamp, delta: 2, total: 13 });
    }
}
