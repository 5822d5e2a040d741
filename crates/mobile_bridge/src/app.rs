//! Process-global application state behind the FFI functions
//!
//! The bridge owns its own multi-threaded Tokio runtime; every call from Dart
//! is spawned onto it, so session timers and the persistence task keep running
//! between calls.

use anyhow::{anyhow, Context};
use once_cell::sync::OnceCell;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::Mutex;

use sideboard_core::{
    AppConfig, CoreError, FileStore, FlickDetector, GameType, KeyValueStore, ProviderKey,
    ProviderRegistry, SearchController, SearchState, SessionSnapshot, SessionStore, SettingsForm,
    SettingsManager,
};

static APP: OnceCell<App> = OnceCell::new();

/// One edit to the "track new game" form
#[derive(Debug, Clone)]
pub enum FormEdit {
    Players(String),
    Life(String),
    GameType(GameType),
}

pub struct App {
    config: AppConfig,
    session: SessionStore,
    settings: SettingsManager,
    form: Mutex<SettingsForm>,
    providers: ProviderRegistry,
    search: SearchController,
    flick: Mutex<FlickDetector>,
    // Dropped last so tasks owned by the fields above are torn down first
    runtime: Runtime,
}

impl App {
    /// Build the app on file storage (`config.data_dir` or the platform default)
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let storage: Arc<dyn KeyValueStore> = match &config.data_dir {
            Some(dir) => Arc::new(FileStore::with_dir(dir.clone())?),
            None => Arc::new(FileStore::new()?),
        };
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: AppConfig, storage: Arc<dyn KeyValueStore>) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("sideboard-worker")
            .enable_all()
            .build()
            .context("Failed to start runtime")?;

        let providers = ProviderRegistry::with_defaults(&config.search);
        let provider = providers
            .get(ProviderKey::default())
            .ok_or_else(|| anyhow!("No card provider registered for {}", ProviderKey::default().as_str()))?;

        // SessionStore spawns its persistence task on construction
        let (session, search) = {
            let _guard = runtime.enter();
            (
                SessionStore::new(storage.clone(), config.session.clone()),
                SearchController::new(provider, config.search.clone()),
            )
        };

        Ok(Self {
            session,
            settings: SettingsManager::new(storage),
            form: Mutex::new(SettingsForm::default()),
            providers,
            search,
            flick: Mutex::new(FlickDetector::new()),
            runtime,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run `fut` on the app runtime and wait for it
    pub async fn run<F, T>(&self, fut: F) -> Result<T, String>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.runtime
            .spawn(fut)
            .await
            .map_err(|e| format!("Task failed: {}", e))
    }

    #[cfg(test)]
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    // ===== Session =====

    /// Restore the saved game, or start one from the last-used settings
    pub async fn load_session(&self) -> SessionSnapshot {
        let form = self.settings.load_last_used().await;
        let settings = form.settings_or_default();
        *self.form.lock().await = form;

        self.session.load(settings.players, settings.life).await;
        self.session.snapshot().await
    }

    pub async fn apply_delta(&self, player_id: u32, delta: i64) -> Result<SessionSnapshot, String> {
        self.session
            .apply_delta(player_id, delta)
            .await
            .map_err(|e| e.to_string())?;
        Ok(self.session.snapshot().await)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot().await
    }

    /// Flush pending history and wait for it to reach storage
    pub async fn flush_session(&self) -> SessionSnapshot {
        self.session.flush_all().await;
        self.session.sync().await;
        self.session.snapshot().await
    }

    pub async fn reset_session(&self) -> SessionSnapshot {
        self.session.reset().await;
        self.session.snapshot().await
    }

    // ===== Settings =====

    /// Load last-used settings into the form
    pub async fn load_settings_form(&self) -> SettingsForm {
        let form = self.settings.load_last_used().await;
        *self.form.lock().await = form.clone();
        form
    }

    pub async fn edit_form(&self, edit: FormEdit) -> SettingsForm {
        let mut form = self.form.lock().await;
        match edit {
            FormEdit::Players(text) => {
                form.set_players(&text);
            }
            FormEdit::Life(text) => {
                form.set_life(&text);
            }
            FormEdit::GameType(game_type) => form.select_game_type(game_type),
        }
        form.clone()
    }

    /// Validate the form and start a new session from it
    pub async fn start_new_game(&self) -> Result<SessionSnapshot, String> {
        let form = self.form.lock().await.clone();
        let settings = self.settings.start(&form).await.map_err(|e| e.to_string())?;

        self.session.start_new(&settings).await;
        Ok(self.session.snapshot().await)
    }

    // ===== Search =====

    pub async fn search_cards(&self, query: String, page: u32) -> SearchState {
        self.search.search(&query, page).await
    }

    pub async fn set_search_query(&self, query: String) -> SearchState {
        self.search.set_query(&query).await;
        self.search.state().await
    }

    pub async fn next_search_page(&self) -> SearchState {
        match self.search.next_page().await {
            Some(state) => state,
            None => self.search.state().await,
        }
    }

    pub async fn search_state(&self) -> SearchState {
        self.search.state().await
    }

    /// Switch search backend by label (e.g. "mtg")
    pub async fn set_provider(&self, label: &str) -> Result<(), String> {
        let key = ProviderKey::from_label(label).ok_or_else(|| format!("Unknown provider: {}", label))?;
        let provider = self
            .providers
            .get(key)
            .ok_or_else(|| format!("Provider not registered: {}", key.as_str()))?;
        self.search.set_provider(provider).await;
        Ok(())
    }

    // ===== Dice =====

    /// Feed a motion sample; returns a roll when it completes a flick
    pub async fn observe_motion(&self, z: f64) -> Option<u8> {
        let mut flick = self.flick.lock().await;
        if !flick.observe(z) {
            return None;
        }
        flick.set_rolling(true);
        Some(sideboard_core::roll_d20(&mut rand::thread_rng()))
    }

    pub async fn finish_roll(&self) {
        self.flick.lock().await.set_rolling(false);
    }
}

/// Install the global app (first call wins)
pub fn install(app: App) -> Result<&'static App, String> {
    if APP.set(app).is_err() {
        tracing::debug!("App already initialized, keeping existing instance");
    }
    current()
}

/// The global app, if `install` has run
pub fn current() -> Result<&'static App, String> {
    APP.get().ok_or_else(|| CoreError::NotInitialized.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sideboard_core::storage::COUNTER_SETTINGS_KEY;
    use sideboard_core::{HistoryOrder, MemoryStore, Player};
    use sideboard_core::config::session_config;
    use std::time::Duration;

    fn test_app() -> (App, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let mut config = AppConfig::default();
        config.session = session_config(Duration::from_millis(50), HistoryOrder::NewestFirst);
        let app = App::with_storage(config, store.clone()).unwrap();
        (app, store)
    }

    #[test]
    fn test_load_session_uses_form_defaults() {
        let (app, _store) = test_app();
        let snapshot = app.block_on(app.load_session());

        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].life, 20);
    }

    #[test]
    fn test_invalid_saved_settings_use_form_defaults() {
        let store = Arc::new(MemoryStore::new());
        let app = App::with_storage(AppConfig::default(), store.clone()).unwrap();
        app.block_on(async {
            store
                .set(COUNTER_SETTINGS_KEY, r#"{"players":9,"life":20,"gameType":"MTG"}"#)
                .await
                .unwrap();
        });

        let snapshot = app.block_on(app.load_session());
        assert_eq!(snapshot.players, Player::roster(1, 20));

        let snapshot = app.block_on(app.reset_session());
        assert_eq!(snapshot.players, Player::roster(1, 20));
    }

    #[test]
    fn test_apply_delta_and_flush() {
        let (app, _store) = test_app();
        app.block_on(app.load_session());

        let snapshot = app.block_on(app.apply_delta(1, -3)).unwrap();
        assert_eq!(snapshot.players[0].life, 17);
        assert_eq!(snapshot.pending_for(1), -3);

        let snapshot = app.block_on(app.flush_session());
        assert_eq!(snapshot.players[0].history.len(), 1);
        assert_eq!(snapshot.players[0].history[0].delta, -3);
    }

    #[test]
    fn test_unknown_player_is_error() {
        let (app, _store) = test_app();
        app.block_on(app.load_session());

        let err = app.block_on(app.apply_delta(9, 1)).unwrap_err();
        assert_eq!(err, "Player 9 not found");
    }

    #[test]
    fn test_start_new_game_from_form() {
        let (app, _store) = test_app();
        app.block_on(app.load_session());
        app.block_on(app.apply_delta(1, 5)).unwrap();

        let form = app.block_on(app.edit_form(FormEdit::GameType(GameType::Edh)));
        assert_eq!(form.players(), "4");
        assert_eq!(form.life(), "40");

        let snapshot = app.block_on(app.start_new_game()).unwrap();
        assert_eq!(snapshot.players.len(), 4);
        assert!(snapshot.players.iter().all(|p| p.life == 40 && p.history.is_empty()));
    }

    #[test]
    fn test_invalid_form_blocks_start() {
        let (app, _store) = test_app();
        app.block_on(app.edit_form(FormEdit::Players("9".to_string())));

        let err = app.block_on(app.start_new_game()).unwrap_err();
        assert!(err.contains("Players must be an integer between 1 and 6."));
    }

    #[test]
    fn test_settings_survive_restart() {
        let store = Arc::new(MemoryStore::new());
        {
            let app = App::with_storage(AppConfig::default(), store.clone()).unwrap();
            app.block_on(app.edit_form(FormEdit::Players("3".to_string())));
            app.block_on(app.edit_form(FormEdit::Life("30".to_string())));
            app.block_on(async {
                app.start_new_game().await.unwrap();
                app.session.sync().await;
            });
        }

        let app = App::with_storage(AppConfig::default(), store).unwrap();
        let form = app.block_on(app.load_settings_form());
        assert_eq!(form.players(), "3");
        assert_eq!(form.life(), "30");

        let snapshot = app.block_on(app.load_session());
        assert_eq!(snapshot.players.len(), 3);
    }

    #[test]
    fn test_flick_rolls_once_until_finished() {
        let (app, _store) = test_app();

        assert_eq!(app.block_on(app.observe_motion(0.2)), None);
        let roll = app.block_on(app.observe_motion(2.0)).unwrap();
        assert!((1..=20).contains(&roll));

        // Ignored while the roll animates
        assert_eq!(app.block_on(app.observe_motion(0.0)), None);
        assert_eq!(app.block_on(app.observe_motion(3.0)), None);

        app.block_on(app.finish_roll());
        app.block_on(app.observe_motion(0.0));
        assert!(app.block_on(app.observe_motion(2.5)).is_some());
    }

    #[test]
    fn test_unknown_provider_label() {
        let (app, _store) = test_app();
        let err = app.block_on(app.set_provider("pokemon")).unwrap_err();
        assert_eq!(err, "Unknown provider: pokemon");
    }
}
