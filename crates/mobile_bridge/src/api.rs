//! Flutter Rust Bridge API
//!
//! FFI-safe functions and plain view structs for Dart. Call [`init_app`] once
//! at startup; every other function returns "Not initialized" until then.

use flutter_rust_bridge::frb;
use serde::Serialize;
use std::path::PathBuf;

use sideboard_core::search::SearchState;
use sideboard_core::settings::SettingsField;
use sideboard_core::{AppConfig, CardSearchResult, GameType, LifeChange, SessionSnapshot, SettingsForm};

use crate::app::{self, App, FormEdit};
use crate::logging;

// ===== Views =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifeChangeView {
    pub timestamp: u64,
    pub delta: i64,
    pub total: i64,
    /// "+3" / "-2"
    pub label: String,
}

impl From<&LifeChange> for LifeChangeView {
    fn from(change: &LifeChange) -> Self {
        Self {
            timestamp: change.timestamp,
            delta: change.delta,
            total: change.total,
            label: change.delta_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub id: u32,
    pub life: i64,
    /// Staged delta not yet in history (0 when idle)
    pub pending: i64,
    pub history: Vec<LifeChangeView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub players: Vec<PlayerView>,
}

impl From<SessionSnapshot> for SessionView {
    fn from(snapshot: SessionSnapshot) -> Self {
        let players = snapshot
            .players
            .iter()
            .map(|p| PlayerView {
                id: p.id,
                life: p.life,
                pending: snapshot.pending_for(p.id),
                history: p.history.iter().map(LifeChangeView::from).collect(),
            })
            .collect();
        Self { players }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsFormView {
    pub players: String,
    pub life: String,
    pub game_type: String,
    pub players_error: Option<String>,
    pub life_error: Option<String>,
    pub can_start: bool,
}

impl From<SettingsForm> for SettingsFormView {
    fn from(form: SettingsForm) -> Self {
        let errors = form.visible_errors();
        let message_for = |field: SettingsField| {
            errors
                .iter()
                .find(|e| e.field == field)
                .map(|e| e.message.clone())
        };

        Self {
            players_error: message_for(SettingsField::Players),
            life_error: message_for(SettingsField::Life),
            can_start: form.can_start(),
            players: form.players().to_string(),
            life: form.life().to_string(),
            game_type: form.game_type().as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub type_line: Option<String>,
    pub set_name: Option<String>,
    pub price: Option<String>,
}

impl From<CardSearchResult> for CardView {
    fn from(card: CardSearchResult) -> Self {
        Self {
            id: card.id,
            name: card.name,
            image: card.image,
            type_line: card.type_line,
            set_name: card.set_name,
            price: card.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchView {
    pub query: String,
    pub results: Vec<CardView>,
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl From<SearchState> for SearchView {
    fn from(state: SearchState) -> Self {
        Self {
            query: state.query,
            results: state.results.into_iter().map(CardView::from).collect(),
            page: state.page,
            has_more: state.has_more,
            loading: state.loading,
            error: state.error,
        }
    }
}

// ===== Lifecycle =====

/// Set up logging (`level` like "info" or "debug"); repeat calls are ignored
#[frb(sync)]
pub fn init_logging(level: String) -> Result<(), String> {
    logging::setup_logging(&level).map_err(|e| e.to_string())
}

/// Create the global app
///
/// `data_dir` is the app's documents directory on mobile; `None` uses the
/// platform data directory. Calling again keeps the first instance.
#[frb(sync)]
pub fn init_app(data_dir: Option<String>) -> Result<(), String> {
    let config = AppConfig {
        data_dir: data_dir.map(PathBuf::from),
        ..Default::default()
    };

    if app::current().is_ok() {
        return Ok(());
    }

    let app = App::new(config).map_err(|e| format!("{:#}", e))?;
    tracing::info!(
        "Sideboard {} initialized (data dir: {:?})",
        sideboard_core::APP_VERSION_STRING,
        app.config().data_dir
    );
    app::install(app).map(|_| ())
}

// ===== Life counter =====

/// Restore the saved game or start one from the last-used settings
#[frb]
pub async fn load_session() -> Result<SessionView, String> {
    let app = app::current()?;
    app.run(app.load_session()).await.map(SessionView::from)
}

/// Tap on a player's life total
#[frb]
pub async fn apply_delta(player_id: u32, delta: i64) -> Result<SessionView, String> {
    let app = app::current()?;
    app.run(app.apply_delta(player_id, delta))
        .await?
        .map(SessionView::from)
}

#[frb]
pub async fn session_snapshot() -> Result<SessionView, String> {
    let app = app::current()?;
    app.run(app.snapshot()).await.map(SessionView::from)
}

/// Flush pending history; call when the app goes to background
#[frb]
pub async fn flush_session() -> Result<SessionView, String> {
    let app = app::current()?;
    app.run(app.flush_session()).await.map(SessionView::from)
}

/// Restart with the same roster size and starting life
#[frb]
pub async fn reset_session() -> Result<SessionView, String> {
    let app = app::current()?;
    app.run(app.reset_session()).await.map(SessionView::from)
}

// ===== New game form =====

#[frb]
pub async fn load_settings_form() -> Result<SettingsFormView, String> {
    let app = app::current()?;
    app.run(app.load_settings_form())
        .await
        .map(SettingsFormView::from)
}

#[frb]
pub async fn set_form_players(text: String) -> Result<SettingsFormView, String> {
    edit_form(FormEdit::Players(text)).await
}

#[frb]
pub async fn set_form_life(text: String) -> Result<SettingsFormView, String> {
    edit_form(FormEdit::Life(text)).await
}

/// Select "MTG", "EDH" or "Lorcana"; loads that type's defaults
#[frb]
pub async fn select_game_type(label: String) -> Result<SettingsFormView, String> {
    let game_type =
        GameType::from_label(&label).ok_or_else(|| format!("Unknown game type: {}", label))?;
    edit_form(FormEdit::GameType(game_type)).await
}

/// Start a new game from the form; fails with the validation message
#[frb]
pub async fn start_new_game() -> Result<SessionView, String> {
    let app = app::current()?;
    app.run(app.start_new_game())
        .await?
        .map(SessionView::from)
}

#[frb(sync)]
pub fn game_types() -> Vec<String> {
    GameType::ALL.iter().map(|t| t.as_str().to_string()).collect()
}

async fn edit_form(edit: FormEdit) -> Result<SettingsFormView, String> {
    let app = app::current()?;
    app.run(app.edit_form(edit))
        .await
        .map(SettingsFormView::from)
}

// ===== Card search =====

/// Search immediately (page 1 replaces results, later pages append)
#[frb]
pub async fn search_cards(query: String, page: u32) -> Result<SearchView, String> {
    let app = app::current()?;
    app.run(app.search_cards(query, page))
        .await
        .map(SearchView::from)
}

/// Text field changed; the search runs once typing pauses
#[frb]
pub async fn set_search_query(query: String) -> Result<SearchView, String> {
    let app = app::current()?;
    app.run(app.set_search_query(query))
        .await
        .map(SearchView::from)
}

/// Load the next page when the list nears its end
#[frb]
pub async fn next_search_page() -> Result<SearchView, String> {
    let app = app::current()?;
    app.run(app.next_search_page())
        .await
        .map(SearchView::from)
}

#[frb]
pub async fn search_state() -> Result<SearchView, String> {
    let app = app::current()?;
    app.run(app.search_state()).await.map(SearchView::from)
}

#[frb]
pub async fn set_search_provider(label: String) -> Result<(), String> {
    let app = app::current()?;
    app.run(async move { app.set_provider(&label).await })
        .await?
}

// ===== Dice =====

/// Roll a d20
#[frb(sync)]
pub fn roll_d20() -> u8 {
    sideboard_core::roll_d20(&mut rand::thread_rng())
}

/// Feed a Z acceleration sample; returns a roll on a flick
#[frb]
pub async fn observe_motion(z: f64) -> Result<Option<u8>, String> {
    let app = app::current()?;
    app.run(app.observe_motion(z)).await
}

/// Roll animation finished; flicks are detected again
#[frb]
pub async fn finish_roll() -> Result<(), String> {
    let app = app::current()?;
    app.run(app.finish_roll()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sideboard_core::session::PendingDelta;
    use sideboard_core::{GameSettings, Player};

    #[test]
    fn test_session_view_carries_pending() {
        let mut player = Player::new(1, 17);
        player.history.push(LifeChange::new(1_000, -3, 17));
        let snapshot = SessionSnapshot {
            players: vec![player, Player::new(2, 22)],
            pending: vec![PendingDelta { player_id: 2, sum: 2 }],
        };

        let view = SessionView::from(snapshot);
        assert_eq!(view.players[0].pending, 0);
        assert_eq!(view.players[0].history[0].label, "-3");
        assert_eq!(view.players[1].pending, 2);
    }

    #[test]
    fn test_form_view_errors() {
        let mut form = SettingsForm::from_settings(&GameSettings::default());
        form.set_players("0");
        let view = SettingsFormView::from(form);

        assert_eq!(
            view.players_error.as_deref(),
            Some("Players must be an integer between 1 and 6.")
        );
        assert_eq!(view.life_error, None);
        assert!(!view.can_start);
        assert_eq!(view.game_type, "MTG");
    }

    #[test]
    fn test_empty_field_not_flagged() {
        let mut form = SettingsForm::default();
        form.set_life("");
        let view = SettingsFormView::from(form);

        assert_eq!(view.life_error, None);
        assert!(!view.can_start);
    }

    #[test]
    fn test_game_types_listed() {
        assert_eq!(game_types(), vec!["MTG", "EDH", "Lorcana"]);
    }

    #[test]
    fn test_roll_in_range() {
        for _ in 0..100 {
            assert!((1..=20).contains(&roll_d20()));
        }
    }
}
