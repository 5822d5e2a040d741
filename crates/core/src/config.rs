//! Runtime configuration
//!
//! Product choices (flush interval, history ordering, search debounce) live here
//! as defaults rather than being hard-coded at the call sites.

use std::path::PathBuf;
use std::time::Duration;

/// Where new history entries are inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryOrder {
    /// Most recent entry at index 0
    #[default]
    NewestFirst,
    /// Most recent entry last
    OldestFirst,
}

/// Life-counter session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Inactivity period after which pending deltas become one history entry
    pub flush_interval: Duration,
    /// History insertion order
    pub history_order: HistoryOrder,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(1),
            history_order: HistoryOrder::NewestFirst,
        }
    }
}

/// Lower bound for the search input debounce
pub const MIN_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
/// Upper bound for the search input debounce
pub const MAX_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Card search configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Provider API root (no trailing slash)
    pub base_url: String,
    /// Caller-side inactivity before a search is issued
    pub debounce: Duration,
    /// Queries shorter than this (after trimming) clear the results
    pub min_query_len: usize,
    /// HTTP request timeout
    pub timeout: Duration,
    /// Client-side request budget
    pub requests_per_second: u32,
    /// Sent as User-Agent; the public API asks clients to identify themselves
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.scryfall.com".to_string(),
            debounce: MIN_SEARCH_DEBOUNCE,
            min_query_len: 2,
            timeout: Duration::from_secs(10),
            requests_per_second: 10,
            user_agent: format!("sideboard/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SearchConfig {
    /// Debounce clamped into the supported window
    pub fn effective_debounce(&self) -> Duration {
        self.debounce.clamp(MIN_SEARCH_DEBOUNCE, MAX_SEARCH_DEBOUNCE)
    }
}

/// Top-level configuration handed to the bridge at startup
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub search: SearchConfig,
    /// Override for the storage directory (platform data dir when None)
    pub data_dir: Option<PathBuf>,
}

/// Create session config with custom values
pub fn session_config(flush_interval: Duration, history_order: HistoryOrder) -> SessionConfig {
    SessionConfig {
        flush_interval,
        history_order,
    }
}
