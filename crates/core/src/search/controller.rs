//! Search screen state: debounced input, pagination, error retention
//!
//! Page 1 replaces the result list, later pages append. A failed request sets a
//! single user-visible message and keeps whatever was already loaded. Each
//! request carries a generation number; responses for a superseded request are
//! dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use super::provider::CardProvider;
use crate::config::SearchConfig;
use crate::debounce::Debouncer;
use crate::error::{CoreError, Result};
use crate::types::{CardSearchResult, SearchPage};

/// What the search screen renders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<CardSearchResult>,
    /// Last successfully loaded page (0 = none)
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

struct SearchShared {
    provider: Mutex<Arc<dyn CardProvider>>,
    state: Mutex<SearchState>,
    generation: AtomicU64,
    updates: watch::Sender<SearchState>,
}

impl SearchShared {
    fn publish(&self, state: &SearchState) {
        self.updates.send_replace(state.clone());
    }
}

/// Card search controller
///
/// Cheap to clone; clones share state. Must be used inside a Tokio runtime.
#[derive(Clone)]
pub struct SearchController {
    shared: Arc<SearchShared>,
    debouncer: Arc<Mutex<Debouncer<()>>>,
    config: SearchConfig,
}

impl SearchController {
    pub fn new(provider: Arc<dyn CardProvider>, config: SearchConfig) -> Self {
        let (updates, _) = watch::channel(SearchState::default());
        let debouncer = Debouncer::new(config.effective_debounce());

        Self {
            shared: Arc::new(SearchShared {
                provider: Mutex::new(provider),
                state: Mutex::new(SearchState::default()),
                generation: AtomicU64::new(0),
                updates,
            }),
            debouncer: Arc::new(Mutex::new(debouncer)),
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Fetch `page` of `query` now (no debounce)
    ///
    /// Returns the state after the request settles. Failures are reported
    /// through [`SearchState::error`], never as an `Err`.
    pub async fn search(&self, query: &str, page: u32) -> SearchState {
        let page = page.max(1);
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let previous_query = {
            let mut state = self.shared.state.lock().await;
            let previous = std::mem::replace(&mut state.query, query.to_string());
            state.loading = true;
            state.error = None;
            self.shared.publish(&state);
            previous
        };

        let provider = self.shared.provider.lock().await.clone();
        let outcome = Self::fetch(provider, query.to_string(), page).await;

        let mut state = self.shared.state.lock().await;
        if self.shared.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding stale results for {:?} page {}", query, page);
            return state.clone();
        }

        match outcome {
            Ok(result) => {
                tracing::debug!(
                    "{:?} page {}: {} cards, has_more={}",
                    query,
                    page,
                    result.cards.len(),
                    result.has_more
                );
                if page == 1 {
                    state.results = result.cards;
                } else {
                    state.results.extend(result.cards);
                }
                state.page = page;
                state.has_more = result.has_more;
            }
            Err(e) => {
                tracing::warn!("Card search failed for {:?} page {}: {}", query, page, e);
                state.error = Some(e.user_message());
                // Retained results belong to another query; do not page past them
                if page == 1 && previous_query != query {
                    state.has_more = false;
                }
            }
        }
        state.loading = false;
        self.shared.publish(&state);
        state.clone()
    }

    /// Load the page after the last loaded one, if there is one
    ///
    /// Returns `None` when there are no more pages or a request is in flight.
    pub async fn next_page(&self) -> Option<SearchState> {
        let (query, next) = {
            let state = self.shared.state.lock().await;
            if !state.has_more || state.loading {
                return None;
            }
            (state.query.clone(), state.page + 1)
        };
        Some(self.search(&query, next).await)
    }

    /// Record a keystroke; the search runs after the debounce period
    ///
    /// Queries shorter than the minimum length clear the results immediately.
    pub async fn set_query(&self, query: &str) {
        let query = query.trim().to_string();
        let mut debouncer = self.debouncer.lock().await;

        if query.chars().count() < self.config.min_query_len {
            debouncer.cancel(());
            self.clear(query).await;
            return;
        }

        let this = self.clone();
        debouncer.schedule((), async move {
            this.search(&query, 1).await;
        });
    }

    /// Switch provider and re-run the current query
    pub async fn set_provider(&self, provider: Arc<dyn CardProvider>) {
        tracing::info!("Search provider set to {}", provider.name());
        *self.shared.provider.lock().await = provider;

        let query = self.shared.state.lock().await.query.clone();
        self.set_query(&query).await;
    }

    /// Current state
    pub async fn state(&self) -> SearchState {
        self.shared.state.lock().await.clone()
    }

    /// Receive state after every change
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.updates.subscribe()
    }

    async fn clear(&self, query: String) {
        // Invalidate anything still in flight
        self.shared.generation.fetch_add(1, Ordering::SeqCst);

        let mut state = self.shared.state.lock().await;
        *state = SearchState {
            query,
            ..SearchState::default()
        };
        self.shared.publish(&state);
    }

    async fn fetch(provider: Arc<dyn CardProvider>, query: String, page: u32) -> Result<SearchPage> {
        tokio::task::spawn_blocking(move || provider.search(&query, page))
            .await
            .map_err(|e| CoreError::Network(format!("search task failed: {}", e)))?
    }
}
