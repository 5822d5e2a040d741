//! Mock provider for testing
//!
//! Returns canned pages without any network access. Failures and latency can
//! be injected to exercise error and staleness handling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::provider::CardProvider;
use crate::error::{CoreError, Result};
use crate::types::{CardSearchResult, SearchPage};

/// Failure to inject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Network,
    Http(u16),
    Malformed,
}

impl MockFailure {
    fn to_error(self) -> CoreError {
        match self {
            MockFailure::Network => CoreError::Network("simulated connection reset".to_string()),
            MockFailure::Http(status) => CoreError::Http { status },
            MockFailure::Malformed => CoreError::InvalidResponse {
                provider: "mock".to_string(),
                reason: "simulated malformed body".to_string(),
            },
        }
    }
}

/// Canned-response provider
#[derive(Debug, Default)]
pub struct MockProvider {
    /// (query, page) -> page
    pages: Mutex<HashMap<(String, u32), SearchPage>>,
    /// page -> failure, applies to any query
    page_failures: Mutex<HashMap<u32, MockFailure>>,
    /// query -> artificial latency
    latency: Mutex<HashMap<String, Duration>>,
    call_count: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider answering `query` with `pages` consecutive pages of `per_page` cards
    pub fn with_pages(query: &str, pages: u32, per_page: usize) -> Self {
        let provider = Self::new();
        for page in 1..=pages {
            let cards = (0..per_page)
                .map(|i| Self::card(&format!("{} {}-{}", query, page, i)))
                .collect();
            provider.add_page(query, page, cards, page < pages);
        }
        provider
    }

    /// Build a minimal card named `name`
    pub fn card(name: &str) -> CardSearchResult {
        CardSearchResult {
            id: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            image: None,
            type_line: None,
            set_name: None,
            price: None,
        }
    }

    /// Register a canned page
    pub fn add_page(&self, query: &str, page: u32, cards: Vec<CardSearchResult>, has_more: bool) {
        let total = cards.len() as u32;
        lock(&self.pages).insert(
            (query.to_string(), page),
            SearchPage {
                cards,
                has_more,
                total_cards: Some(total),
            },
        );
    }

    /// Make every request for `page` fail
    pub fn fail_page(&self, page: u32, failure: MockFailure) {
        lock(&self.page_failures).insert(page, failure);
    }

    /// Stop failing `page`
    pub fn heal_page(&self, page: u32) {
        lock(&self.page_failures).remove(&page);
    }

    /// Delay responses for `query` (blocks the calling thread)
    pub fn set_latency(&self, query: &str, latency: Duration) {
        lock(&self.latency).insert(query.to_string(), latency);
    }

    /// Number of search calls so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl CardProvider for MockProvider {
    fn search(&self, query: &str, page: u32) -> Result<SearchPage> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let latency = lock(&self.latency).get(query).copied();
        if let Some(latency) = latency {
            std::thread::sleep(latency);
        }

        if let Some(failure) = lock(&self.page_failures).get(&page).copied() {
            return Err(failure.to_error());
        }

        Ok(lock(&self.pages)
            .get(&(query.to_string(), page))
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_pages() {
        let provider = MockProvider::with_pages("lotus", 2, 3);
        let first = provider.search("lotus", 1).unwrap();
        assert_eq!(first.cards.len(), 3);
        assert!(first.has_more);

        let second = provider.search("lotus", 2).unwrap();
        assert!(!second.has_more);
        assert_ne!(first.cards[0].id, second.cards[0].id);

        assert!(provider.search("unknown", 1).unwrap().cards.is_empty());
        assert_eq!(provider.call_count(), 3);
    }

    #[test]
    fn test_injected_failure() {
        let provider = MockProvider::with_pages("lotus", 2, 1);
        provider.fail_page(2, MockFailure::Http(500));
        assert!(matches!(
            provider.search("lotus", 2),
            Err(CoreError::Http { status: 500 })
        ));

        provider.heal_page(2);
        assert!(provider.search("lotus", 2).is_ok());
    }
}
