//! Provider abstraction and registry

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use super::scryfall::ScryfallProvider;
use crate::config::SearchConfig;
use crate::error::Result;
use crate::types::SearchPage;

/// A card-data search backend
///
/// Calls block on network I/O; async callers run them on the blocking pool.
pub trait CardProvider: Send + Sync + Debug {
    /// Fetch one page (1-based) of results for `query`
    fn search(&self, query: &str, page: u32) -> Result<SearchPage>;

    /// Short name for logging
    fn name(&self) -> &'static str;
}

/// Selectable providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderKey {
    /// Magic: The Gathering (Scryfall)
    #[default]
    Mtg,
}

impl ProviderKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKey::Mtg => "mtg",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "mtg" => Some(ProviderKey::Mtg),
            _ => None,
        }
    }
}

/// Provider lookup by key
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKey, Arc<dyn CardProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in provider
    pub fn with_defaults(config: &SearchConfig) -> Self {
        let mut registry = Self::new();
        registry.register(ProviderKey::Mtg, Arc::new(ScryfallProvider::new(config)));
        registry
    }

    pub fn register(&mut self, key: ProviderKey, provider: Arc<dyn CardProvider>) {
        self.providers.insert(key, provider);
    }

    pub fn get(&self, key: ProviderKey) -> Option<Arc<dyn CardProvider>> {
        self.providers.get(&key).cloned()
    }
}
