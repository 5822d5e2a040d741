//! Card search over external card-data providers
//!
//! ```text
//! SearchController ──► CardProvider ─┬─ ScryfallProvider (HTTP)
//!   (debounce,         (trait)       └─ MockProvider (tests)
//!    pagination)
//! ```

mod controller;
mod mock;
mod provider;
mod scryfall;

pub use controller::{SearchController, SearchState};
pub use mock::{MockFailure, MockProvider};
pub use provider::{CardProvider, ProviderKey, ProviderRegistry};
pub use scryfall::ScryfallProvider;
