//! Scryfall provider (Magic: The Gathering)
//!
//! `GET {base}/cards/search?q=<query>&page=<n>` returns a paginated list object:
//!
//! ```text
//! { "object": "list", "total_cards": 12, "has_more": false, "data": [ { card }, ... ] }
//! ```
//!
//! A query matching nothing answers 404 with an `"object": "error"` body; that
//! is reported as an empty page, not a failure.

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use serde::Deserialize;
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use super::provider::CardProvider;
use crate::config::SearchConfig;
use crate::error::{CoreError, Result};
use crate::types::{CardSearchResult, SearchPage};

const PROVIDER_NAME: &str = "scryfall";

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: Option<Vec<ScryfallCard>>,
    #[serde(default)]
    has_more: bool,
    total_cards: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    object: String,
    #[serde(default)]
    details: String,
}

#[derive(Debug, Deserialize)]
struct ScryfallCard {
    id: String,
    name: String,
    image_uris: Option<ImageUris>,
    card_faces: Option<Vec<CardFace>>,
    type_line: Option<String>,
    set_name: Option<String>,
    prices: Option<Prices>,
}

#[derive(Debug, Deserialize)]
struct ImageUris {
    normal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CardFace {
    image_uris: Option<ImageUris>,
}

#[derive(Debug, Deserialize)]
struct Prices {
    eur: Option<String>,
    usd: Option<String>,
}

impl From<ScryfallCard> for CardSearchResult {
    fn from(card: ScryfallCard) -> Self {
        // Double-faced cards carry images per face
        let image = card
            .image_uris
            .and_then(|uris| uris.normal)
            .or_else(|| {
                card.card_faces
                    .and_then(|faces| faces.into_iter().next())
                    .and_then(|face| face.image_uris)
                    .and_then(|uris| uris.normal)
            });

        let price = card.prices.and_then(|p| p.eur.or(p.usd));

        CardSearchResult {
            id: card.id,
            name: card.name,
            image,
            type_line: card.type_line,
            set_name: card.set_name,
            price,
        }
    }
}

/// Decode a list response body into a page
pub(crate) fn parse_list(body: &str) -> Result<SearchPage> {
    let list: ListResponse = serde_json::from_str(body)?;
    let cards = list
        .data
        .unwrap_or_default()
        .into_iter()
        .map(CardSearchResult::from)
        .collect();

    Ok(SearchPage {
        cards,
        has_more: list.has_more,
        total_cards: list.total_cards,
    })
}

/// Whether a 404 body is the "no cards found" error object
pub(crate) fn is_not_found_body(body: &str) -> bool {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => {
            tracing::debug!("Scryfall: {}", err.details);
            err.object == "error"
        }
        Err(_) => false,
    }
}

/// Outcome of a non-success HTTP status
///
/// A 404 carrying the error object is "no cards matched", not a failure.
pub(crate) fn status_outcome(status: u16, body: &str) -> Result<SearchPage> {
    match status {
        404 if is_not_found_body(body) => Ok(SearchPage::empty()),
        429 => Err(CoreError::RateLimited),
        status => Err(CoreError::Http { status }),
    }
}

/// Scryfall HTTP client
pub struct ScryfallProvider {
    base_url: String,
    agent: ureq::Agent,
    limiter: DefaultDirectRateLimiter,
    timeout: Duration,
}

impl ScryfallProvider {
    pub fn new(config: &SearchConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(nonzero!(10u32));

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agent,
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
            timeout: config.timeout,
        }
    }

    fn search_url(&self) -> String {
        format!("{}/cards/search", self.base_url)
    }

    /// Block until the request budget allows another call
    fn throttle(&self) {
        let clock = DefaultClock::default();
        while let Err(not_until) = self.limiter.check() {
            let wait = not_until.wait_time_from(clock.now());
            tracing::debug!("Scryfall rate limit, waiting {:?}", wait);
            std::thread::sleep(wait);
        }
    }
}

impl CardProvider for ScryfallProvider {
    fn search(&self, query: &str, page: u32) -> Result<SearchPage> {
        self.throttle();

        let page = page.max(1);
        tracing::debug!("Scryfall search {:?} page {}", query, page);

        let response = self
            .agent
            .get(&self.search_url())
            .query("q", query)
            .query("page", &page.to_string())
            .call();

        match response {
            Ok(response) => {
                let body = response.into_string().map_err(|e| CoreError::InvalidResponse {
                    provider: PROVIDER_NAME.to_string(),
                    reason: e.to_string(),
                })?;
                parse_list(&body)
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                status_outcome(status, &body)
            }
            Err(ureq::Error::Transport(t)) if t.to_string().contains("timed out") => {
                Err(CoreError::Network(format!(
                    "timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

impl fmt::Debug for ScryfallProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScryfallProvider")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
