//! Odds providers feeding the event catalog.
//!
//! [`LiveOddsProvider`] calls The Odds API and, when enabled, serves
//! [`fixtures`] whenever no usable key is configured or the live call fails.
//! [`FixtureOddsProvider`] serves fixtures only.

pub mod fixtures;

use crate::config::{Config, ConfigError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use wager_core::environment::Clock;
use wager_odds::{OddsClient, OddsError, WageringEvent, filter_by_query};

/// Boxed provider future
pub type OddsFuture<T> = Pin<Box<dyn Future<Output = Result<T, OddsError>> + Send>>;

/// Source of wagering events
///
/// Futures are boxed so the catalog environment can hold the provider as a
/// trait object.
pub trait OddsProvider: Send + Sync {
    /// All events for a sport
    fn events(&self, sport: &str) -> OddsFuture<Vec<WageringEvent>>;

    /// Events for a sport matching `query`; a blank query returns all of them
    fn search_events(&self, sport: &str, query: &str) -> OddsFuture<Vec<WageringEvent>>;

    /// One event with its odds
    fn event_details(&self, sport: &str, event_id: &str) -> OddsFuture<WageringEvent>;
}

/// Fixture-only provider
#[derive(Clone)]
pub struct FixtureOddsProvider {
    clock: Arc<dyn Clock>,
    latency: Duration,
}

impl FixtureOddsProvider {
    /// Serve fixtures scheduled relative to `clock`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            latency: Duration::ZERO,
        }
    }

    /// Simulate network latency; searches and lookups take half as long
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn list(&self, sport: &str) -> Vec<WageringEvent> {
        fixtures::fixture_events(sport, self.clock.now())
    }

    fn details(&self, sport: &str, event_id: &str) -> Result<WageringEvent, OddsError> {
        fixtures::fixture_event(sport, event_id, self.clock.now())
            .ok_or_else(|| OddsError::NotFound(format!("{sport}/{event_id}")))
    }
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

impl OddsProvider for FixtureOddsProvider {
    fn events(&self, sport: &str) -> OddsFuture<Vec<WageringEvent>> {
        tracing::debug!(sport, "Serving fixture events");
        let events = self.list(sport);
        let latency = self.latency;
        Box::pin(async move {
            simulate_latency(latency).await;
            Ok(events)
        })
    }

    fn search_events(&self, sport: &str, query: &str) -> OddsFuture<Vec<WageringEvent>> {
        tracing::debug!(sport, query, "Searching fixture events");
        let events = filter_by_query(self.list(sport), query);
        let latency = self.latency / 2;
        Box::pin(async move {
            simulate_latency(latency).await;
            Ok(events)
        })
    }

    fn event_details(&self, sport: &str, event_id: &str) -> OddsFuture<WageringEvent> {
        let event = self.details(sport, event_id);
        let latency = self.latency / 2;
        Box::pin(async move {
            simulate_latency(latency).await;
            event
        })
    }
}

/// The Odds API with optional fixture fallback
#[derive(Clone)]
pub struct LiveOddsProvider {
    client: OddsClient,
    fallback: Option<FixtureOddsProvider>,
}

impl LiveOddsProvider {
    /// Wrap a client; without a fallback every failure is surfaced
    #[must_use]
    pub const fn new(client: OddsClient) -> Self {
        Self {
            client,
            fallback: None,
        }
    }

    /// Serve `fixtures` when the key is unusable or a live call fails
    #[must_use]
    pub fn with_fallback(mut self, fixtures: FixtureOddsProvider) -> Self {
        self.fallback = Some(fixtures);
        self
    }

    /// Build the provider described by `config`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let client = OddsClient::new(config.odds.api_key.clone().unwrap_or_default())
            .with_http_client(config.storefront.http_client()?)
            .with_base_url(config.odds.api_url.clone())
            .with_regions(config.odds.regions.clone())
            .with_markets(config.odds.markets.clone());

        let provider = Self::new(client);
        if config.odds.fixture_fallback {
            let fixtures = FixtureOddsProvider::new(clock).with_latency(config.odds.fixture_latency());
            Ok(provider.with_fallback(fixtures))
        } else {
            Ok(provider)
        }
    }

    /// The fallback to use without calling the API at all
    fn offline_fallback(&self) -> Option<&FixtureOddsProvider> {
        if self.client.has_usable_key() {
            None
        } else {
            self.fallback.as_ref()
        }
    }
}

impl OddsProvider for LiveOddsProvider {
    fn events(&self, sport: &str) -> OddsFuture<Vec<WageringEvent>> {
        if let Some(fixtures) = self.offline_fallback() {
            return fixtures.events(sport);
        }

        let client = self.client.clone();
        let fallback = self.fallback.clone();
        let sport = sport.to_string();
        Box::pin(async move {
            match client.events(&sport).await {
                Ok(events) => Ok(events),
                Err(error) => match fallback {
                    Some(fixtures) => {
                        tracing::warn!(%error, sport = %sport, "Live odds fetch failed, serving fixtures");
                        fixtures.events(&sport).await
                    },
                    None => Err(error),
                },
            }
        })
    }

    fn search_events(&self, sport: &str, query: &str) -> OddsFuture<Vec<WageringEvent>> {
        if let Some(fixtures) = self.offline_fallback() {
            return fixtures.search_events(sport, query);
        }

        let client = self.client.clone();
        let fallback = self.fallback.clone();
        let sport = sport.to_string();
        let query = query.to_string();
        Box::pin(async move {
            match client.events(&sport).await {
                Ok(events) => Ok(filter_by_query(events, &query)),
                Err(error) => match fallback {
                    Some(fixtures) => {
                        tracing::warn!(%error, sport = %sport, "Live odds search failed, serving fixtures");
                        fixtures.search_events(&sport, &query).await
                    },
                    None => Err(error),
                },
            }
        })
    }

    fn event_details(&self, sport: &str, event_id: &str) -> OddsFuture<WageringEvent> {
        if let Some(fixtures) = self.offline_fallback() {
            return fixtures.event_details(sport, event_id);
        }

        // Live lookups are not backed by fixtures
        let client = self.client.clone();
        let sport = sport.to_string();
        let event_id = event_id.to_string();
        Box::pin(async move { client.event(&sport, &event_id).await })
    }
}
