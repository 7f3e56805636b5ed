//! Collaborators shared by the stores.

use crate::config::{Config, ConfigError};
use crate::identity::{IdentityProvider, RestIdentityProvider, StandInIdentityProvider};
use crate::provider::{FixtureOddsProvider, LiveOddsProvider, OddsProvider};
use crate::telemetry::{self, LogTelemetry, TelemetrySink};
use std::sync::Arc;
use wager_core::environment::{Clock, SystemClock};

/// External collaborators injected into the storefront
#[derive(Clone)]
pub struct Services {
    /// Source of events and odds
    pub odds: Arc<dyn OddsProvider>,
    /// Authentication backend
    pub identity: Arc<dyn IdentityProvider>,
    /// Analytics destination
    pub telemetry: Arc<dyn TelemetrySink>,
    /// Time source for receipts and fixtures
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// Fixtures, stand-in identities and log telemetry
    #[must_use]
    pub fn offline(clock: Arc<dyn Clock>) -> Self {
        Self {
            odds: Arc::new(FixtureOddsProvider::new(Arc::clone(&clock))),
            identity: Arc::new(StandInIdentityProvider::new(Arc::clone(&clock))),
            telemetry: Arc::new(LogTelemetry),
            clock,
        }
    }

    /// Build the collaborators described by `config`
    ///
    /// Each collaborator falls back to its offline stand-in when its
    /// credentials are missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let http = config.storefront.http_client()?;

        let odds = LiveOddsProvider::from_config(config, Arc::clone(&clock))?;

        let identity: Arc<dyn IdentityProvider> = match &config.identity.api_key {
            Some(key) => {
                tracing::info!(url = %config.identity.api_url, "Using identity REST API");
                Arc::new(RestIdentityProvider::new(
                    http.clone(),
                    config.identity.api_url.clone(),
                    key.clone(),
                ))
            },
            None => {
                tracing::info!("No identity API key, using stand-in identities");
                Arc::new(StandInIdentityProvider::new(Arc::clone(&clock)))
            },
        };

        Ok(Self {
            odds: Arc::new(odds),
            identity,
            telemetry: telemetry::from_config(&config.analytics, http),
            clock,
        })
    }
}
