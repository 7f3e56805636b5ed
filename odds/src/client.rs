//! The Odds API client implementation

use crate::{error::OddsError, types::WageringEvent};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

/// Public v4 endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.the-odds-api.com/v4";

/// Placeholder key shipped in sample configuration; never sent to the API
pub const DEMO_API_KEY: &str = "demo";

/// Whether `api_key` is a real credential rather than absent or the placeholder
#[must_use]
pub fn is_usable_api_key(api_key: &str) -> bool {
    let key = api_key.trim();
    !key.is_empty() && key != DEMO_API_KEY
}

/// The Odds API client
#[derive(Clone)]
pub struct OddsClient {
    client: Client,
    api_key: String,
    base_url: String,
    regions: String,
    markets: String,
}

impl OddsClient {
    /// Create a new client with an explicit API key and default query options
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            regions: "us".to_string(),
            markets: "h2h,spreads,totals".to_string(),
        }
    }

    /// Use a pre-configured HTTP client (timeouts, proxies)
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Point the client at another deployment (or a mock server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bookmaker regions to request, comma separated
    #[must_use]
    pub fn with_regions(mut self, regions: impl Into<String>) -> Self {
        self.regions = regions.into();
        self
    }

    /// Markets to request, comma separated
    #[must_use]
    pub fn with_markets(mut self, markets: impl Into<String>) -> Self {
        self.markets = markets.into();
        self
    }

    /// Whether the configured key can be sent to the API
    #[must_use]
    pub fn has_usable_key(&self) -> bool {
        is_usable_api_key(&self.api_key)
    }

    /// Upcoming and live events for a sport, with odds
    ///
    /// # Errors
    ///
    /// Returns errors for a missing key, network failures, API errors, or
    /// parsing failures
    pub async fn events(&self, sport: &str) -> Result<Vec<WageringEvent>, OddsError> {
        self.get(&format!("{}/sports/{sport}/odds/", self.base_url))
            .await
    }

    /// A single event with odds
    ///
    /// # Errors
    ///
    /// Returns [`OddsError::NotFound`] for unknown event ids, plus the same
    /// errors as [`OddsClient::events`]
    pub async fn event(&self, sport: &str, event_id: &str) -> Result<WageringEvent, OddsError> {
        self.get(&format!(
            "{}/sports/{sport}/events/{event_id}/odds/",
            self.base_url
        ))
        .await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, OddsError> {
        if !self.has_usable_key() {
            return Err(OddsError::MissingApiKey);
        }

        tracing::debug!(url, "Requesting odds");

        let response = self
            .client
            .get(url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", self.regions.as_str()),
                ("markets", self.markets.as_str()),
                ("oddsFormat", "american"),
                ("dateFormat", "iso"),
            ])
            .send()
            .await
            .map_err(|e| OddsError::RequestFailed(e.to_string()))?;

        if let Some(remaining) = response
            .headers()
            .get("x-requests-remaining")
            .and_then(|v| v.to_str().ok())
        {
            tracing::debug!(remaining, "Odds API quota");
        }

        match response.status() {
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| OddsError::ResponseParseFailed(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(OddsError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(OddsError::RateLimited),
            StatusCode::NOT_FOUND => {
                let body = response.text().await.unwrap_or_default();
                Err(OddsError::NotFound(body))
            },
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(OddsError::ApiError {
                    status: status.as_u16(),
                    message: body,
                })
            },
        }
    }
}

impl std::fmt::Debug for OddsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OddsClient")
            .field("base_url", &self.base_url)
            .field("regions", &self.regions)
            .field("markets", &self.markets)
            .field("has_usable_key", &self.has_usable_key())
            .finish_non_exhaustive()
    }
}
