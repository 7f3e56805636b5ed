//! Configuration management for the storefront.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Credentials left at the placeholder values shipped in sample `.env`
//! files count as unset, which switches the matching collaborator to its
//! offline stand-in.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Values that sample configuration uses in place of real credentials
const PLACEHOLDER_CREDENTIALS: [&str; 2] = ["demo", "demo_api_key"];

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        /// Variable name
        key: String,
        /// Raw value
        value: String,
        /// What was expected
        reason: String,
    },

    /// The HTTP client could not be built from the configured options
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Odds provider configuration
    pub odds: OddsConfig,
    /// Identity provider configuration
    pub identity: IdentityConfig,
    /// Telemetry configuration
    pub analytics: AnalyticsConfig,
    /// Storefront behaviour
    pub storefront: StorefrontConfig,
}

/// Odds provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OddsConfig {
    /// Base URL of The Odds API
    pub api_url: String,
    /// API key; `None` serves fixtures
    pub api_key: Option<String>,
    /// Bookmaker regions
    pub regions: String,
    /// Markets to request
    pub markets: String,
    /// Serve fixtures when the live call fails
    pub fixture_fallback: bool,
    /// Simulated latency for fixture responses, in milliseconds
    pub fixture_latency_ms: u64,
}

impl OddsConfig {
    /// Simulated fixture latency
    #[must_use]
    pub const fn fixture_latency(&self) -> Duration {
        Duration::from_millis(self.fixture_latency_ms)
    }
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Base URL of the identity REST API
    pub api_url: String,
    /// Web API key; `None` synthesizes stand-in identities
    pub api_key: Option<String>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyticsConfig {
    /// Measurement Protocol collection endpoint
    pub endpoint: String,
    /// Measurement id (`G-XXXXXXX`)
    pub measurement_id: Option<String>,
    /// Measurement Protocol API secret
    pub api_secret: Option<String>,
}

impl AnalyticsConfig {
    /// Both credentials, when the remote sink is configured
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.measurement_id.as_deref()?, self.api_secret.as_deref()?))
    }
}

/// Storefront behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Sport listed when none is chosen
    pub default_sport: String,
    /// Timeout for outbound HTTP calls, in seconds
    pub http_timeout_secs: u64,
    /// Graceful shutdown timeout, in seconds
    pub shutdown_timeout_secs: u64,
}

impl StorefrontConfig {
    /// Timeout for outbound HTTP calls
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Graceful shutdown timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Build the shared HTTP client
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the TLS backend cannot be
    /// initialised.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .timeout(self.http_timeout())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            odds: OddsConfig {
                api_url: wager_odds::DEFAULT_BASE_URL.to_string(),
                api_key: None,
                regions: "us".to_string(),
                markets: "h2h,spreads,totals".to_string(),
                fixture_fallback: true,
                fixture_latency_ms: 0,
            },
            identity: IdentityConfig {
                api_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
                api_key: None,
            },
            analytics: AnalyticsConfig {
                endpoint: "https://www.google-analytics.com/mp/collect".to_string(),
                measurement_id: None,
                api_secret: None,
            },
            storefront: StorefrontConfig {
                default_sport: "soccer".to_string(),
                http_timeout_secs: 10,
                shutdown_timeout_secs: 5,
            },
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric or boolean variable
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric or boolean variable
    /// cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);
        let secret = |key: &str| lookup(key).and_then(|v| credential(&v));

        Ok(Self {
            odds: OddsConfig {
                api_url: text("ODDS_API_URL", defaults.odds.api_url),
                api_key: secret("ODDS_API_KEY"),
                regions: text("ODDS_REGIONS", defaults.odds.regions),
                markets: text("ODDS_MARKETS", defaults.odds.markets),
                fixture_fallback: parse_bool(
                    "ODDS_FIXTURE_FALLBACK",
                    lookup("ODDS_FIXTURE_FALLBACK"),
                    defaults.odds.fixture_fallback,
                )?,
                fixture_latency_ms: parse_number(
                    "ODDS_FIXTURE_LATENCY_MS",
                    lookup("ODDS_FIXTURE_LATENCY_MS"),
                    defaults.odds.fixture_latency_ms,
                )?,
            },
            identity: IdentityConfig {
                api_url: text("IDENTITY_API_URL", defaults.identity.api_url),
                api_key: secret("IDENTITY_API_KEY"),
            },
            analytics: AnalyticsConfig {
                endpoint: text("ANALYTICS_ENDPOINT", defaults.analytics.endpoint),
                measurement_id: secret("ANALYTICS_MEASUREMENT_ID"),
                api_secret: secret("ANALYTICS_API_SECRET"),
            },
            storefront: StorefrontConfig {
                default_sport: text("DEFAULT_SPORT", defaults.storefront.default_sport),
                http_timeout_secs: parse_number(
                    "HTTP_TIMEOUT_SECS",
                    lookup("HTTP_TIMEOUT_SECS"),
                    defaults.storefront.http_timeout_secs,
                )?,
                shutdown_timeout_secs: parse_number(
                    "STORE_SHUTDOWN_TIMEOUT_SECS",
                    lookup("STORE_SHUTDOWN_TIMEOUT_SECS"),
                    defaults.storefront.shutdown_timeout_secs,
                )?,
            },
        })
    }
}

fn credential(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || PLACEHOLDER_CREDENTIALS.contains(&value) {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_number(key: &str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
            reason: "expected a non-negative integer".to_string(),
        }),
    }
}

fn parse_bool(key: &str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key: key.to_string(),
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.storefront.default_sport, "soccer");
        assert!(config.odds.fixture_fallback);
    }

    #[test]
    fn placeholder_credentials_count_as_unset() {
        let config = Config::from_lookup(lookup(&[
            ("ODDS_API_KEY", "demo"),
            ("IDENTITY_API_KEY", "demo_api_key"),
            ("ANALYTICS_MEASUREMENT_ID", "  "),
        ]))
        .unwrap();

        assert_eq!(config.odds.api_key, None);
        assert_eq!(config.identity.api_key, None);
        assert_eq!(config.analytics.credentials(), None);
    }

    #[test]
    fn real_values_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("ODDS_API_KEY", "abc123"),
            ("ODDS_FIXTURE_FALLBACK", "false"),
            ("ODDS_FIXTURE_LATENCY_MS", "250"),
            ("ANALYTICS_MEASUREMENT_ID", "G-TEST"),
            ("ANALYTICS_API_SECRET", "s3cret"),
            ("DEFAULT_SPORT", "tennis"),
        ]))
        .unwrap();

        assert_eq!(config.odds.api_key.as_deref(), Some("abc123"));
        assert!(!config.odds.fixture_fallback);
        assert_eq!(config.odds.fixture_latency(), Duration::from_millis(250));
        assert_eq!(config.analytics.credentials(), Some(("G-TEST", "s3cret")));
        assert_eq!(config.storefront.default_sport, "tennis");
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[("HTTP_TIMEOUT_SECS", "ten")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "HTTP_TIMEOUT_SECS"));

        let err = Config::from_lookup(lookup(&[("ODDS_FIXTURE_FALLBACK", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
