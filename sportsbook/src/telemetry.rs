//! Fire-and-forget analytics events.
//!
//! Recording never blocks and never fails the calling operation. The
//! Measurement Protocol sink sends from a spawned task and logs failures;
//! without credentials events go to the log instead.

use crate::config::AnalyticsConfig;
use crate::types::CartSelection;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;
use wager_odds::WageringEvent;

/// Cart line details attached to cart events
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectionParams {
    /// Event id
    pub event_id: String,
    /// Sport display name
    pub sport: String,
    /// Home participant
    pub home_team: String,
    /// Away participant
    pub away_team: String,
    /// Picked outcome
    pub outcome_name: String,
    /// Picked price
    pub outcome_price: i32,
    /// Bookmaker display title
    pub bookmaker: String,
    /// Market key
    pub market_type: String,
}

impl From<&CartSelection> for SelectionParams {
    fn from(selection: &CartSelection) -> Self {
        Self {
            event_id: selection.event.id.clone(),
            sport: selection.event.sport_title.clone(),
            home_team: selection.event.home_team.clone(),
            away_team: selection.event.away_team.clone(),
            outcome_name: selection.outcome.name.clone(),
            outcome_price: selection.outcome.price,
            bookmaker: selection.bookmaker.title.clone(),
            market_type: selection.market.key.clone(),
        }
    }
}

/// Analytics events emitted by the storefront
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TelemetryEvent {
    /// An event's details were opened
    MatchDetailViewed {
        /// Event id
        event_id: String,
        /// Sport display name
        sport: String,
        /// Home participant
        home_team: String,
        /// Away participant
        away_team: String,
        /// Scheduled start
        commence_time: DateTime<Utc>,
    },
    /// A selection entered the cart
    AddToCart(SelectionParams),
    /// A selection left the cart
    RemoveFromCart(SelectionParams),
    /// A user signed in or signed up
    Login {
        /// Provider user id
        user_id: String,
    },
    /// A user signed out
    Logout {
        /// Provider user id
        user_id: String,
    },
}

impl TelemetryEvent {
    /// Event viewed
    #[must_use]
    pub fn match_detail_viewed(event: &WageringEvent) -> Self {
        Self::MatchDetailViewed {
            event_id: event.id.clone(),
            sport: event.sport_title.clone(),
            home_team: event.home_team.clone(),
            away_team: event.away_team.clone(),
            commence_time: event.commence_time,
        }
    }

    /// Analytics event name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MatchDetailViewed { .. } => "match_detail_viewed",
            Self::AddToCart(_) => "add_to_cart",
            Self::RemoveFromCart(_) => "remove_from_cart",
            Self::Login { .. } => "login",
            Self::Logout { .. } => "logout",
        }
    }

    /// Event parameters as a JSON object
    #[must_use]
    pub fn params(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Destination for analytics events
pub trait TelemetrySink: Send + Sync {
    /// Record an event without waiting for delivery
    fn record(&self, event: TelemetryEvent);
}

/// Writes events to the log
#[derive(Clone, Debug, Default)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn record(&self, event: TelemetryEvent) {
        tracing::info!(
            target: "telemetry",
            event = event.name(),
            params = %event.params(),
            "Analytics event"
        );
    }
}

/// GA4 Measurement Protocol sink
#[derive(Clone)]
pub struct MeasurementProtocolTelemetry {
    client: reqwest::Client,
    endpoint: String,
    measurement_id: String,
    api_secret: String,
    client_id: String,
}

impl MeasurementProtocolTelemetry {
    /// Create a sink posting to `endpoint`
    ///
    /// Each sink reports under its own random client id.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        measurement_id: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            measurement_id: measurement_id.into(),
            api_secret: api_secret.into(),
            client_id: Uuid::new_v4().to_string(),
        }
    }

    fn payload(&self, event: &TelemetryEvent) -> Value {
        let mut body = json!({
            "client_id": self.client_id,
            "events": [{ "name": event.name(), "params": event.params() }],
        });
        if let TelemetryEvent::Login { user_id } | TelemetryEvent::Logout { user_id } = event {
            body["user_id"] = Value::String(user_id.clone());
        }
        body
    }
}

impl TelemetrySink for MeasurementProtocolTelemetry {
    fn record(&self, event: TelemetryEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(event = event.name(), "No runtime, dropping analytics event");
            return;
        };

        let request = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("measurement_id", self.measurement_id.as_str()),
                ("api_secret", self.api_secret.as_str()),
            ])
            .json(&self.payload(&event));
        let name = event.name();

        runtime.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::trace!(event = name, "Analytics event delivered");
                },
                Ok(response) => {
                    tracing::warn!(event = name, status = %response.status(), "Analytics endpoint refused event");
                },
                Err(error) => {
                    tracing::warn!(event = name, %error, "Analytics event not delivered");
                },
            }
        });
    }
}

/// Build the sink described by `config`
#[must_use]
pub fn from_config(config: &AnalyticsConfig, client: reqwest::Client) -> Arc<dyn TelemetrySink> {
    match config.credentials() {
        Some((measurement_id, api_secret)) => Arc::new(MeasurementProtocolTelemetry::new(
            client,
            config.endpoint.clone(),
            measurement_id,
            api_secret,
        )),
        None => {
            tracing::info!("Analytics not configured, logging events instead");
            Arc::new(LogTelemetry)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_params_carry_user_id() {
        let event = TelemetryEvent::Login {
            user_id: "mock_1".to_string(),
        };

        assert_eq!(event.name(), "login");
        assert_eq!(event.params(), json!({ "user_id": "mock_1" }));
    }

    #[test]
    fn measurement_payload_wraps_event() {
        let sink = MeasurementProtocolTelemetry::new(reqwest::Client::new(), "http://localhost", "G-1", "s");
        let payload = sink.payload(&TelemetryEvent::Logout {
            user_id: "u9".to_string(),
        });

        assert_eq!(payload["events"][0]["name"], "logout");
        assert_eq!(payload["events"][0]["params"]["user_id"], "u9");
        assert_eq!(payload["user_id"], "u9");
        assert_eq!(payload["client_id"], sink.client_id.as_str());
    }

    #[test]
    fn unconfigured_analytics_logs() {
        let config = AnalyticsConfig {
            endpoint: "http://localhost".to_string(),
            measurement_id: Some("G-1".to_string()),
            api_secret: None,
        };
        let sink = from_config(&config, reqwest::Client::new());

        // Must not panic outside a runtime
        sink.record(TelemetryEvent::Login {
            user_id: "u".to_string(),
        });
    }
}
