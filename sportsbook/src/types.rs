//! Domain types shared by the storefront stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use wager_odds::{Bookmaker, Market, Outcome, WageringEvent};

/// Composite identifier of a cart selection
///
/// Built from the event id, bookmaker key, market key and outcome name
/// joined with `-`, so picking the same outcome twice yields the same id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionId(String);

impl SelectionId {
    /// Derive the id for one outcome of one bookmaker's market
    #[must_use]
    pub fn new(event_id: &str, bookmaker_key: &str, market_key: &str, outcome_name: &str) -> Self {
        Self(format!("{event_id}-{bookmaker_key}-{market_key}-{outcome_name}"))
    }

    /// The id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SelectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SelectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A wager picked by the user, holding value copies of what was shown
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartSelection {
    /// Composite id, unique within a cart
    pub id: SelectionId,
    /// The event the outcome belongs to
    pub event: WageringEvent,
    /// Bookmaker offering the price
    pub bookmaker: Bookmaker,
    /// Market the outcome is part of
    pub market: Market,
    /// The picked outcome
    pub outcome: Outcome,
}

impl CartSelection {
    /// Build a selection, deriving its composite id
    #[must_use]
    pub fn new(event: &WageringEvent, bookmaker: &Bookmaker, market: &Market, outcome: &Outcome) -> Self {
        Self {
            id: SelectionId::new(&event.id, &bookmaker.key, &market.key, &outcome.name),
            event: event.clone(),
            bookmaker: bookmaker.clone(),
            market: market.clone(),
            outcome: outcome.clone(),
        }
    }

    /// Outcome price in American odds
    #[must_use]
    pub const fn price(&self) -> i32 {
        self.outcome.price
    }
}

/// An authenticated user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque provider id
    pub uid: String,
    /// Email address, if the provider shares it
    pub email: Option<String>,
    /// Display name, if any
    pub display_name: Option<String>,
}

/// Confirmation of a simulated bet placement
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetReceipt {
    /// Receipt id
    pub receipt_id: Uuid,
    /// Who placed the bet
    pub user_id: String,
    /// Number of selections in the slip
    pub selection_count: usize,
    /// Number of distinct events covered
    pub distinct_events: usize,
    /// Sum of the selections' prices
    pub total_price: i64,
    /// When the bet was placed
    pub placed_at: DateTime<Utc>,
}
