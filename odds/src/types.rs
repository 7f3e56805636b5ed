//! Wire types for The Odds API
//!
//! Field names follow the provider's JSON schema, so these types are used
//! unchanged from the HTTP response through to the cart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A real-world contest available for betting
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WageringEvent {
    /// Provider event id
    pub id: String,
    /// Sport key, e.g. `soccer_epl`
    pub sport_key: String,
    /// Human readable sport name
    pub sport_title: String,
    /// Scheduled start
    pub commence_time: DateTime<Utc>,
    /// Home participant
    pub home_team: String,
    /// Away participant
    pub away_team: String,
    /// Offers, in provider order
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

impl WageringEvent {
    /// Case-insensitive substring match against both teams and the sport title
    ///
    /// A blank query matches everything. Surrounding whitespace in a
    /// non-blank query is part of the needle.
    ///
    /// ```
    /// # use wager_odds::WageringEvent;
    /// # use chrono::Utc;
    /// let event = WageringEvent {
    ///     id: "soccer_1".into(),
    ///     sport_key: "soccer".into(),
    ///     sport_title: "Soccer".into(),
    ///     commence_time: Utc::now(),
    ///     home_team: "Manchester United".into(),
    ///     away_team: "Liverpool".into(),
    ///     bookmakers: vec![],
    /// };
    /// assert!(event.matches_query("LIVER"));
    /// assert!(event.matches_query("socc"));
    /// assert!(!event.matches_query("madrid"));
    /// ```
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        if query.trim().is_empty() {
            return true;
        }

        let needle = query.to_lowercase();
        [&self.home_team, &self.away_team, &self.sport_title]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Find a bookmaker by key
    #[must_use]
    pub fn bookmaker(&self, key: &str) -> Option<&Bookmaker> {
        self.bookmakers.iter().find(|b| b.key == key)
    }
}

/// Keep only the events matching `query`
#[must_use]
pub fn filter_by_query(events: Vec<WageringEvent>, query: &str) -> Vec<WageringEvent> {
    if query.trim().is_empty() {
        return events;
    }
    events.into_iter().filter(|e| e.matches_query(query)).collect()
}

/// One bookmaker's offer for an event
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Bookmaker {
    /// Bookmaker key, e.g. `draftkings`
    pub key: String,
    /// Display title
    pub title: String,
    /// When the bookmaker last changed these odds
    pub last_update: DateTime<Utc>,
    /// Markets in provider order
    #[serde(default)]
    pub markets: Vec<Market>,
}

impl Bookmaker {
    /// Find a market by key
    #[must_use]
    pub fn market(&self, key: &str) -> Option<&Market> {
        self.markets.iter().find(|m| m.key == key)
    }
}

/// A betting market (`h2h`, `spreads`, `totals`)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Market {
    /// Market key
    pub key: String,
    /// When the market last changed
    pub last_update: DateTime<Utc>,
    /// Priced outcomes
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

/// A priced outcome within a market
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    /// Participant (or `Over`/`Under`)
    pub name: String,
    /// American odds: positive for the underdog, negative for the favorite
    pub price: i32,
    /// Spread or total line, where the market has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<f64>,
}

impl Outcome {
    /// Whether these odds mark the favorite
    #[must_use]
    pub const fn is_favorite(&self) -> bool {
        self.price < 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "e912304de2b2ce35b473ce2ecd3d1502",
        "sport_key": "americanfootball_nfl",
        "sport_title": "NFL",
        "commence_time": "2023-10-11T23:10:00Z",
        "home_team": "Houston Texans",
        "away_team": "Kansas City Chiefs",
        "bookmakers": [{
            "key": "draftkings",
            "title": "DraftKings",
            "last_update": "2023-10-10T12:10:29Z",
            "markets": [
                {
                    "key": "h2h",
                    "last_update": "2023-10-10T12:10:29Z",
                    "outcomes": [
                        { "name": "Houston Texans", "price": 190 },
                        { "name": "Kansas City Chiefs", "price": -230 }
                    ]
                },
                {
                    "key": "spreads",
                    "last_update": "2023-10-10T12:10:29Z",
                    "outcomes": [
                        { "name": "Houston Texans", "price": -110, "point": 5.5 },
                        { "name": "Kansas City Chiefs", "price": -110, "point": -5.5 }
                    ]
                }
            ]
        }]
    }"#;

    #[test]
    fn parses_provider_schema() {
        let event: WageringEvent = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(event.sport_title, "NFL");
        let draftkings = event.bookmaker("draftkings").unwrap();
        let spreads = draftkings.market("spreads").unwrap();
        assert_eq!(spreads.outcomes[0].point, Some(5.5));

        let h2h = draftkings.market("h2h").unwrap();
        assert_eq!(h2h.outcomes[1].price, -230);
        assert!(h2h.outcomes[1].is_favorite());
        assert_eq!(h2h.outcomes[0].point, None);
    }

    #[test]
    fn omits_missing_point_when_serializing() {
        let outcome = Outcome {
            name: "Draw".to_string(),
            price: 240,
            point: None,
        };

        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(json, r#"{"name":"Draw","price":240}"#);
    }

    #[test]
    fn filter_by_query_is_case_insensitive() {
        let event: WageringEvent = serde_json::from_str(SAMPLE).unwrap();
        let events = vec![event];

        assert_eq!(filter_by_query(events.clone(), "  ").len(), 1);
        assert_eq!(filter_by_query(events.clone(), "chiefs").len(), 1);
        assert_eq!(filter_by_query(events.clone(), "NFL").len(), 1);
        assert!(filter_by_query(events.clone(), " nfl ").is_empty());
        assert!(filter_by_query(events, "packers").is_empty());
    }
}
