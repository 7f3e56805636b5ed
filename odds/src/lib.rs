//! # Odds API Client
//!
//! Rust client library for The Odds API (v4): upcoming wagering events per
//! sport, with every bookmaker's head-to-head, spread and totals markets in
//! American odds.
//!
//! ## Example
//!
//! ```no_run
//! use wager_odds::OddsClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OddsClient::new("my-api-key");
//!
//!     let events = client.events("soccer_epl").await?;
//!     for event in events.iter().filter(|e| e.matches_query("arsenal")) {
//!         println!("{} vs {}", event.home_team, event.away_team);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use client::{DEFAULT_BASE_URL, DEMO_API_KEY, OddsClient, is_usable_api_key};
pub use error::OddsError;
pub use types::{Bookmaker, Market, Outcome, WageringEvent, filter_by_query};
