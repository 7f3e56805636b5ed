//! Sportsbook storefront core.
//!
//! Three feature stores built on the Wager runtime, plus the collaborators
//! they talk to:
//!
//! - **Catalog**: wagering events for a sport, with search and request
//!   lifecycle flags
//! - **Cart**: selected outcomes with derived aggregates (distinct events,
//!   total price)
//! - **Session**: the signed-in identity and auth errors
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!   intents ───▶  │          Storefront          │ ───▶ TelemetrySink
//!                 └──────────────────────────────┘
//!                    │           │            │
//!                    ▼           ▼            ▼
//!               ┌─────────┐ ┌─────────┐ ┌──────────┐
//!               │ Catalog │ │  Cart   │ │ Session  │
//!               └─────────┘ └─────────┘ └──────────┘
//!                    │                        │
//!                    ▼                        ▼
//!              OddsProvider            IdentityProvider
//!           (live or fixtures)       (REST or stand-in)
//! ```
//!
//! Stores never call each other. Cross-store sequencing (sign-out empties
//! the cart, placing a bet clears it) and the auth guard on the cart live
//! in [`Storefront`].
//!
//! # Usage
//!
//! ```ignore
//! let storefront = Storefront::new(Services::offline(Arc::new(SystemClock)));
//! let events = storefront.load_events("soccer").await?;
//! storefront.sign_in("sam@example.com", "secret").await?;
//! ```

pub mod app;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod provider;
pub mod session;
pub mod telemetry;
pub mod types;

pub use app::{Services, Storefront};
pub use cart::{CartAction, CartReducer, CartState};
pub use catalog::{CatalogAction, CatalogReducer, CatalogState};
pub use config::Config;
pub use error::{Rejection, StorefrontError};
pub use identity::{AuthSubscription, IdentityProvider};
pub use provider::OddsProvider;
pub use session::{SessionAction, SessionReducer, SessionState};
pub use telemetry::{TelemetryEvent, TelemetrySink};
pub use types::*;
