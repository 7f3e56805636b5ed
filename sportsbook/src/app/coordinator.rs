//! The storefront: owns the catalog, cart and session stores.
//!
//! Every shopping intent enters here. The coordinator applies the auth
//! guard, sequences cross-store effects (sign-out empties the cart, a
//! placed bet clears it) and records telemetry. The stores themselves stay
//! unaware of each other.

use super::services::Services;
use crate::cart::{CartAction, CartEnvironment, CartReducer, CartState};
use crate::catalog::{CatalogAction, CatalogEnvironment, CatalogReducer, CatalogState};
use crate::config::{Config, ConfigError};
use crate::error::{Rejection, StorefrontError};
use crate::identity::{AuthSubscription, Credentials, IdentityProvider, observe_auth_changes};
use crate::provider::OddsProvider;
use crate::session::{AUTH_FAILED, SessionAction, SessionEnvironment, SessionReducer, SessionState};
use crate::telemetry::{SelectionParams, TelemetryEvent, TelemetrySink};
use crate::types::{BetReceipt, CartSelection, Identity, SelectionId};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wager_core::environment::Clock;
use wager_odds::{Bookmaker, Market, Outcome, WageringEvent};
use wager_runtime::Store;

/// Catalog store
pub type CatalogStore = Store<CatalogState, CatalogAction, CatalogEnvironment, CatalogReducer>;

/// Cart store
pub type CartStore = Store<CartState, CartAction, CartEnvironment, CartReducer>;

/// Session store
pub type SessionStore = Store<SessionState, SessionAction, SessionEnvironment, SessionReducer>;

/// How long an intent waits for its store to settle
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Slack on top of the slowest provider path
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(1);

/// Sportsbook storefront
pub struct Storefront {
    catalog: Arc<CatalogStore>,
    cart: Arc<CartStore>,
    session: Arc<SessionStore>,
    odds: Arc<dyn OddsProvider>,
    identity: Arc<dyn IdentityProvider>,
    telemetry: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
    request_timeout: Duration,
}

impl Storefront {
    /// Create the stores around `services`
    #[must_use]
    pub fn new(services: Services) -> Self {
        let catalog = Store::new(
            CatalogState::default(),
            CatalogReducer::new(),
            CatalogEnvironment::new(Arc::clone(&services.odds)),
        );
        let cart = Store::new(CartState::default(), CartReducer::new(), CartEnvironment);
        let session = Store::new(
            SessionState::default(),
            SessionReducer::new(),
            SessionEnvironment::new(Arc::clone(&services.identity)),
        );

        Self {
            catalog: Arc::new(catalog),
            cart: Arc::new(cart),
            session: Arc::new(session),
            odds: services.odds,
            identity: services.identity,
            telemetry: services.telemetry,
            clock: services.clock,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Build the storefront described by `config`
    ///
    /// Intents wait twice the HTTP timeout plus the fixture latency, so a
    /// live call that times out and falls back to fixtures lands well inside
    /// the wait.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a collaborator cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let services = Services::from_config(config)?;
        let timeout =
            config.storefront.http_timeout() * 2 + config.odds.fixture_latency() + REQUEST_TIMEOUT_MARGIN;
        Ok(Self::new(services).with_request_timeout(timeout))
    }

    /// Set how long intents wait for their store
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// How long intents wait for their store
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// The catalog store
    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// The cart store
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// The session store
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Snapshot of the catalog
    pub async fn catalog_state(&self) -> CatalogState {
        self.catalog.state(Clone::clone).await
    }

    /// Snapshot of the cart
    pub async fn cart_state(&self) -> CartState {
        self.cart.state(Clone::clone).await
    }

    /// Snapshot of the session
    pub async fn session_state(&self) -> SessionState {
        self.session.state(Clone::clone).await
    }

    // ========== Catalog ==========

    /// Load every event for `sport`
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Catalog`] with the catalog's error message
    /// when the request fails, [`StorefrontError::Superseded`] when a newer
    /// catalog request was issued before this one landed, or
    /// [`StorefrontError::Store`] on timeout.
    pub async fn load_events(&self, sport: &str) -> Result<Vec<WageringEvent>, StorefrontError> {
        self.run_catalog(CatalogAction::FetchBySport {
            sport: sport.to_string(),
        })
        .await
    }

    /// Hold `query` as the search string and load the matching events
    ///
    /// A blank query loads every event for the sport.
    ///
    /// # Errors
    ///
    /// See [`Storefront::load_events`].
    pub async fn search(&self, sport: &str, query: &str) -> Result<Vec<WageringEvent>, StorefrontError> {
        self.catalog
            .send(CatalogAction::SetSearchQuery {
                query: query.to_string(),
            })
            .await?;

        self.run_catalog(CatalogAction::Search {
            sport: sport.to_string(),
            query: query.to_string(),
        })
        .await
    }

    /// Look up one event and record the view
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Odds`] when the provider has no such event.
    pub async fn view_event(&self, sport: &str, event_id: &str) -> Result<WageringEvent, StorefrontError> {
        let event = self.odds.event_details(sport, event_id).await?;
        self.telemetry.record(TelemetryEvent::match_detail_viewed(&event));
        Ok(event)
    }

    async fn run_catalog(&self, action: CatalogAction) -> Result<Vec<WageringEvent>, StorefrontError> {
        let (mut handle, request) = self
            .catalog
            .send_and_read(action, |state| state.latest_request)
            .await?;
        handle.wait_with_timeout(self.request_timeout).await?;

        self.catalog
            .state(|state| {
                if state.latest_request != request {
                    tracing::debug!(request, latest = state.latest_request, "Catalog request superseded");
                    return Err(StorefrontError::Superseded);
                }
                match &state.error {
                    Some(message) => Err(StorefrontError::Catalog(message.clone())),
                    None => Ok(state.events.clone()),
                }
            })
            .await
    }

    // ========== Cart ==========

    /// Add an outcome to the cart
    ///
    /// Returns `false` when the selection was already present.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::Unauthenticated`] when nobody is signed in; the
    /// cart is left untouched.
    pub async fn add_to_cart(
        &self,
        event: &WageringEvent,
        bookmaker: &Bookmaker,
        market: &Market,
        outcome: &Outcome,
    ) -> Result<bool, StorefrontError> {
        self.require_identity().await?;

        let selection = CartSelection::new(event, bookmaker, market, outcome);
        if self.cart.state(|cart| cart.contains(&selection.id)).await {
            tracing::debug!(id = %selection.id, "Selection already in cart");
            return Ok(false);
        }

        let params = SelectionParams::from(&selection);
        self.cart.send(CartAction::Add { selection }).await?;
        self.telemetry.record(TelemetryEvent::AddToCart(params));
        Ok(true)
    }

    /// Remove a selection; returns whether it was present
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Store`] if the cart is shutting down.
    pub async fn remove_from_cart(&self, id: &SelectionId) -> Result<bool, StorefrontError> {
        let removed = self.cart.state(|cart| cart.get(id).map(SelectionParams::from)).await;

        self.cart.send(CartAction::Remove { id: id.clone() }).await?;

        Ok(match removed {
            Some(params) => {
                self.telemetry.record(TelemetryEvent::RemoveFromCart(params));
                true
            },
            None => false,
        })
    }

    /// Empty the cart
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Store`] if the cart is shutting down.
    pub async fn clear_cart(&self) -> Result<(), StorefrontError> {
        self.cart.send(CartAction::Clear).await?;
        Ok(())
    }

    /// Place the cart as a bet and empty it
    ///
    /// Nothing is settled; the receipt only summarizes the slip.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::Unauthenticated`] without a session and
    /// [`Rejection::EmptyCart`] when there is nothing to place.
    pub async fn place_bet(&self) -> Result<BetReceipt, StorefrontError> {
        let identity = self.require_identity().await?;

        let (selection_count, distinct_events, total_price) = self
            .cart
            .state(|cart| (cart.len(), cart.distinct_event_count(), cart.total_price()))
            .await;
        if selection_count == 0 {
            return Err(Rejection::EmptyCart.into());
        }

        self.cart.send(CartAction::Clear).await?;

        let receipt = BetReceipt {
            receipt_id: Uuid::new_v4(),
            user_id: identity.uid,
            selection_count,
            distinct_events,
            total_price,
            placed_at: self.clock.now(),
        };
        tracing::info!(
            receipt = %receipt.receipt_id,
            selections = selection_count,
            total_price,
            "Bet placed"
        );
        Ok(receipt)
    }

    // ========== Session ==========

    /// Sign in with an existing account
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Auth`] with the session's error message;
    /// the previous identity is kept.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, StorefrontError> {
        self.authenticate(SessionAction::SignIn(Credentials::new(email, password)))
            .await
    }

    /// Create an account and sign in
    ///
    /// # Errors
    ///
    /// See [`Storefront::sign_in`].
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, StorefrontError> {
        self.authenticate(SessionAction::SignUp(Credentials::new(email, password)))
            .await
    }

    /// End the session and empty the cart
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Auth`] if the provider refused; the cart is
    /// kept in that case.
    pub async fn sign_out(&self) -> Result<(), StorefrontError> {
        if let Some(identity) = self.session.state(|s| s.identity.clone()).await {
            self.telemetry.record(TelemetryEvent::Logout { user_id: identity.uid });
        }

        match self.await_session(SessionAction::SignOut).await? {
            SessionAction::SignedOut => {
                self.cart.send(CartAction::Clear).await?;
                Ok(())
            },
            SessionAction::AuthFailed { message } => Err(StorefrontError::Auth(message)),
            _ => Err(StorefrontError::Auth(AUTH_FAILED.to_string())),
        }
    }

    /// Mirror the identity provider's auth state into the session
    ///
    /// The current identity is applied first, which also ends the session's
    /// initial loading state. Dropping the subscription stops the bridge.
    #[must_use]
    pub fn observe_auth_changes(&self) -> AuthSubscription {
        let session = Arc::clone(&self.session);
        observe_auth_changes(self.identity.changes(), move |identity| {
            let session = Arc::clone(&session);
            async move {
                if let Err(error) = session.send(SessionAction::SetIdentity { identity }).await {
                    tracing::debug!(%error, "Identity change not applied");
                }
            }
        })
    }

    async fn authenticate(&self, action: SessionAction) -> Result<Identity, StorefrontError> {
        match self.await_session(action).await? {
            SessionAction::SignedIn { identity } => {
                self.telemetry.record(TelemetryEvent::Login {
                    user_id: identity.uid.clone(),
                });
                Ok(identity)
            },
            SessionAction::AuthFailed { message } => Err(StorefrontError::Auth(message)),
            _ => Err(StorefrontError::Auth(AUTH_FAILED.to_string())),
        }
    }

    /// Send an auth action and return the outcome once the session applied it
    async fn await_session(&self, action: SessionAction) -> Result<SessionAction, StorefrontError> {
        let outcome = self
            .session
            .send_and_wait_for(action, SessionAction::is_terminal, self.request_timeout)
            .await?;
        Ok(outcome)
    }

    async fn require_identity(&self) -> Result<Identity, Rejection> {
        self.session
            .state(|s| s.identity.clone())
            .await
            .ok_or(Rejection::Unauthenticated)
    }

    // ========== Lifecycle ==========

    /// Stop accepting intents and wait for in-flight requests
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Store`] if a store still had effects
    /// running when `timeout` expired.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StorefrontError> {
        tracing::info!("Shutting down storefront");
        futures::try_join!(
            self.catalog.shutdown(timeout),
            self.cart.shutdown(timeout),
            self.session.shutdown(timeout),
        )?;
        Ok(())
    }
}
