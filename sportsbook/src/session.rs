//! Session: the signed-in identity, loading flag and last auth error.

use crate::error::describe;
use crate::identity::{Credentials, IdentityProvider};
use crate::types::Identity;
use std::sync::Arc;
use wager_core::{SmallVec, async_effect, effect::Effect, reducer::Reducer, smallvec};

/// Message shown when an auth call fails without one
pub const AUTH_FAILED: &str = "Authentication failed";

/// Session state
///
/// Starts in the loading state until the provider reports who is signed in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    /// Signed-in identity; `None` is the unauthenticated state
    pub identity: Option<Identity>,
    /// An auth call is in flight, or the initial state is unknown
    pub loading: bool,
    /// Message from the latest failed auth call
    pub error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: None,
            loading: true,
            error: None,
        }
    }
}

impl SessionState {
    /// Whether someone is signed in
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Session actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// Authenticate an existing account
    SignIn(Credentials),
    /// Create an account
    SignUp(Credentials),
    /// End the session
    SignOut,
    /// Identity pushed by the provider
    SetIdentity {
        /// Current identity
        identity: Option<Identity>,
    },
    /// Dismiss the current error
    ClearError,
    /// Sign-in or sign-up succeeded
    SignedIn {
        /// The authenticated identity
        identity: Identity,
    },
    /// Sign-out succeeded
    SignedOut,
    /// An auth call failed
    AuthFailed {
        /// Human readable reason
        message: String,
    },
}

impl SessionAction {
    /// Whether this ends an auth call
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SignedIn { .. } | Self::SignedOut | Self::AuthFailed { .. }
        )
    }
}

/// Session environment
#[derive(Clone)]
pub struct SessionEnvironment {
    /// Authentication backend
    pub identity: Arc<dyn IdentityProvider>,
}

impl SessionEnvironment {
    /// Create a new session environment
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }
}

/// Session reducer
#[derive(Clone, Debug, Default)]
pub struct SessionReducer;

impl SessionReducer {
    /// Create a new session reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn authenticate(
        state: &mut SessionState,
        credentials: Credentials,
        sign_up: bool,
        env: &SessionEnvironment,
    ) -> Effect<SessionAction> {
        state.loading = true;
        state.error = None;

        let provider = Arc::clone(&env.identity);
        async_effect! {
            let call = if sign_up {
                provider.sign_up(&credentials)
            } else {
                provider.sign_in(&credentials)
            };
            match call.await {
                Ok(identity) => Some(SessionAction::SignedIn { identity }),
                Err(error) => Some(SessionAction::AuthFailed {
                    message: describe(&error, AUTH_FAILED),
                }),
            }
        }
    }
}

impl Reducer for SessionReducer {
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SessionAction::SignIn(credentials) => {
                tracing::debug!(email = %credentials.email, "Signing in");
                smallvec![Self::authenticate(state, credentials, false, env)]
            },
            SessionAction::SignUp(credentials) => {
                tracing::debug!(email = %credentials.email, "Signing up");
                smallvec![Self::authenticate(state, credentials, true, env)]
            },
            SessionAction::SignOut => {
                state.loading = true;
                let provider = Arc::clone(&env.identity);
                smallvec![async_effect! {
                    match provider.sign_out().await {
                        Ok(()) => Some(SessionAction::SignedOut),
                        Err(error) => Some(SessionAction::AuthFailed {
                            message: describe(&error, AUTH_FAILED),
                        }),
                    }
                }]
            },
            SessionAction::SetIdentity { identity } => {
                state.identity = identity;
                state.loading = false;
                SmallVec::new()
            },
            SessionAction::ClearError => {
                state.error = None;
                SmallVec::new()
            },
            SessionAction::SignedIn { identity } => {
                tracing::info!(uid = %identity.uid, "Signed in");
                state.identity = Some(identity);
                state.loading = false;
                state.error = None;
                SmallVec::new()
            },
            SessionAction::SignedOut => {
                tracing::info!("Signed out");
                state.identity = None;
                state.loading = false;
                SmallVec::new()
            },
            SessionAction::AuthFailed { message } => {
                tracing::warn!(message = %message, "Authentication failed");
                state.loading = false;
                state.error = Some(message);
                SmallVec::new()
            },
        }
    }
}
