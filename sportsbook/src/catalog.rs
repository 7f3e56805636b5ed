//! Event catalog: fetched events, request lifecycle and the search string.
//!
//! Every fetch or search is stamped with a request number. Only the
//! completion of the most recent request is applied; older completions are
//! dropped, so a slow response can never overwrite a newer one.

use crate::error::describe;
use crate::provider::OddsProvider;
use std::sync::Arc;
use wager_core::{SmallVec, async_effect, effect::Effect, reducer::Reducer, smallvec};
use wager_odds::WageringEvent;

/// Message shown when a fetch fails without one
pub const FETCH_FAILED: &str = "Failed to fetch events";

/// Message shown when a search fails without one
pub const SEARCH_FAILED: &str = "Failed to search events";

/// Catalog state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogState {
    /// Events from the latest successful request
    pub events: Vec<WageringEvent>,
    /// A request is in flight
    pub loading: bool,
    /// Message from the latest failed request
    pub error: Option<String>,
    /// Search box contents
    pub search_query: String,
    /// Number of the most recently issued request
    pub latest_request: u64,
}

/// Catalog actions
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogAction {
    /// Load all events for a sport
    FetchBySport {
        /// Sport key
        sport: String,
    },
    /// Load a sport's events matching a query
    Search {
        /// Sport key
        sport: String,
        /// Case-insensitive needle
        query: String,
    },
    /// Update the held search string without searching
    SetSearchQuery {
        /// New contents
        query: String,
    },
    /// Dismiss the current error
    ClearError,
    /// A request completed
    EventsLoaded {
        /// Request number
        request: u64,
        /// Result set
        events: Vec<WageringEvent>,
    },
    /// A request failed
    LoadFailed {
        /// Request number
        request: u64,
        /// Human readable reason
        message: String,
    },
}

/// Catalog environment
#[derive(Clone)]
pub struct CatalogEnvironment {
    /// Source of events
    pub odds: Arc<dyn OddsProvider>,
}

impl CatalogEnvironment {
    /// Create a new catalog environment
    #[must_use]
    pub fn new(odds: Arc<dyn OddsProvider>) -> Self {
        Self { odds }
    }
}

/// Catalog reducer
#[derive(Clone, Debug, Default)]
pub struct CatalogReducer;

impl CatalogReducer {
    /// Create a new catalog reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Enter the pending state and return the new request number
    fn begin(state: &mut CatalogState) -> u64 {
        state.latest_request += 1;
        state.loading = true;
        state.error = None;
        state.latest_request
    }

    fn fetch(state: &mut CatalogState, sport: String, env: &CatalogEnvironment) -> Effect<CatalogAction> {
        let request = Self::begin(state);
        tracing::debug!(request, sport = %sport, "Fetching events");

        let odds = Arc::clone(&env.odds);
        async_effect! {
            match odds.events(&sport).await {
                Ok(events) => Some(CatalogAction::EventsLoaded { request, events }),
                Err(error) => Some(CatalogAction::LoadFailed {
                    request,
                    message: describe(&error, FETCH_FAILED),
                }),
            }
        }
    }

    fn search(
        state: &mut CatalogState,
        sport: String,
        query: String,
        env: &CatalogEnvironment,
    ) -> Effect<CatalogAction> {
        let request = Self::begin(state);
        tracing::debug!(request, sport = %sport, query = %query, "Searching events");

        let odds = Arc::clone(&env.odds);
        async_effect! {
            match odds.search_events(&sport, &query).await {
                Ok(events) => Some(CatalogAction::EventsLoaded { request, events }),
                Err(error) => Some(CatalogAction::LoadFailed {
                    request,
                    message: describe(&error, SEARCH_FAILED),
                }),
            }
        }
    }
}

impl Reducer for CatalogReducer {
    type State = CatalogState;
    type Action = CatalogAction;
    type Environment = CatalogEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CatalogAction::FetchBySport { sport } => smallvec![Self::fetch(state, sport, env)],
            CatalogAction::Search { sport, query } => {
                if query.trim().is_empty() {
                    smallvec![Self::fetch(state, sport, env)]
                } else {
                    smallvec![Self::search(state, sport, query, env)]
                }
            },
            CatalogAction::SetSearchQuery { query } => {
                state.search_query = query;
                SmallVec::new()
            },
            CatalogAction::ClearError => {
                state.error = None;
                SmallVec::new()
            },
            CatalogAction::EventsLoaded { request, events } => {
                if request == state.latest_request {
                    state.loading = false;
                    state.events = events;
                } else {
                    tracing::debug!(request, latest = state.latest_request, "Dropping stale catalog response");
                }
                SmallVec::new()
            },
            CatalogAction::LoadFailed { request, message } => {
                if request == state.latest_request {
                    tracing::warn!(request, message = %message, "Catalog request failed");
                    state.loading = false;
                    state.error = Some(message);
                } else {
                    tracing::debug!(request, latest = state.latest_request, "Dropping stale catalog failure");
                }
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::{FixtureOddsProvider, OddsFuture};
    use wager_core::environment::Clock;
    use wager_odds::OddsError;
    use wager_testing::{ReducerTest, assertions, test_clock};

    struct FailingProvider;

    impl OddsProvider for FailingProvider {
        fn events(&self, _sport: &str) -> OddsFuture<Vec<WageringEvent>> {
            Box::pin(async { Err(OddsError::Unauthorized) })
        }

        fn search_events(&self, _sport: &str, _query: &str) -> OddsFuture<Vec<WageringEvent>> {
            Box::pin(async { Err(OddsError::RateLimited) })
        }

        fn event_details(&self, _sport: &str, _event_id: &str) -> OddsFuture<WageringEvent> {
            Box::pin(async { Err(OddsError::NotFound("none".to_string())) })
        }
    }

    fn fixture_env() -> CatalogEnvironment {
        CatalogEnvironment::new(Arc::new(FixtureOddsProvider::new(Arc::new(test_clock()))))
    }

    fn run_effect(effect: Effect<CatalogAction>) -> Option<CatalogAction> {
        match effect {
            Effect::Future(fut) => tokio_test::block_on(fut),
            other => unreachable!("expected a future effect, got {other:?}"),
        }
    }

    #[test]
    fn fetch_enters_pending_and_clears_error() {
        ReducerTest::new(CatalogReducer::new())
            .with_env(fixture_env())
            .given_state(CatalogState {
                error: Some("old".to_string()),
                ..CatalogState::default()
            })
            .when_action(CatalogAction::FetchBySport {
                sport: "soccer".to_string(),
            })
            .then_state(|state| {
                assert!(state.loading);
                assert_eq!(state.error, None);
                assert_eq!(state.latest_request, 1);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn fetch_effect_loads_fixture_events() {
        let reducer = CatalogReducer::new();
        let env = fixture_env();
        let mut state = CatalogState::default();

        let mut effects = reducer.reduce(
            &mut state,
            CatalogAction::FetchBySport {
                sport: "soccer".to_string(),
            },
            &env,
        );
        let completion = run_effect(effects.remove(0)).unwrap();
        assert!(matches!(completion, CatalogAction::EventsLoaded { request: 1, .. }));

        reducer.reduce(&mut state, completion, &env);
        assert!(!state.loading);
        assert_eq!(state.events.len(), 6);
    }

    #[test]
    fn blank_search_is_a_fetch() {
        let reducer = CatalogReducer::new();
        let env = fixture_env();

        let mut fetched = CatalogState::default();
        let mut effects = reducer.reduce(
            &mut fetched,
            CatalogAction::FetchBySport {
                sport: "tennis".to_string(),
            },
            &env,
        );
        let completion = run_effect(effects.remove(0)).unwrap();
        reducer.reduce(&mut fetched, completion, &env);

        let mut searched = CatalogState::default();
        let mut effects = reducer.reduce(
            &mut searched,
            CatalogAction::Search {
                sport: "tennis".to_string(),
                query: "  ".to_string(),
            },
            &env,
        );
        let completion = run_effect(effects.remove(0)).unwrap();
        reducer.reduce(&mut searched, completion, &env);

        assert_eq!(fetched.events, searched.events);
    }

    #[test]
    fn failure_keeps_previous_events() {
        let reducer = CatalogReducer::new();
        let env = CatalogEnvironment::new(Arc::new(FailingProvider));
        let previous = fixture_env();
        let mut state = CatalogState::default();

        let mut effects = reducer.reduce(
            &mut state,
            CatalogAction::FetchBySport {
                sport: "hockey".to_string(),
            },
            &previous,
        );
        let loaded = run_effect(effects.remove(0)).unwrap();
        reducer.reduce(&mut state, loaded, &previous);

        let mut effects = reducer.reduce(
            &mut state,
            CatalogAction::FetchBySport {
                sport: "hockey".to_string(),
            },
            &env,
        );
        let failed = run_effect(effects.remove(0)).unwrap();
        reducer.reduce(&mut state, failed, &env);

        assert!(!state.loading);
        assert_eq!(state.events.len(), 6);
        assert_eq!(state.error.as_deref(), Some("Unauthorized - invalid API key"));
    }

    #[test]
    fn search_failure_sets_error() {
        let reducer = CatalogReducer::new();
        let env = CatalogEnvironment::new(Arc::new(FailingProvider));
        let mut state = CatalogState::default();

        let mut effects = reducer.reduce(
            &mut state,
            CatalogAction::Search {
                sport: "soccer".to_string(),
                query: "arsenal".to_string(),
            },
            &env,
        );
        let failed = run_effect(effects.remove(0)).unwrap();
        assert!(matches!(failed, CatalogAction::LoadFailed { request: 1, .. }));

        reducer.reduce(&mut state, failed, &env);
        assert!(!state.loading);
        assert_eq!(
            state.error.as_deref(),
            Some("Rate limited - request quota exhausted")
        );
    }

    #[test]
    fn stale_completion_is_dropped() {
        let stale = fixture_events_for("soccer");
        ReducerTest::new(CatalogReducer::new())
            .with_env(fixture_env())
            .given_state(CatalogState {
                loading: true,
                latest_request: 2,
                ..CatalogState::default()
            })
            .when_action(CatalogAction::EventsLoaded {
                request: 1,
                events: stale,
            })
            .when_action(CatalogAction::LoadFailed {
                request: 1,
                message: "late".to_string(),
            })
            .then_state(|state| {
                assert!(state.loading);
                assert!(state.events.is_empty());
                assert_eq!(state.error, None);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn set_search_query_and_clear_error_are_synchronous() {
        ReducerTest::new(CatalogReducer::new())
            .with_env(fixture_env())
            .given_state(CatalogState {
                error: Some("Failed to fetch events".to_string()),
                ..CatalogState::default()
            })
            .when_action(CatalogAction::SetSearchQuery {
                query: "Lakers".to_string(),
            })
            .when_action(CatalogAction::ClearError)
            .then_state(|state| {
                assert_eq!(state.search_query, "Lakers");
                assert_eq!(state.error, None);
                assert!(!state.loading);
                assert_eq!(state.latest_request, 0);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    fn fixture_events_for(sport: &str) -> Vec<WageringEvent> {
        crate::provider::fixtures::fixture_events(sport, test_clock().now())
    }
}
