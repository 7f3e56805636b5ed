//! Cart: selected wagers with derived aggregates.
//!
//! The aggregates are recomputed from the full selection list after every
//! mutation, never patched incrementally.

use crate::types::{CartSelection, SelectionId};
use std::collections::HashSet;
use wager_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Cart state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CartState {
    items: Vec<CartSelection>,
    distinct_event_count: usize,
    total_price: i64,
}

impl CartState {
    /// Selections in insertion order
    #[must_use]
    pub fn items(&self) -> &[CartSelection] {
        &self.items
    }

    /// Number of selections
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart holds nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of unique events among the selections
    #[must_use]
    pub const fn distinct_event_count(&self) -> usize {
        self.distinct_event_count
    }

    /// Sum of the selections' outcome prices
    #[must_use]
    pub const fn total_price(&self) -> i64 {
        self.total_price
    }

    /// Find a selection by id
    #[must_use]
    pub fn get(&self, id: &SelectionId) -> Option<&CartSelection> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Whether a selection with this id is present
    #[must_use]
    pub fn contains(&self, id: &SelectionId) -> bool {
        self.get(id).is_some()
    }

    /// Append unless the id is already present; returns whether it was added
    fn insert(&mut self, selection: CartSelection) -> bool {
        if self.contains(&selection.id) {
            return false;
        }
        self.items.push(selection);
        self.recompute();
        true
    }

    fn remove(&mut self, id: &SelectionId) {
        self.items.retain(|item| &item.id != id);
        self.recompute();
    }

    fn clear(&mut self) {
        self.items.clear();
        self.recompute();
    }

    fn recompute(&mut self) {
        self.distinct_event_count = self
            .items
            .iter()
            .map(|item| item.event.id.as_str())
            .collect::<HashSet<_>>()
            .len();
        self.total_price = self.items.iter().map(|item| i64::from(item.price())).sum();
    }
}

impl FromIterator<CartSelection> for CartState {
    fn from_iter<I: IntoIterator<Item = CartSelection>>(iter: I) -> Self {
        let mut cart = Self::default();
        for selection in iter {
            cart.insert(selection);
        }
        cart
    }
}

/// Cart actions
#[derive(Clone, Debug, PartialEq)]
pub enum CartAction {
    /// Add a selection; a duplicate id is a no-op
    Add {
        /// The selection
        selection: CartSelection,
    },
    /// Remove a selection if present
    Remove {
        /// Composite id
        id: SelectionId,
    },
    /// Empty the cart
    Clear,
}

/// Cart environment
///
/// The cart needs no collaborators.
#[derive(Clone, Debug, Default)]
pub struct CartEnvironment;

/// Cart reducer
#[derive(Clone, Debug, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Create a new cart reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = CartEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CartAction::Add { selection } => {
                let id = selection.id.clone();
                if state.insert(selection) {
                    tracing::debug!(id = %id, items = state.len(), "Selection added");
                } else {
                    tracing::debug!(id = %id, "Duplicate selection ignored");
                }
            },
            CartAction::Remove { id } => {
                state.remove(&id);
                tracing::debug!(id = %id, items = state.len(), "Selection removed");
            },
            CartAction::Clear => {
                state.clear();
                tracing::debug!("Cart cleared");
            },
        }

        SmallVec::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wager_odds::{Bookmaker, Market, Outcome, WageringEvent};
    use wager_testing::{ReducerTest, assertions};

    fn selection(event_id: &str, outcome: &str, price: i32) -> CartSelection {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let outcome = Outcome {
            name: outcome.to_string(),
            price,
            point: None,
        };
        let market = Market {
            key: "h2h".to_string(),
            last_update: at,
            outcomes: vec![outcome.clone()],
        };
        let bookmaker = Bookmaker {
            key: "bet365".to_string(),
            title: "Bet365".to_string(),
            last_update: at,
            markets: vec![market.clone()],
        };
        let event = WageringEvent {
            id: event_id.to_string(),
            sport_key: "soccer".to_string(),
            sport_title: "Soccer".to_string(),
            commence_time: at,
            home_team: "Chelsea".to_string(),
            away_team: "Arsenal".to_string(),
            bookmakers: vec![bookmaker.clone()],
        };
        CartSelection::new(&event, &bookmaker, &market, &outcome)
    }

    #[test]
    fn add_remove_scenario() {
        let a = selection("E1", "Chelsea", 150);
        let b = selection("E1", "Arsenal", 210);
        let a_id = a.id.clone();
        let b_price = i64::from(b.price());

        ReducerTest::new(CartReducer::new())
            .with_env(CartEnvironment)
            .given_state(CartState::default())
            .when_action(CartAction::Add { selection: a.clone() })
            .when_action(CartAction::Add { selection: a })
            .then_state(|state| assert_eq!(state.len(), 1))
            .run();

        let reducer = CartReducer::new();
        let mut state: CartState = [selection("E1", "Chelsea", 150)].into_iter().collect();
        reducer.reduce(&mut state, CartAction::Add { selection: b }, &CartEnvironment);
        assert_eq!(state.len(), 2);
        assert_eq!(state.distinct_event_count(), 1);

        reducer.reduce(&mut state, CartAction::Remove { id: a_id }, &CartEnvironment);
        assert_eq!(state.len(), 1);
        assert_eq!(state.total_price(), b_price);
    }

    #[test]
    fn remove_missing_id_is_noop() {
        ReducerTest::new(CartReducer::new())
            .with_env(CartEnvironment)
            .given_state(CartState::from_iter([selection("E1", "Chelsea", 120)]))
            .when_action(CartAction::Remove {
                id: SelectionId::from("E9-bet365-h2h-Nobody"),
            })
            .then_state(|state| {
                assert_eq!(state.len(), 1);
                assert_eq!(state.total_price(), 120);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn clear_is_idempotent() {
        let filled: CartState = [selection("E1", "Chelsea", 120), selection("E2", "Arsenal", -150)]
            .into_iter()
            .collect();
        assert_eq!(filled.distinct_event_count(), 2);
        assert_eq!(filled.total_price(), -30);

        ReducerTest::new(CartReducer::new())
            .with_env(CartEnvironment)
            .given_state(filled)
            .when_action(CartAction::Clear)
            .when_action(CartAction::Clear)
            .then_state(|state| assert_eq!(state, &CartState::default()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
