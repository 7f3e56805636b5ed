//! Property-based tests for the cart reducer
//!
//! Random sequences of add, remove and clear must leave the derived
//! aggregates consistent with the selection list.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use sportsbook::cart::{CartAction, CartEnvironment, CartReducer, CartState};
use sportsbook::{CartSelection, SelectionId};
use std::collections::HashSet;
use wager_core::reducer::Reducer;
use wager_odds::{Bookmaker, Market, Outcome, WageringEvent};

const EVENTS: [&str; 4] = ["soccer_1", "soccer_2", "tennis_1", "hockey_4"];
const OUTCOMES: [&str; 3] = ["Home", "Away", "Draw"];

fn selection(event_idx: usize, outcome_idx: usize, price: i32) -> CartSelection {
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let outcome = Outcome {
        name: OUTCOMES[outcome_idx].to_string(),
        price,
        point: None,
    };
    let market = Market {
        key: "h2h".to_string(),
        last_update: at,
        outcomes: vec![outcome.clone()],
    };
    let bookmaker = Bookmaker {
        key: "draftkings".to_string(),
        title: "DraftKings".to_string(),
        last_update: at,
        markets: vec![market.clone()],
    };
    let event = WageringEvent {
        id: EVENTS[event_idx].to_string(),
        sport_key: "mixed".to_string(),
        sport_title: "Mixed".to_string(),
        commence_time: at,
        home_team: "Home".to_string(),
        away_team: "Away".to_string(),
        bookmakers: vec![bookmaker.clone()],
    };
    CartSelection::new(&event, &bookmaker, &market, &outcome)
}

fn action() -> impl Strategy<Value = CartAction> {
    prop_oneof![
        4 => (0..EVENTS.len(), 0..OUTCOMES.len(), -500..500i32)
            .prop_map(|(e, o, price)| CartAction::Add { selection: selection(e, o, price) }),
        2 => (0..EVENTS.len(), 0..OUTCOMES.len())
            .prop_map(|(e, o)| CartAction::Remove {
                id: SelectionId::new(EVENTS[e], "draftkings", "h2h", OUTCOMES[o]),
            }),
        1 => Just(CartAction::Clear),
    ]
}

fn apply(actions: Vec<CartAction>) -> CartState {
    let reducer = CartReducer::new();
    let mut state = CartState::default();
    for action in actions {
        let effects = reducer.reduce(&mut state, action, &CartEnvironment);
        assert!(effects.is_empty());
    }
    state
}

proptest! {
    /// No two selections ever share an id
    #[test]
    fn ids_stay_unique(actions in prop::collection::vec(action(), 0..40)) {
        let state = apply(actions);
        let ids: HashSet<_> = state.items().iter().map(|item| item.id.clone()).collect();
        prop_assert_eq!(ids.len(), state.len());
    }

    /// The total is always the sum of the held prices
    #[test]
    fn total_matches_items(actions in prop::collection::vec(action(), 0..40)) {
        let state = apply(actions);
        let expected: i64 = state.items().iter().map(|item| i64::from(item.price())).sum();
        prop_assert_eq!(state.total_price(), expected);
    }

    /// The distinct count is the number of unique event ids
    #[test]
    fn distinct_count_matches_items(actions in prop::collection::vec(action(), 0..40)) {
        let state = apply(actions);
        let events: HashSet<_> = state.items().iter().map(|item| item.event.id.clone()).collect();
        prop_assert_eq!(state.distinct_event_count(), events.len());
        prop_assert!(state.distinct_event_count() <= state.len());
    }

    /// The first add of an id wins; later adds never replace it
    #[test]
    fn first_add_wins(first in -500..500i32, second in -500..500i32) {
        let state = apply(vec![
            CartAction::Add { selection: selection(0, 0, first) },
            CartAction::Add { selection: selection(0, 0, second) },
        ]);
        prop_assert_eq!(state.len(), 1);
        prop_assert_eq!(state.total_price(), i64::from(first));
    }

    /// Clearing twice is the same as clearing once
    #[test]
    fn clear_is_idempotent(actions in prop::collection::vec(action(), 0..20)) {
        let mut once = actions.clone();
        once.push(CartAction::Clear);
        let mut twice = actions;
        twice.push(CartAction::Clear);
        twice.push(CartAction::Clear);

        let once = apply(once);
        prop_assert_eq!(&once, &apply(twice));
        prop_assert_eq!(once, CartState::default());
    }
}
