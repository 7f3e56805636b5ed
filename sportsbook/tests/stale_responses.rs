//! Out-of-order catalog responses through the store runtime

#![allow(clippy::unwrap_used)]

use sportsbook::catalog::{CatalogAction, CatalogEnvironment, CatalogReducer, CatalogState};
use sportsbook::provider::{FixtureOddsProvider, OddsFuture, OddsProvider};
use sportsbook::{Services, Storefront, StorefrontError};
use std::sync::Arc;
use std::time::Duration;
use wager_odds::WageringEvent;
use wager_runtime::Store;
use wager_testing::{init_test_tracing, test_clock};

/// Fixture odds where one sport answers slowly
struct SlowSport {
    fixtures: FixtureOddsProvider,
    slow: &'static str,
    delay: Duration,
}

impl SlowSport {
    fn delay_for(&self, sport: &str) -> Duration {
        if sport == self.slow {
            self.delay
        } else {
            Duration::ZERO
        }
    }
}

impl OddsProvider for SlowSport {
    fn events(&self, sport: &str) -> OddsFuture<Vec<WageringEvent>> {
        let delay = self.delay_for(sport);
        let events = self.fixtures.events(sport);
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            events.await
        })
    }

    fn search_events(&self, sport: &str, query: &str) -> OddsFuture<Vec<WageringEvent>> {
        let delay = self.delay_for(sport);
        let events = self.fixtures.search_events(sport, query);
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            events.await
        })
    }

    fn event_details(&self, sport: &str, event_id: &str) -> OddsFuture<WageringEvent> {
        self.fixtures.event_details(sport, event_id)
    }
}

fn slow_soccer() -> SlowSport {
    init_test_tracing();
    SlowSport {
        fixtures: FixtureOddsProvider::new(Arc::new(test_clock())),
        slow: "soccer",
        delay: Duration::from_millis(150),
    }
}

fn catalog_store() -> Store<CatalogState, CatalogAction, CatalogEnvironment, CatalogReducer> {
    Store::new(
        CatalogState::default(),
        CatalogReducer::new(),
        CatalogEnvironment::new(Arc::new(slow_soccer())),
    )
}

#[tokio::test]
async fn slow_older_fetch_does_not_overwrite_newer() {
    let store = catalog_store();

    let mut slow = store
        .send(CatalogAction::FetchBySport {
            sport: "soccer".to_string(),
        })
        .await
        .unwrap();
    let mut fast = store
        .send(CatalogAction::FetchBySport {
            sport: "tennis".to_string(),
        })
        .await
        .unwrap();

    fast.wait_with_timeout(Duration::from_secs(2)).await.unwrap();
    let after_fast = store.state(Clone::clone).await;
    assert!(!after_fast.loading);
    assert_eq!(after_fast.events[0].id, "tennis_1");

    slow.wait_with_timeout(Duration::from_secs(2)).await.unwrap();
    let after_slow = store.state(Clone::clone).await;
    assert_eq!(after_slow.events, after_fast.events);
    assert_eq!(after_slow.latest_request, 2);
}

#[tokio::test]
async fn slow_search_is_superseded_by_fetch() {
    let store = catalog_store();
    let mut outcomes = store.subscribe_actions();

    store
        .send(CatalogAction::Search {
            sport: "soccer".to_string(),
            query: "milan".to_string(),
        })
        .await
        .unwrap();
    let mut fetch = store
        .send(CatalogAction::FetchBySport {
            sport: "hockey".to_string(),
        })
        .await
        .unwrap();
    fetch.wait_with_timeout(Duration::from_secs(2)).await.unwrap();

    // Both completions are still produced; only the newest is applied
    let mut completed = Vec::new();
    while completed.len() < 2 {
        let action = tokio::time::timeout(Duration::from_secs(2), outcomes.recv())
            .await
            .unwrap()
            .unwrap();
        if let CatalogAction::EventsLoaded { request, .. } = action {
            completed.push(request);
        }
    }
    assert_eq!(completed, [2, 1]);

    store.shutdown(Duration::from_secs(1)).await.unwrap();
    let state = store.state(Clone::clone).await;
    assert_eq!(state.events.len(), 6);
    assert!(state.events.iter().all(|e| e.sport_key == "hockey"));
}

#[tokio::test]
async fn superseded_load_is_not_reported_as_success() {
    let services = Services {
        odds: Arc::new(slow_soccer()),
        ..Services::offline(Arc::new(test_clock()))
    };
    let storefront = Storefront::new(services).with_request_timeout(Duration::from_secs(2));

    let (soccer, tennis) = tokio::join!(storefront.load_events("soccer"), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        storefront.load_events("tennis").await
    });

    let tennis = tennis.unwrap();
    assert_eq!(tennis[0].id, "tennis_1");
    assert!(matches!(soccer, Err(StorefrontError::Superseded)));

    let catalog = storefront.catalog_state().await;
    assert_eq!(catalog.events, tennis);
    assert!(!catalog.loading);
}

#[tokio::test]
async fn search_superseded_by_fetch_reports_superseded() {
    let services = Services {
        odds: Arc::new(slow_soccer()),
        ..Services::offline(Arc::new(test_clock()))
    };
    let storefront = Storefront::new(services).with_request_timeout(Duration::from_secs(2));

    let (search, fetch) = tokio::join!(storefront.search("soccer", "chelsea"), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        storefront.load_events("hockey").await
    });

    assert!(matches!(search, Err(StorefrontError::Superseded)));
    assert_eq!(fetch.unwrap().len(), 6);
}
