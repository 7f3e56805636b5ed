//! # Wager Testing
//!
//! Shared test support for the storefront crates:
//!
//! - clocks that make fixture schedules and generated ids reproducible,
//! - the [`ReducerTest`] harness with its effect [`assertions`],
//! - [`init_test_tracing`] for tests that want runtime logs.
//!
//! ```ignore
//! #[tokio::test]
//! async fn fetch_lands_in_catalog() {
//!     init_test_tracing();
//!     let odds = FixtureOddsProvider::new(Arc::new(test_clock()));
//!     let store = Store::new(CatalogState::default(), CatalogReducer::new(), CatalogEnvironment::new(Arc::new(odds)));
//!
//!     let mut handle = store.send(CatalogAction::FetchBySport { sport: "soccer".into() }).await?;
//!     handle.wait().await;
//!     assert_eq!(store.state(|s| s.events.len()).await, 6);
//! }
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Mutex;
use wager_core::environment::Clock;


/// Deterministic [`Clock`] implementations
pub mod mocks {
    use super::{Clock, DateTime, Duration, Mutex, TimeZone, Utc};

    /// Clock stopped at one instant
    ///
    /// ```
    /// use chrono::Utc;
    /// use wager_core::environment::Clock;
    /// use wager_testing::FixedClock;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Stop the clock at `time`
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that advances by `step` after every read
    ///
    /// Stand-in identities derive their uid from the time, so consecutive
    /// sign-ins against this clock get distinct ids.
    #[derive(Debug)]
    pub struct SteppingClock {
        next: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl SteppingClock {
        /// First read returns `start`
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                next: Mutex::new(start),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let mut next = self.next.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let now = *next;
            *next = now + self.step;
            now
        }
    }

    /// Fixed clock at 2025-01-01T00:00:00Z
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap_or_default())
    }
}

/// Logging for tests
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Route `tracing` output through the test harness
    ///
    /// Filters with `RUST_LOG`, defaulting to `warn`. Only the first call in
    /// a test binary installs the subscriber.
    pub fn init_test_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

pub use helpers::init_test_tracing;
pub use mocks::{FixedClock, SteppingClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
