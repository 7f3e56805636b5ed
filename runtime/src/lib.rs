//! # Wager Runtime
//!
//! The [`Store`] that owns one feature's state, runs its reducer and
//! executes the effects the reducer returns.
//!
//! - State sits behind a single async `RwLock`; every reducer call holds the
//!   write lock, so mutations are exclusive read-modify-writes.
//! - Each [`Effect::Future`] runs on its own Tokio task. The action it
//!   yields is reduced like any other and then broadcast to observers.
//! - [`Store::send`] returns an [`EffectHandle`] that resolves once the
//!   effects started by that action, and the actions they fed back, are done.
//!
//! ```ignore
//! use wager_runtime::Store;
//!
//! let store = Store::new(CatalogState::default(), CatalogReducer::new(), env);
//!
//! let mut handle = store.send(CatalogAction::FetchBySport { sport: "soccer".into() }).await?;
//! handle.wait().await;
//!
//! let loaded = store.state(|s| s.events.len()).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, broadcast, watch};
use wager_core::{effect::Effect, reducer::Reducer};

/// Store errors
pub mod error {
    use thiserror::Error;

    /// Errors returned by [`Store`](crate::Store) operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// `shutdown` was called; no further actions are accepted
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Effects were still running when the shutdown timeout expired
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// The awaited outcome did not arrive in time
        #[error("Timed out waiting for the store")]
        Timeout,

        /// The action broadcast closed while waiting
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Effect-produced actions buffered per observer before it lags
const BROADCAST_CAPACITY: usize = 32;

/// Shared count of running effects; waiters watch it reach zero
#[derive(Clone)]
struct InFlight(Arc<watch::Sender<usize>>);

impl InFlight {
    fn new() -> Self {
        Self(Arc::new(watch::Sender::new(0)))
    }

    fn enter(&self) {
        self.0.send_modify(|running| *running += 1);
    }

    fn leave(&self) {
        self.0.send_modify(|running| *running = running.saturating_sub(1));
    }

    fn running(&self) -> usize {
        *self.0.borrow()
    }
}

/// Holds one effect's place in the per-send and store-wide counts
///
/// Released on drop, so a panicking effect still counts as finished.
struct EffectSlot {
    send: InFlight,
    store: InFlight,
}

impl EffectSlot {
    fn claim(send: &InFlight, store: &InFlight) -> Self {
        send.enter();
        store.enter();
        Self {
            send: send.clone(),
            store: store.clone(),
        }
    }
}

impl Drop for EffectSlot {
    fn drop(&mut self) {
        self.send.leave();
        self.store.leave();
    }
}

/// Awaitable completion of the effects started by one [`Store::send`]
///
/// ```ignore
/// let mut handle = store.send(SessionAction::SignOut).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // SignedOut (or AuthFailed) has been reduced
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    running: watch::Receiver<usize>,
}

impl EffectHandle {
    fn tracking(in_flight: &InFlight) -> Self {
        Self {
            running: in_flight.0.subscribe(),
        }
    }

    /// A handle with nothing to wait for
    #[must_use]
    pub fn completed() -> Self {
        Self {
            running: watch::Sender::new(0).subscribe(),
        }
    }

    /// Effects from this send still running
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.running.borrow()
    }

    /// Wait until every effect from this send has finished
    pub async fn wait(&mut self) {
        // Err means every slot was released and the sender dropped
        let _ = self.running.wait_for(|running| *running == 0).await;
    }

    /// [`wait`](Self::wait) with an upper bound
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running after `timeout`.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Store runtime
pub mod store {
    use super::{
        Arc, AtomicBool, BROADCAST_CAPACITY, Duration, Effect, EffectHandle, EffectSlot, InFlight,
        Instant, Ordering, Reducer, RwLock, StoreError, broadcast,
    };

    /// State shared by every clone of a store
    struct Shared<S, A> {
        state: RwLock<S>,
        closed: AtomicBool,
        in_flight: InFlight,
        actions: broadcast::Sender<A>,
    }

    /// Owns a feature's state and drives its reducer
    ///
    /// Clones share the same state, so spawned effects can feed actions back.
    ///
    /// # Type Parameters
    ///
    /// - `S`: state
    /// - `A`: action
    /// - `E`: environment handed to the reducer
    /// - `R`: reducer
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        shared: Arc<Shared<S, A>>,
        reducer: R,
        environment: E,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a store holding `initial_state`
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            let (actions, _) = broadcast::channel(BROADCAST_CAPACITY);
            Self {
                shared: Arc::new(Shared {
                    state: RwLock::new(initial_state),
                    closed: AtomicBool::new(false),
                    in_flight: InFlight::new(),
                    actions,
                }),
                reducer,
                environment,
            }
        }

        /// Effects running across all sends
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.shared.in_flight.running()
        }

        /// Stop accepting actions and wait for running effects to drain
        ///
        /// Only [`send`](Self::send) is refused. Effects that finish during
        /// the drain still have their actions reduced, and any effects those
        /// actions start are drained as well.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] with the number of effects
        /// still running when `timeout` expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            self.shared.closed.store(true, Ordering::Release);
            tracing::info!(pending = self.pending_effects(), "Store shutting down");

            let mut running = self.shared.in_flight.0.subscribe();
            let drained = tokio::time::timeout(timeout, running.wait_for(|n| *n == 0)).await;

            if drained.is_ok() {
                tracing::info!("Store drained");
                Ok(())
            } else {
                let pending = self.pending_effects();
                tracing::error!(pending, "Store shutdown timed out");
                metrics::counter!("wager_store_shutdown_timeouts_total").increment(1);
                Err(StoreError::ShutdownTimeout(pending))
            }
        }

        /// Reduce `action` and start the effects it returns
        ///
        /// Returns once the reducer has run; the effects continue in the
        /// background and are tracked by the returned handle.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
        #[tracing::instrument(skip_all, name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            self.accepting()?;
            let (handle, ()) = self.dispatch(action, false, |_| ()).await;
            Ok(handle)
        }

        /// [`send`](Self::send), also reading the state `action` left behind
        ///
        /// `read` runs under the same write lock as the reducer, so no other
        /// action can land in between.
        ///
        /// ```ignore
        /// let (mut handle, request) = store
        ///     .send_and_read(CatalogAction::FetchBySport { sport }, |s| s.latest_request)
        ///     .await?;
        /// ```
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
        pub async fn send_and_read<F, T>(&self, action: A, read: F) -> Result<(EffectHandle, T), StoreError>
        where
            R: Clone,
            E: Clone,
            F: FnOnce(&S) -> T,
        {
            self.accepting()?;
            Ok(self.dispatch(action, false, read).await)
        }

        /// Send `action`, then wait for the first effect-produced action
        /// matching `predicate`
        ///
        /// The observer subscribes before sending, so a fast outcome is never
        /// missed. Actions are broadcast after they are reduced, so the state
        /// already reflects the returned action.
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`] after shutdown
        /// - [`StoreError::Timeout`] if nothing matches within `timeout`
        /// - [`StoreError::ChannelClosed`] if the broadcast closes
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            F: Fn(&A) -> bool,
        {
            let mut observed = self.shared.actions.subscribe();
            self.send(action).await?;

            let outcome = async {
                loop {
                    match observed.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => return Err(StoreError::ChannelClosed),
                    }
                }
            };
            tokio::time::timeout(timeout, outcome)
                .await
                .map_err(|_| StoreError::Timeout)?
        }

        /// Observe every action produced by an effect, once it is reduced
        ///
        /// Actions passed to [`send`](Self::send) directly are not broadcast.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.shared.actions.subscribe()
        }

        /// Read the state through `f`
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            f(&*self.shared.state.read().await)
        }

        fn accepting(&self) -> Result<(), StoreError> {
            if self.shared.closed.load(Ordering::Acquire) {
                tracing::warn!("Action refused, store is shutting down");
                metrics::counter!("wager_store_refused_actions_total").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }
            Ok(())
        }

        /// Reduce, then start effects; `observed` actions are broadcast
        /// before the lock is released so observers see them in order
        async fn dispatch<F, T>(&self, action: A, observed: bool, read: F) -> (EffectHandle, T)
        where
            R: Clone,
            E: Clone,
            F: FnOnce(&S) -> T,
        {
            let (effects, read) = {
                let mut state = self.shared.state.write().await;
                let echo = observed.then(|| action.clone());
                let started = Instant::now();
                let effects = self.reducer.reduce(&mut state, action, &self.environment);
                metrics::histogram!("wager_store_reduce_seconds").record(started.elapsed().as_secs_f64());
                if let Some(action) = echo {
                    // No observers is not an error
                    let _ = self.shared.actions.send(action);
                }
                (effects, read(&*state))
            };
            metrics::counter!("wager_store_actions_total").increment(1);
            tracing::trace!(effects = effects.len(), "Action reduced");

            let in_flight = InFlight::new();
            let handle = EffectHandle::tracking(&in_flight);
            for effect in effects {
                self.spawn(effect, &in_flight);
            }
            (handle, read)
        }

        fn spawn(&self, effect: Effect<A>, in_flight: &InFlight)
        where
            R: Clone,
            E: Clone,
        {
            let Effect::Future(work) = effect else {
                return;
            };

            let slot = EffectSlot::claim(in_flight, &self.shared.in_flight);
            let store = self.clone();
            metrics::counter!("wager_store_effects_total").increment(1);

            tokio::spawn(async move {
                let _slot = slot;
                if let Some(action) = work.await {
                    // Feedback skips the shutdown check so a drain still lands results
                    let _ = store.dispatch(action, true, |_| ()).await;
                }
            });
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                shared: Arc::clone(&self.shared),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
            }
        }
    }
}

pub use store::Store;
