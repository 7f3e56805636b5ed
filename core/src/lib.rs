//! # Wager Core
//!
//! The building blocks every storefront feature is written with.
//!
//! A feature (event catalog, cart, session) is three types and a rule:
//!
//! - a **state** value owned by one store,
//! - an **action** enum naming every input, from user intents to the
//!   results of finished requests,
//! - an **environment** holding the collaborators the feature may call,
//! - and a [`Reducer`](reducer::Reducer) that applies an action to the state
//!   and hands back the async work to run as [`Effect`](effect::Effect)s.
//!
//! Reducers never await. Anything that talks to the network is returned as
//! an effect, executed by the runtime, and its outcome comes back as another
//! action.
//!
//! ```
//! use wager_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! #[derive(Default)]
//! struct Slip {
//!     legs: u32,
//! }
//!
//! enum SlipAction {
//!     AddLeg,
//!     Void,
//! }
//!
//! struct SlipReducer;
//!
//! impl Reducer for SlipReducer {
//!     type State = Slip;
//!     type Action = SlipAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, slip: &mut Slip, action: SlipAction, _env: &()) -> SmallVec<[Effect<SlipAction>; 4]> {
//!         match action {
//!             SlipAction::AddLeg => slip.legs += 1,
//!             SlipAction::Void => slip.legs = 0,
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! let mut slip = Slip::default();
//! SlipReducer.reduce(&mut slip, SlipAction::AddLeg, &());
//! SlipReducer.reduce(&mut slip, SlipAction::AddLeg, &());
//! assert_eq!(slip.legs, 2);
//! ```

pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

/// Macros for building effects
pub mod effect_macros;

/// The reducer trait
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// Applies actions to a feature's state
    ///
    /// `reduce` must be deterministic for a given state, action and
    /// environment: all I/O goes into the returned effects. The store calls
    /// it while holding the state's write lock, so it should return quickly.
    ///
    /// ```ignore
    /// impl Reducer for CartReducer {
    ///     type State = CartState;
    ///     type Action = CartAction;
    ///     type Environment = CartEnvironment;
    ///
    ///     fn reduce(&self, state: &mut CartState, action: CartAction, _env: &CartEnvironment)
    ///         -> SmallVec<[Effect<CartAction>; 4]>
    ///     {
    ///         if let CartAction::Clear = action {
    ///             state.clear();
    ///         }
    ///         SmallVec::new()
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// Feature state
        type State;

        /// Inputs the feature accepts
        type Action;

        /// Collaborators available to effects
        type Environment;

        /// Apply `action` to `state` and describe the follow-up work
        ///
        /// Every returned effect runs independently. Most actions produce
        /// none, hence the inline capacity.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect descriptions
pub mod effect {
    use std::fmt;
    use std::future::Future;
    use std::pin::Pin;

    /// Work a reducer asks the runtime to perform
    pub enum Effect<Action> {
        /// Nothing to do
        None,

        /// Async computation; a returned action is fed back to the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> Effect<Action> {
        /// Whether this effect does nothing
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Self::None)
        }
    }

    impl<Action> fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::None => f.write_str("Effect::None"),
                Self::Future(_) => f.write_str("Effect::Future(..)"),
            }
        }
    }
}

/// Injected collaborators shared by every feature
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Source of the current time
    ///
    /// Fixture schedules, stand-in identity ids and bet receipts all read
    /// the time through this trait so tests can pin it.
    ///
    /// ```
    /// use wager_core::environment::{Clock, SystemClock};
    ///
    /// let before = SystemClock.now();
    /// assert!(SystemClock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
