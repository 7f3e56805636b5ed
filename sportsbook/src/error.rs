//! Storefront error types.

use thiserror::Error;
use wager_odds::OddsError;
use wager_runtime::StoreError;

/// Intents refused by the storefront before reaching a store
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Cart mutation or bet attempted without a session
    #[error("Please sign in to add selections to your cart")]
    Unauthenticated,

    /// Bet attempted with nothing in the cart
    #[error("Your cart is empty")]
    EmptyCart,
}

/// Errors returned by [`Storefront`](crate::app::Storefront) operations
#[derive(Error, Debug)]
pub enum StorefrontError {
    /// The intent was refused
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The catalog request failed and no fallback applied
    #[error("{0}")]
    Catalog(String),

    /// A newer catalog request was issued before this one landed
    #[error("Catalog request was superseded by a newer one")]
    Superseded,

    /// An odds lookup outside the catalog failed
    #[error(transparent)]
    Odds(#[from] OddsError),

    /// Sign-in, sign-up or sign-out failed; carries the session's message
    #[error("{0}")]
    Auth(String),

    /// The store runtime refused or timed out
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The error's message, or `fallback` when it has none
pub(crate) fn describe(error: &impl std::fmt::Display, fallback: &str) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
