//! Storefront coordinator - wires the stores to their collaborators.
//!
//! This module provides:
//! - [`Services`]: the odds, identity, telemetry and clock collaborators
//! - [`Storefront`]: the three feature stores and the intents that span them

mod coordinator;
mod services;

pub use coordinator::{CartStore, CatalogStore, SessionStore, Storefront};
pub use services::Services;
