//! # Sirocco Core
//!
//! Core types, errors, and collaborator traits for the Sirocco order
//! execution engine.
//!
//! This crate provides:
//! - `NewType` wrappers for financial primitives (Price, Quantity,
//!   Symbol, `VenueId`, `OrderId`, Timestamp)
//! - Market/venue value objects (`VenueQuote`, `Fill`, `OrderSide`)
//! - The error taxonomy (configuration, quote, and execution errors)
//! - Trait definitions for the external collaborators the engine
//!   consumes (quote provider, execution adapter, volume estimator)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]

/// Core type definitions and `NewType` wrappers
pub mod types;

/// Market and venue data structures
pub mod data;

/// Error types
pub mod error;

/// External collaborator trait definitions
pub mod traits;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::data::*;
    pub use crate::error::*;
    pub use crate::traits::*;
    pub use crate::types::*;
}
