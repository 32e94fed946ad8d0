//! Market and venue data structures.
//!
//! This module provides the value objects exchanged with external
//! collaborators:
//! - [`OrderSide`] - Buy or Sell direction
//! - [`VenueQuote`] - A single venue's quote for a requested quantity
//! - [`Fill`] - The result of a child order placement

mod fill;
mod quote;
mod side;

pub use fill::Fill;
pub use quote::VenueQuote;
pub use side::OrderSide;
