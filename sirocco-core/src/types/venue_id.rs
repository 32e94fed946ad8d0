//! Venue ID type for identifying liquidity sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Venue ID type - identifies a tradeable liquidity source, either a
/// centralized exchange or a decentralized pool (e.g. "binance",
/// "uniswap-v3").
///
/// # Examples
///
/// ```
/// use sirocco_core::types::VenueId;
///
/// let venue = VenueId::new("binance").unwrap();
/// assert_eq!(venue.as_str(), "binance");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueId(String);

impl VenueId {
    /// Creates a new `VenueId` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyVenueId` if the string is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyVenueId);
        }
        Ok(Self(s))
    }

    /// Creates a new `VenueId` without validation.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the venue ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VenueId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for VenueId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
