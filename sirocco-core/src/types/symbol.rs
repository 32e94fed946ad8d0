//! Symbol type for representing tradeable asset identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Symbol type - used for representing tradeable asset identifiers.
///
/// Wraps a `String` value with validation to ensure proper format.
/// Symbols are typically in the format "BTC-USDT" or "AAPL".
///
/// # Examples
///
/// ```
/// use sirocco_core::types::Symbol;
///
/// let symbol = Symbol::new("BTC-USDT").unwrap();
/// assert_eq!(symbol.as_str(), "BTC-USDT");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new `Symbol` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptySymbol` if the string is empty.
    /// Returns `ValidationError::InvalidSymbol` if the format is invalid.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        if !s
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/')
        {
            return Err(ValidationError::InvalidSymbol(s));
        }
        Ok(Self(s))
    }

    /// Creates a new `Symbol` without validation.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_new() {
        let symbol = Symbol::new("ETH-USDT").unwrap();
        assert_eq!(symbol.as_str(), "ETH-USDT");
    }

    #[test]
    fn test_symbol_rejects_empty() {
        assert!(matches!(Symbol::new(""), Err(ValidationError::EmptySymbol)));
    }

    #[test]
    fn test_symbol_rejects_invalid_chars() {
        assert!(matches!(
            Symbol::new("BTC USDT"),
            Err(ValidationError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn test_symbol_allows_slash() {
        assert!(Symbol::new("ETH/USDC").is_ok());
    }

    #[test]
    fn test_symbol_display() {
        let symbol = Symbol::new("SOL-USDT").unwrap();
        assert_eq!(symbol.to_string(), "SOL-USDT");
    }
}
