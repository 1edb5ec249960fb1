// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Non-empty string validation utilities
//!
//! [`NonEmptyString`] makes blank identifiers unrepresentable: every client
//! method that takes an address, principal, ticker or rune id converts it into
//! a `NonEmptyString` before any URL is built, so a blank value is rejected
//! without touching the network.
//!
//! ```rust
//! use external_apis::NonEmptyString;
//!
//! let address = NonEmptyString::new(" bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh ").unwrap();
//! assert_eq!(address.as_str(), "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh");
//!
//! assert!(NonEmptyString::new("   ").is_err());
//! ```

use core::fmt;
use std::str::FromStr;

/// A trimmed string guaranteed to contain at least one character
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyString(Box<str>);

impl NonEmptyString {
    /// Create a new `NonEmptyString`, trimming surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns a descriptive message if nothing is left after trimming.
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Err("String cannot be empty or whitespace-only".to_string())
        } else {
            Ok(NonEmptyString(trimmed.into()))
        }
    }

    /// Validate a named request identifier
    ///
    /// The error message names the missing field, e.g. `"id is required"`.
    pub fn required(field: &str, value: &str) -> Result<Self, String> {
        Self::new(value).map_err(|_| format!("{field} is required"))
    }

    /// Get a string slice of the contained value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NonEmptyString {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
