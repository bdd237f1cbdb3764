//! OAuth scope handling for the QuickBooks API.
//!
//! This module provides the [`AuthScopes`] type for managing OAuth scopes,
//! including parsing and wire-format serialization.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The scope granting access to the accounting API.
pub const SCOPE_ACCOUNTING: &str = "com.intuit.quickbooks.accounting";

/// The scope granting access to the payments API.
pub const SCOPE_PAYMENT: &str = "com.intuit.quickbooks.payment";

/// A set of OAuth scopes for QuickBooks API access.
///
/// This type handles parsing, deduplication, and the space-separated wire
/// format used at the authorization and token endpoints. Scopes keep their
/// requested order, since the provider echoes them back in grant order.
///
/// # Serialization
///
/// `AuthScopes` serializes to and deserializes from a space-separated string
/// for compact JSON representation:
///
/// ```rust
/// use quickbooks_api::AuthScopes;
///
/// let scopes: AuthScopes = "com.intuit.quickbooks.accounting openid".parse().unwrap();
/// let json = serde_json::to_string(&scopes).unwrap();
/// assert_eq!(json, r#""com.intuit.quickbooks.accounting openid""#);
/// ```
///
/// # Example
///
/// ```rust
/// use quickbooks_api::AuthScopes;
///
/// let scopes: AuthScopes = "com.intuit.quickbooks.accounting".parse().unwrap();
/// assert!(!scopes.is_empty());
///
/// // Check if scopes cover another set
/// let required: AuthScopes = "com.intuit.quickbooks.accounting".parse().unwrap();
/// assert!(scopes.covers(&required));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: Vec<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub const fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Creates a scope set covering the accounting API.
    #[must_use]
    pub fn accounting() -> Self {
        Self {
            scopes: vec![SCOPE_ACCOUNTING.to_string()],
        }
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns the number of scopes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns `true` if this scope set covers all scopes in `other`.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.scopes.iter().all(|s| self.scopes.contains(s))
    }

    /// Returns an iterator over the scopes in requested order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    fn push_unique(&mut self, scope: &str) {
        if !self.scopes.iter().any(|s| s == scope) {
            self.scopes.push(scope.to_string());
        }
    }
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = Self::new();

        // Accept both the space-separated wire form and comma-separated input
        for scope in s.split([' ', ',']) {
            let scope = scope.trim();
            if scope.is_empty() {
                continue;
            }

            // Scope names are dotted identifiers (e.g. com.intuit.quickbooks.accounting)
            if !scope
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
            {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("Invalid characters in scope: '{scope}'"),
                });
            }

            scopes.push_unique(scope);
        }

        Ok(scopes)
    }
}

impl From<Vec<String>> for AuthScopes {
    fn from(scopes: Vec<String>) -> Self {
        let mut result = Self::new();
        for scope in scopes {
            let scope = scope.trim();
            if !scope.is_empty() {
                result.push_unique(scope);
            }
        }
        result
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scopes.join(" "))
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Serialize as a space-separated string using the Display implementation
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
