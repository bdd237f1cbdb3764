//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated OAuth2 client ID.
///
/// This newtype ensures the client ID is non-empty and provides type safety
/// to prevent accidental misuse of raw strings.
///
/// # Example
///
/// ```rust
/// use quickbooks_api::ClientId;
///
/// let id = ClientId::new("my-client-id").unwrap();
/// assert_eq!(id.as_ref(), "my-client-id");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientId(String);

impl ClientId {
    /// Creates a new validated client ID.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyClientId`] if the ID is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ConfigError::EmptyClientId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated OAuth2 client secret.
///
/// This newtype ensures the secret is non-empty and masks its value
/// in debug output to prevent accidental exposure in logs.
///
/// # Security
///
/// The `Debug` implementation masks the secret value, displaying only
/// `ClientSecret(*****)` instead of the actual secret.
///
/// # Example
///
/// ```rust
/// use quickbooks_api::ClientSecret;
///
/// let secret = ClientSecret::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ClientSecret(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret(String);

impl ClientSecret {
    /// Creates a new validated client secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyClientSecret`] if the secret is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptyClientSecret);
        }
        Ok(Self(secret))
    }
}

impl AsRef<str> for ClientSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret(*****)")
    }
}

/// A validated QuickBooks company (realm) ID.
///
/// Every QuickBooks Online company is identified by a numeric realm ID that
/// appears in API paths (`/v3/company/{realm}/...`). This newtype validates
/// that the ID is a non-empty string of ASCII digits.
///
/// # Serialization
///
/// `CompanyId` serializes to and deserializes from the plain ID string:
///
/// ```rust
/// use quickbooks_api::CompanyId;
///
/// let company = CompanyId::new("9341453908471234").unwrap();
/// let json = serde_json::to_string(&company).unwrap();
/// assert_eq!(json, r#""9341453908471234""#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompanyId(String);

impl CompanyId {
    /// Creates a new validated company ID.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCompanyId`] if the ID is empty or
    /// contains non-digit characters.
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        let id = id.trim().to_string();

        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidCompanyId { company_id: id });
        }

        Ok(Self(id))
    }
}

impl AsRef<str> for CompanyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CompanyId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CompanyId> for String {
    fn from(value: CompanyId) -> Self {
        value.0
    }
}

/// A validated OAuth2 redirect URI.
///
/// The redirect URI must be an absolute `http://` or `https://` URL and must
/// match one of the URIs registered for the app.
///
/// # Example
///
/// ```rust
/// use quickbooks_api::RedirectUri;
///
/// let uri = RedirectUri::new("https://myapp.example.com/callback").unwrap();
/// assert_eq!(uri.as_ref(), "https://myapp.example.com/callback");
///
/// assert!(RedirectUri::new("myapp.example.com/callback").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectUri(String);

impl RedirectUri {
    /// Creates a new validated redirect URI.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRedirectUri`] if the URI does not start
    /// with an `http://` or `https://` scheme.
    pub fn new(uri: impl Into<String>) -> Result<Self, ConfigError> {
        let uri = uri.into();
        let uri = uri.trim().to_string();

        if !uri.starts_with("https://") && !uri.starts_with("http://") {
            return Err(ConfigError::InvalidRedirectUri { uri });
        }

        Ok(Self(uri))
    }
}

impl AsRef<str> for RedirectUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
