//! OAuth2 credential state for QuickBooks API authentication.
//!
//! This module provides the [`Credential`] type holding the access/refresh
//! token pair returned by the OAuth2 token endpoint, along with the absolute
//! instants at which each expires.

use crate::auth::AuthScopes;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An OAuth2 credential for QuickBooks API calls.
///
/// A credential is created from the initial authorization-code exchange or
/// loaded from persisted storage, and is replaced wholesale on every refresh.
/// Expiry instants are stored as absolute UTC timestamps, so a credential
/// loaded on a machine in a different timezone evaluates expiry identically.
///
/// # Serialization
///
/// `Credential` serializes to the JSON shape used by the persisted token
/// file (see [`TokenStore`](crate::auth::TokenStore)).
///
/// # Example
///
/// ```rust
/// use quickbooks_api::{AuthScopes, Credential};
/// use chrono::{Duration, Utc};
///
/// let credential = Credential::new(
///     "access-token".to_string(),
///     "refresh-token".to_string(),
///     Utc::now() + Duration::hours(1),
///     AuthScopes::accounting(),
/// );
///
/// assert!(!credential.expired());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The bearer token sent on API requests.
    pub access_token: String,

    /// The refresh token exchanged for new access tokens.
    pub refresh_token: String,

    /// The token type reported by the provider (always `bearer`).
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// When the access token expires.
    pub expires_at: DateTime<Utc>,

    /// When the refresh token expires, if the provider reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_expires_at: Option<DateTime<Utc>>,

    /// The OAuth scopes granted to this credential.
    #[serde(default)]
    pub scopes: AuthScopes,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Credential {
    /// Creates a new credential with the given tokens and expiry.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: String,
        expires_at: DateTime<Utc>,
        scopes: AuthScopes,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: default_token_type(),
            expires_at,
            refresh_token_expires_at: None,
            scopes,
        }
    }

    /// Returns `true` if the access token has expired.
    #[must_use]
    pub fn expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns `true` if the access token expires within the given margin.
    ///
    /// This is the fast-path check used by the token source: a token inside
    /// its safety margin is treated as expired so callers never send a
    /// request with a token about to lapse mid-flight.
    #[must_use]
    pub fn expires_within(&self, margin: Duration) -> bool {
        Utc::now() + margin >= self.expires_at
    }

    /// Returns `true` if the refresh token has expired.
    ///
    /// Credentials without a reported refresh-token expiry are treated as
    /// refreshable.
    #[must_use]
    pub fn refresh_token_expired(&self) -> bool {
        self.refresh_token_expires_at
            .is_some_and(|expires| Utc::now() >= expires)
    }
}

// Verify Credential is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Credential>();
};
