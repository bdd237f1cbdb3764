//! Cached, self-refreshing access tokens.
//!
//! This module provides the [`TokenSource`] type, the single authority for
//! the current [`Credential`]. Callers ask it for a valid access token before
//! every request; it refreshes through the OAuth2 token endpoint only when
//! the cached token is inside its safety margin, and persists the refreshed
//! credential through an optional [`TokenStore`].
//!
//! # Concurrency
//!
//! Reads take a shared lock and never block on a refresh unless expiry is
//! imminent. Refreshes are single-flight: concurrent callers that find the
//! token stale queue on one refresh lock, and all but the first return the
//! freshly cached token after re-checking expiry. A caller whose
//! cancellation token fires while waiting stops waiting without affecting
//! the in-progress refresh.

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::auth::oauth::{self, AuthError};
use crate::auth::{Credential, TokenStore};
use crate::config::QuickBooksConfig;

/// Default margin before expiry at which a token is treated as stale.
const DEFAULT_SAFETY_MARGIN_SECS: i64 = 60;

/// Produces valid access tokens on demand, refreshing and persisting as needed.
///
/// A `TokenSource` is shared behind an `Arc` by every stage of a client's
/// transport pipeline, and may also be shared across clients for the same
/// company connection.
///
/// # Example
///
/// ```rust,ignore
/// use quickbooks_api::auth::{TokenSource, TokenStore};
/// use tokio_util::sync::CancellationToken;
///
/// let store = TokenStore::new("~/.quickbooks/token.json");
/// let source = TokenSource::from_store(config, store)?;
///
/// let token = source.access_token(&CancellationToken::new()).await?;
/// ```
#[derive(Debug)]
pub struct TokenSource {
    config: Arc<QuickBooksConfig>,
    credential: RwLock<Credential>,
    refresh_lock: Mutex<()>,
    store: Option<TokenStore>,
    safety_margin: Duration,
}

impl TokenSource {
    /// Creates a token source from an already-obtained credential.
    ///
    /// Without a store, refreshed credentials live only in memory.
    #[must_use]
    pub fn new(config: Arc<QuickBooksConfig>, credential: Credential) -> Self {
        Self {
            config,
            credential: RwLock::new(credential),
            refresh_lock: Mutex::new(()),
            store: None,
            safety_margin: Duration::seconds(DEFAULT_SAFETY_MARGIN_SECS),
        }
    }

    /// Creates a token source by loading the credential from a store.
    ///
    /// Refreshed credentials are persisted back through the same store.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the persisted credential cannot be
    /// loaded.
    pub fn from_store(
        config: Arc<QuickBooksConfig>,
        store: TokenStore,
    ) -> Result<Self, AuthError> {
        let credential = store.load()?;
        Ok(Self {
            store: Some(store),
            ..Self::new(config, credential)
        })
    }

    /// Attaches a store that receives every refreshed credential.
    #[must_use]
    pub fn persist_to(mut self, store: TokenStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Overrides the safety margin used by the staleness check.
    ///
    /// A token that expires within the margin is refreshed before use, so
    /// requests never go out with a token about to lapse mid-flight.
    #[must_use]
    pub const fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }

    /// Returns a snapshot of the current credential.
    pub async fn credential(&self) -> Credential {
        self.credential.read().await.clone()
    }

    /// Returns a valid access token, refreshing it first if it is stale.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Cancelled`] if `cancel` fires while waiting or refreshing
    /// - [`AuthError::RefreshTokenExpired`] if the refresh token has lapsed
    /// - [`AuthError::TokenEndpoint`] / [`AuthError::Transport`] /
    ///   [`AuthError::Decode`] if the refresh exchange fails
    ///
    /// On any refresh failure the previous credential is left untouched, so
    /// a later call can retry the refresh.
    pub async fn access_token(&self, cancel: &CancellationToken) -> Result<String, AuthError> {
        // Fast path: shared lock, no I/O
        {
            let credential = self.credential.read().await;
            if !credential.expires_within(self.safety_margin) {
                return Ok(credential.access_token.clone());
            }
        }

        if cancel.is_cancelled() {
            return Err(AuthError::Cancelled);
        }

        // Single-flight: one refresh at a time; a cancelled waiter unblocks
        // without disturbing the refresh other callers are waiting on
        let _guard = tokio::select! {
            guard = self.refresh_lock.lock() => guard,
            () = cancel.cancelled() => return Err(AuthError::Cancelled),
        };

        // Re-check: the previous lock holder may have refreshed already
        {
            let credential = self.credential.read().await;
            if !credential.expires_within(self.safety_margin) {
                return Ok(credential.access_token.clone());
            }
        }

        let refresh_token = {
            let credential = self.credential.read().await;
            if credential.refresh_token_expired() {
                return Err(AuthError::RefreshTokenExpired);
            }
            credential.refresh_token.clone()
        };

        let refreshed = tokio::select! {
            result = oauth::refresh_tokens(&self.config, &refresh_token) => result?,
            () = cancel.cancelled() => return Err(AuthError::Cancelled),
        };

        // Persistence is best-effort: the refresh already succeeded, so a
        // write failure must not fail the caller's request
        if let Some(store) = &self.store {
            if let Err(error) = store.save(&refreshed) {
                tracing::warn!(
                    error = %error,
                    path = %store.path().display(),
                    "Failed to persist refreshed credential; continuing with in-memory token"
                );
            }
        }

        let token = refreshed.access_token.clone();
        *self.credential.write().await = refreshed;

        Ok(token)
    }
}

// Verify TokenSource is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TokenSource>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthScopes;
    use crate::config::{ClientId, ClientSecret};
    use chrono::Utc;

    fn build_config() -> Arc<QuickBooksConfig> {
        Arc::new(
            QuickBooksConfig::builder()
                .client_id(ClientId::new("test-client-id").unwrap())
                .client_secret(ClientSecret::new("test-secret").unwrap())
                // Point at a closed port so an unexpected refresh fails fast
                .api_host("http://127.0.0.1:9")
                .build()
                .unwrap(),
        )
    }

    fn build_credential(expires_in: Duration) -> Credential {
        Credential::new(
            "cached-access-token".to_string(),
            "refresh-token".to_string(),
            Utc::now() + expires_in,
            AuthScopes::accounting(),
        )
    }

    #[tokio::test]
    async fn test_valid_token_is_returned_without_refresh() {
        let source = TokenSource::new(build_config(), build_credential(Duration::hours(1)));

        let token = source
            .access_token(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(token, "cached-access-token");
    }

    #[tokio::test]
    async fn test_expired_refresh_token_is_reported() {
        let mut credential = build_credential(Duration::seconds(-10));
        credential.refresh_token_expires_at = Some(Utc::now() - Duration::days(1));

        let source = TokenSource::new(build_config(), credential);
        let result = source.access_token(&CancellationToken::new()).await;

        assert!(matches!(result, Err(AuthError::RefreshTokenExpired)));
    }

    #[tokio::test]
    async fn test_cancelled_caller_gets_cancellation_error() {
        let source = TokenSource::new(build_config(), build_credential(Duration::seconds(-10)));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = source.access_token(&cancel).await;
        assert!(matches!(result, Err(AuthError::Cancelled)));
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_old_credential_in_place() {
        let source = TokenSource::new(build_config(), build_credential(Duration::seconds(-10)));

        // The refresh endpoint is unreachable, so this fails
        let result = source.access_token(&CancellationToken::new()).await;
        assert!(result.is_err());

        // The stale credential is still there for a later retry
        let credential = source.credential().await;
        assert_eq!(credential.access_token, "cached-access-token");
        assert_eq!(credential.refresh_token, "refresh-token");
    }
}
