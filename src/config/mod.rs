//! Configuration types for the QuickBooks API SDK.
//!
//! This module provides the core configuration types used to initialize
//! and configure the SDK for API communication with QuickBooks Online.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`QuickBooksConfig`]: The main configuration struct holding all SDK settings
//! - [`QuickBooksConfigBuilder`]: A builder for constructing [`QuickBooksConfig`] instances
//! - [`ClientId`]: A validated OAuth2 client ID newtype
//! - [`ClientSecret`]: A validated client secret newtype with masked debug output
//! - [`CompanyId`]: A validated company (realm) ID
//! - [`RedirectUri`]: A validated OAuth2 redirect URI
//! - [`Environment`]: Production or sandbox endpoint selection
//!
//! # Example
//!
//! ```rust
//! use quickbooks_api::{QuickBooksConfig, ClientId, ClientSecret, Environment};
//!
//! let config = QuickBooksConfig::builder()
//!     .client_id(ClientId::new("my-client-id").unwrap())
//!     .client_secret(ClientSecret::new("my-secret").unwrap())
//!     .environment(Environment::Sandbox)
//!     .build()
//!     .unwrap();
//! ```

mod environment;
mod newtypes;

pub use environment::Environment;
pub use newtypes::{ClientId, ClientSecret, CompanyId, RedirectUri};

use crate::auth::AuthScopes;
use crate::error::ConfigError;
use crate::transport::{RateLimitConfig, RetryPolicy};

/// Configuration for the QuickBooks API SDK.
///
/// This struct holds all configuration needed for SDK operations, including
/// OAuth2 credentials, scopes, environment selection, and the transport
/// rate-limit and retry options.
///
/// # Thread Safety
///
/// `QuickBooksConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
///
/// # Example
///
/// ```rust
/// use quickbooks_api::{QuickBooksConfig, ClientId, ClientSecret, Environment};
///
/// let config = QuickBooksConfig::builder()
///     .client_id(ClientId::new("my-client-id").unwrap())
///     .client_secret(ClientSecret::new("my-secret").unwrap())
///     .environment(Environment::Production)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.environment(), Environment::Production);
/// ```
#[derive(Clone, Debug)]
pub struct QuickBooksConfig {
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_uri: Option<RedirectUri>,
    scopes: AuthScopes,
    environment: Environment,
    api_host: Option<String>,
    user_agent_prefix: Option<String>,
    retry_policy: RetryPolicy,
    rate_limit: RateLimitConfig,
}

impl QuickBooksConfig {
    /// Creates a new builder for constructing a `QuickBooksConfig`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use quickbooks_api::{QuickBooksConfig, ClientId, ClientSecret};
    ///
    /// let config = QuickBooksConfig::builder()
    ///     .client_id(ClientId::new("id").unwrap())
    ///     .client_secret(ClientSecret::new("secret").unwrap())
    ///     .build()
    ///     .unwrap();
    /// ```
    #[must_use]
    pub fn builder() -> QuickBooksConfigBuilder {
        QuickBooksConfigBuilder::new()
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub const fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub const fn client_secret(&self) -> &ClientSecret {
        &self.client_secret
    }

    /// Returns the OAuth2 redirect URI, if configured.
    #[must_use]
    pub const fn redirect_uri(&self) -> Option<&RedirectUri> {
        self.redirect_uri.as_ref()
    }

    /// Returns the OAuth scopes.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the selected environment.
    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Returns the API host override, if configured.
    ///
    /// When set, API requests are sent to this host instead of the
    /// environment's default host. Intended for proxies and tests.
    #[must_use]
    pub fn api_host(&self) -> Option<&str> {
        self.api_host.as_deref()
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the retry policy applied by the transport pipeline.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the rate-limit configuration applied by the transport pipeline.
    #[must_use]
    pub const fn rate_limit(&self) -> &RateLimitConfig {
        &self.rate_limit
    }
}

// Verify QuickBooksConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<QuickBooksConfig>();
};

/// Builder for constructing [`QuickBooksConfig`] instances.
///
/// This builder provides a fluent API for configuring the SDK. Required fields
/// are `client_id` and `client_secret`. All other fields have sensible defaults.
///
/// # Defaults
///
/// - `environment`: [`Environment::Sandbox`]
/// - `scopes`: Empty
/// - `redirect_uri`: `None`
/// - `api_host`: `None`
/// - `user_agent_prefix`: `None`
/// - `retry_policy`: [`RetryPolicy::default`]
/// - `rate_limit`: [`RateLimitConfig::default`]
///
/// # Example
///
/// ```rust
/// use quickbooks_api::{
///     ClientId, ClientSecret, Environment, QuickBooksConfig, RedirectUri,
/// };
///
/// let config = QuickBooksConfig::builder()
///     .client_id(ClientId::new("id").unwrap())
///     .client_secret(ClientSecret::new("secret").unwrap())
///     .redirect_uri(RedirectUri::new("https://myapp.example.com/callback").unwrap())
///     .scopes("com.intuit.quickbooks.accounting".parse().unwrap())
///     .environment(Environment::Production)
///     .user_agent_prefix("MyApp/1.0")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct QuickBooksConfigBuilder {
    client_id: Option<ClientId>,
    client_secret: Option<ClientSecret>,
    redirect_uri: Option<RedirectUri>,
    scopes: Option<AuthScopes>,
    environment: Option<Environment>,
    api_host: Option<String>,
    user_agent_prefix: Option<String>,
    retry_policy: Option<RetryPolicy>,
    rate_limit: Option<RateLimitConfig>,
}

impl QuickBooksConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the OAuth2 client ID (required).
    #[must_use]
    pub fn client_id(mut self, id: ClientId) -> Self {
        self.client_id = Some(id);
        self
    }

    /// Sets the OAuth2 client secret (required).
    #[must_use]
    pub fn client_secret(mut self, secret: ClientSecret) -> Self {
        self.client_secret = Some(secret);
        self
    }

    /// Sets the OAuth2 redirect URI used for the authorization-code flow.
    #[must_use]
    pub fn redirect_uri(mut self, uri: RedirectUri) -> Self {
        self.redirect_uri = Some(uri);
        self
    }

    /// Sets the OAuth scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the environment (production or sandbox).
    #[must_use]
    pub const fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Overrides the API host.
    ///
    /// When set, API requests are sent to this host instead of the
    /// environment's default host. Intended for proxies and tests.
    #[must_use]
    pub fn api_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = Some(host.into());
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the retry policy applied by the transport pipeline.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Sets the rate-limit configuration applied by the transport pipeline.
    #[must_use]
    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Builds the [`QuickBooksConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `client_id` or
    /// `client_secret` are not set.
    pub fn build(self) -> Result<QuickBooksConfig, ConfigError> {
        let client_id = self
            .client_id
            .ok_or(ConfigError::MissingRequiredField { field: "client_id" })?;
        let client_secret = self
            .client_secret
            .ok_or(ConfigError::MissingRequiredField {
                field: "client_secret",
            })?;

        Ok(QuickBooksConfig {
            client_id,
            client_secret,
            redirect_uri: self.redirect_uri,
            scopes: self.scopes.unwrap_or_default(),
            environment: self.environment.unwrap_or_default(),
            api_host: self.api_host,
            user_agent_prefix: self.user_agent_prefix,
            retry_policy: self.retry_policy.unwrap_or_default(),
            rate_limit: self.rate_limit.unwrap_or_default(),
        })
    }
}
