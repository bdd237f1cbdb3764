//! # QuickBooks API Rust SDK
//!
//! A Rust SDK for the QuickBooks Online API, providing type-safe
//! configuration, OAuth2 token lifecycle management, a middleware transport
//! pipeline, and lazy pagination for list endpoints.
//!
//! ## Overview
//!
//! This SDK provides:
//! - Type-safe configuration via [`QuickBooksConfig`] and [`QuickBooksConfigBuilder`]
//! - Validated newtypes for OAuth2 credentials and company (realm) IDs
//! - OAuth 2.0 authorization code flow via [`auth::oauth`]
//! - Durable credential storage with atomic writes via [`auth::TokenStore`]
//! - Race-free cached access tokens with single-flight refresh via
//!   [`auth::TokenSource`]
//! - A middleware transport pipeline (retry, rate limiting, auth injection,
//!   logging with secret redaction) via [`transport`]
//! - A typed API client via [`ApiClient`]
//! - Lazy pagination via [`pagination::ListPager`]
//!
//! ## Quick Start
//!
//! ```rust
//! use quickbooks_api::{ClientId, ClientSecret, Environment, QuickBooksConfig};
//!
//! // Create configuration using the builder pattern
//! let config = QuickBooksConfig::builder()
//!     .client_id(ClientId::new("your-client-id").unwrap())
//!     .client_secret(ClientSecret::new("your-client-secret").unwrap())
//!     .scopes("com.intuit.quickbooks.accounting".parse().unwrap())
//!     .environment(Environment::Sandbox)
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## OAuth Authentication
//!
//! For apps connecting to a QuickBooks company:
//!
//! ```rust,ignore
//! use quickbooks_api::auth::oauth::{authorize_url, exchange_code, generate_state};
//! use quickbooks_api::auth::{TokenSource, TokenStore};
//! use std::sync::Arc;
//!
//! // Step 1: Send the user to the consent page
//! let state = generate_state();
//! let url = authorize_url(&config, &state)?;
//! // Redirect the user to `url`; store `state` in the session
//!
//! // Step 2: On callback, exchange the code for a credential
//! let credential = exchange_code(&config, &code).await?;
//!
//! // Step 3: Persist it and build a token source
//! let store = TokenStore::new("/home/app/.quickbooks/token.json");
//! store.save(&credential)?;
//! let source = Arc::new(
//!     TokenSource::new(Arc::new(config.clone()), credential).persist_to(store),
//! );
//! ```
//!
//! The token source refreshes the access token on demand, at most one
//! refresh in flight per source, and persists every refreshed credential.
//!
//! ## Making API Requests
//!
//! ```rust,ignore
//! use quickbooks_api::{ApiClient, ApiRequest, CompanyId, HttpMethod};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = ApiClient::new(&config, CompanyId::new("9341453908471234")?, source);
//!
//! let request = ApiRequest::builder(HttpMethod::Get, "companyinfo/9341453908471234")
//!     .build()?;
//!
//! let info: serde_json::Value = client
//!     .execute(request, &CancellationToken::new())
//!     .await?;
//! ```
//!
//! Every request flows through the transport pipeline: the retry stage
//! re-runs rate-limit admission, token injection, and logging for each
//! attempt, so a token that expires mid-flight is refreshed transparently
//! and sensitive headers are always recorded redacted.
//!
//! ## Listing with Pagination
//!
//! ```rust,ignore
//! use quickbooks_api::pagination::{ListPager, Page, PageRequest};
//!
//! let mut pager = ListPager::new(fetch_page, cancel.clone()).with_page_size(50);
//!
//! while pager.advance().await {
//!     println!("{:?}", pager.current().unwrap());
//! }
//! if let Some(error) = pager.error() {
//!     eprintln!("listing failed: {error}");
//! }
//! ```
//!
//! Pages are fetched one at a time, only when needed; stopping early issues
//! no further requests.
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration, token cache, and rate limiter are
//!   instance-based and passed explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: Clients and token sources are `Send + Sync`
//! - **Async-first**: Designed for use with the Tokio async runtime
//! - **Explicit cancellation**: Every I/O-issuing operation takes a
//!   `CancellationToken` and reports cancellation as a distinct error
//! - **Errors as values**: No panics on expected failure paths; callers
//!   pattern-match on [`Error`]

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod pagination;
pub mod transport;

// Re-export public types at crate root for convenience
pub use auth::{AuthError, AuthScopes, Credential, StoreError, TokenSource, TokenStore};
pub use config::{
    ClientId, ClientSecret, CompanyId, Environment, QuickBooksConfig, QuickBooksConfigBuilder,
    RedirectUri,
};
pub use error::ConfigError;

// Re-export client types
pub use clients::{
    ApiClient, ApiError, ApiRequest, ApiRequestBuilder, ApiResponse, DecodeError, Error,
    HttpMethod, InvalidRequestError, RateLimitedError,
};

// Re-export transport configuration
pub use transport::{RateLimitConfig, RetryPolicy};

// Re-export pagination types
pub use pagination::{ListPager, Page, PageRequest, PageToken};
