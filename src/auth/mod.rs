//! Authentication types for the QuickBooks API SDK.
//!
//! This module provides the OAuth2 token lifecycle: scope handling, the
//! credential state, durable credential storage, the token-endpoint flows,
//! and the self-refreshing token source used by the transport pipeline.
//!
//! # Overview
//!
//! - [`AuthScopes`]: A set of OAuth scopes in wire order
//! - [`Credential`]: The access/refresh token pair with absolute expiry
//! - [`TokenStore`]: Atomic file persistence for a credential
//! - [`TokenSource`]: Race-free cached token access with single-flight refresh
//! - [`oauth`]: Authorization-code and refresh-token grants
//!
//! # Token Lifecycle
//!
//! 1. The user authorizes the app ([`oauth::authorize_url`]) and the callback
//!    code is exchanged for a [`Credential`] ([`oauth::exchange_code`]).
//! 2. The credential is persisted through a [`TokenStore`] and loaded on
//!    later runs ([`TokenSource::from_store`]).
//! 3. Every request asks the [`TokenSource`] for a valid access token; it
//!    refreshes through [`oauth::refresh_tokens`] only when the cached token
//!    is about to expire, and persists the replacement.
//!
//! # Example
//!
//! ```rust,ignore
//! use quickbooks_api::auth::{TokenSource, TokenStore};
//!
//! let store = TokenStore::new("/home/app/.quickbooks/token.json");
//! let source = TokenSource::from_store(config, store)?;
//! ```

mod credential;
mod scopes;
mod store;
mod token_source;

pub mod oauth;

pub use credential::Credential;
pub use oauth::AuthError;
pub use scopes::{AuthScopes, SCOPE_ACCOUNTING, SCOPE_PAYMENT};
pub use store::{StoreError, TokenStore};
pub use token_source::TokenSource;
