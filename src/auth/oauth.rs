//! OAuth 2.0 authorization-code flow for QuickBooks Online.
//!
//! This module provides the building blocks of the authorization-code grant:
//!
//! - [`authorize_url`]: Build the URL the user is redirected to for consent
//! - [`generate_state`]: Generate a random CSRF state parameter
//! - [`exchange_code`]: Exchange an authorization code for a [`Credential`]
//! - [`refresh_tokens`]: Exchange a refresh token for a new [`Credential`]
//!
//! Both exchanges POST a form-encoded body to the shared token endpoint and
//! authenticate with HTTP Basic using the app's client ID and secret.
//!
//! # Example
//!
//! ```rust,ignore
//! use quickbooks_api::auth::oauth::{authorize_url, exchange_code, generate_state};
//!
//! // 1. Send the user to the consent page
//! let state = generate_state();
//! let url = authorize_url(&config, &state)?;
//!
//! // 2. On callback, exchange the code for a credential
//! let credential = exchange_code(&config, &code).await?;
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::store::StoreError;
use crate::auth::Credential;
use crate::config::QuickBooksConfig;
use crate::error::ConfigError;

/// Grant type for authorization-code exchanges.
const AUTHORIZATION_CODE_GRANT_TYPE: &str = "authorization_code";

/// Grant type for refresh-token exchanges.
const REFRESH_TOKEN_GRANT_TYPE: &str = "refresh_token";

/// Length of the generated CSRF state parameter.
const STATE_LENGTH: usize = 32;

/// Errors that can occur during token acquisition and refresh.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint rejected the exchange.
    #[error("Token endpoint returned status {status}: {message}")]
    TokenEndpoint {
        /// The HTTP status returned by the token endpoint.
        status: u16,
        /// The response body, typically an OAuth2 error document.
        message: String,
    },

    /// A network failure while calling the token endpoint.
    #[error("Network error during token exchange: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token endpoint returned a body that could not be parsed.
    #[error("Failed to parse token endpoint response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The refresh token itself has expired; the user must re-authorize.
    #[error("The refresh token has expired. Re-authorization is required.")]
    RefreshTokenExpired,

    /// The caller's cancellation token fired before a token was obtained.
    #[error("Token acquisition was cancelled.")]
    Cancelled,

    /// Loading the persisted credential failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The configuration is missing a field required by this flow.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Successful response from the OAuth2 token endpoint.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    token_type: Option<String>,
    expires_in: i64,
    #[serde(default)]
    x_refresh_token_expires_in: Option<i64>,
}

impl TokenEndpointResponse {
    /// Converts the relative expiry seconds into an absolute credential.
    fn into_credential(self, config: &QuickBooksConfig) -> Credential {
        let now = Utc::now();
        let mut credential = Credential::new(
            self.access_token,
            self.refresh_token,
            now + Duration::seconds(self.expires_in),
            config.scopes().clone(),
        );

        if let Some(token_type) = self.token_type {
            credential.token_type = token_type;
        }
        credential.refresh_token_expires_at = self
            .x_refresh_token_expires_in
            .map(|secs| now + Duration::seconds(secs));

        credential
    }
}

/// Generates a random alphanumeric state parameter for CSRF protection.
///
/// Store the returned value in the user's session and compare it against the
/// `state` query parameter on the OAuth callback.
#[must_use]
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Builds the authorization URL the user is redirected to for consent.
///
/// # Errors
///
/// Returns [`ConfigError::MissingRequiredField`] if the configuration has no
/// redirect URI, and [`ConfigError::InvalidScopes`] if it has no scopes.
pub fn authorize_url(config: &QuickBooksConfig, state: &str) -> Result<String, ConfigError> {
    let redirect_uri = config
        .redirect_uri()
        .ok_or(ConfigError::MissingRequiredField {
            field: "redirect_uri",
        })?;

    if config.scopes().is_empty() {
        return Err(ConfigError::InvalidScopes {
            reason: "At least one scope is required to begin authorization.".to_string(),
        });
    }

    Ok(format!(
        "{}?client_id={}&response_type=code&scope={}&redirect_uri={}&state={}",
        config.environment().authorization_url(),
        urlencoding::encode(config.client_id().as_ref()),
        urlencoding::encode(&config.scopes().to_string()),
        urlencoding::encode(redirect_uri.as_ref()),
        urlencoding::encode(state),
    ))
}

/// Exchanges an authorization code for a [`Credential`].
///
/// Call this from the OAuth callback handler after validating the `state`
/// parameter.
///
/// # Errors
///
/// - [`AuthError::Config`] if the configuration has no redirect URI
/// - [`AuthError::TokenEndpoint`] if the provider rejects the code
/// - [`AuthError::Transport`] on network failure
/// - [`AuthError::Decode`] if the response body is malformed
pub async fn exchange_code(
    config: &QuickBooksConfig,
    code: &str,
) -> Result<Credential, AuthError> {
    let redirect_uri = config
        .redirect_uri()
        .ok_or(ConfigError::MissingRequiredField {
            field: "redirect_uri",
        })?;

    let params = [
        ("grant_type", AUTHORIZATION_CODE_GRANT_TYPE),
        ("code", code),
        ("redirect_uri", redirect_uri.as_ref()),
    ];

    request_tokens(config, &params).await
}

/// Exchanges a refresh token for a new [`Credential`].
///
/// The returned credential carries a new access token and, when the provider
/// rotates it, a new refresh token that must replace the old one.
///
/// # Errors
///
/// - [`AuthError::TokenEndpoint`] if the provider rejects the refresh token
/// - [`AuthError::Transport`] on network failure
/// - [`AuthError::Decode`] if the response body is malformed
pub async fn refresh_tokens(
    config: &QuickBooksConfig,
    refresh_token: &str,
) -> Result<Credential, AuthError> {
    let params = [
        ("grant_type", REFRESH_TOKEN_GRANT_TYPE),
        ("refresh_token", refresh_token),
    ];

    request_tokens(config, &params).await
}

/// POSTs a form-encoded grant request to the token endpoint.
async fn request_tokens(
    config: &QuickBooksConfig,
    params: &[(&str, &str)],
) -> Result<Credential, AuthError> {
    let client = reqwest::Client::new();
    let response = client
        .post(token_url(config))
        .header("Authorization", basic_auth_header(config))
        .header("Accept", "application/json")
        .form(params)
        .send()
        .await?;

    let status = response.status().as_u16();
    let body = response.bytes().await?;

    if !(200..300).contains(&status) {
        return Err(AuthError::TokenEndpoint {
            status,
            message: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    let parsed: TokenEndpointResponse = serde_json::from_slice(&body)?;

    Ok(parsed.into_credential(config))
}

/// Returns the token endpoint URL, honoring the test/proxy host override.
fn token_url(config: &QuickBooksConfig) -> String {
    config.api_host().map_or_else(
        || config.environment().token_url().to_string(),
        |host| format!("{host}/oauth2/v1/tokens/bearer"),
    )
}

/// Builds the HTTP Basic authentication header for the token endpoint.
fn basic_auth_header(config: &QuickBooksConfig) -> String {
    let credentials = format!(
        "{}:{}",
        config.client_id().as_ref(),
        config.client_secret().as_ref()
    );
    format!("Basic {}", BASE64.encode(credentials))
}

// Verify the error type is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthError>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientId, ClientSecret, RedirectUri};
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn build_config(api_host: Option<&str>) -> QuickBooksConfig {
        let mut builder = QuickBooksConfig::builder()
            .client_id(ClientId::new("test-client-id").unwrap())
            .client_secret(ClientSecret::new("test-secret").unwrap())
            .redirect_uri(RedirectUri::new("https://app.example.com/callback").unwrap())
            .scopes("com.intuit.quickbooks.accounting".parse().unwrap());

        if let Some(host) = api_host {
            builder = builder.api_host(host);
        }

        builder.build().unwrap()
    }

    fn token_response_body() -> serde_json::Value {
        serde_json::json!({
            "access_token": "new-access-token",
            "refresh_token": "new-refresh-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "x_refresh_token_expires_in": 8_726_400
        })
    }

    #[test]
    fn test_generate_state_is_random_and_sized() {
        let a = generate_state();
        let b = generate_state();

        assert_eq!(a.len(), STATE_LENGTH);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_authorize_url_contains_encoded_parameters() {
        let config = build_config(None);
        let url = authorize_url(&config, "state-123").unwrap();

        assert!(url.starts_with("https://appcenter.intuit.com/connect/oauth2?"));
        assert!(url.contains("client_id=test-client-id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=com.intuit.quickbooks.accounting"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fcallback"));
        assert!(url.contains("state=state-123"));
    }

    #[test]
    fn test_authorize_url_requires_redirect_uri() {
        let config = QuickBooksConfig::builder()
            .client_id(ClientId::new("id").unwrap())
            .client_secret(ClientSecret::new("secret").unwrap())
            .scopes("openid".parse().unwrap())
            .build()
            .unwrap();

        let result = authorize_url(&config, "state");
        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField {
                field: "redirect_uri"
            })
        ));
    }

    #[test]
    fn test_authorize_url_requires_scopes() {
        let config = QuickBooksConfig::builder()
            .client_id(ClientId::new("id").unwrap())
            .client_secret(ClientSecret::new("secret").unwrap())
            .redirect_uri(RedirectUri::new("https://app.example.com/cb").unwrap())
            .build()
            .unwrap();

        let result = authorize_url(&config, "state");
        assert!(matches!(result, Err(ConfigError::InvalidScopes { .. })));
    }

    #[test]
    fn test_basic_auth_header_encodes_credentials() {
        let config = build_config(None);
        let header_value = basic_auth_header(&config);

        assert!(header_value.starts_with("Basic "));
        let decoded = BASE64
            .decode(header_value.trim_start_matches("Basic "))
            .unwrap();
        assert_eq!(decoded, b"test-client-id:test-secret");
    }

    #[tokio::test]
    async fn test_refresh_tokens_posts_refresh_grant() {
        let server = MockServer::start().await;
        let config = build_config(Some(&server.uri()));

        Mock::given(method("POST"))
            .and(path("/oauth2/v1/tokens/bearer"))
            .and(header("Accept", "application/json"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=old-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_response_body()))
            .expect(1)
            .mount(&server)
            .await;

        let credential = refresh_tokens(&config, "old-refresh").await.unwrap();

        assert_eq!(credential.access_token, "new-access-token");
        assert_eq!(credential.refresh_token, "new-refresh-token");
        assert!(!credential.expired());
        assert!(credential.refresh_token_expires_at.is_some());
    }

    #[tokio::test]
    async fn test_exchange_code_posts_authorization_code_grant() {
        let server = MockServer::start().await;
        let config = build_config(Some(&server.uri()));

        Mock::given(method("POST"))
            .and(path("/oauth2/v1/tokens/bearer"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_response_body()))
            .expect(1)
            .mount(&server)
            .await;

        let credential = exchange_code(&config, "auth-code-1").await.unwrap();
        assert_eq!(credential.access_token, "new-access-token");
    }

    #[tokio::test]
    async fn test_token_endpoint_error_is_surfaced() {
        let server = MockServer::start().await;
        let config = build_config(Some(&server.uri()));

        Mock::given(method("POST"))
            .and(path("/oauth2/v1/tokens/bearer"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "invalid_grant"})),
            )
            .mount(&server)
            .await;

        let result = refresh_tokens(&config, "revoked-token").await;

        match result {
            Err(AuthError::TokenEndpoint { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.contains("invalid_grant"));
            }
            other => panic!("Expected TokenEndpoint error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_token_response_is_decode_error() {
        let server = MockServer::start().await;
        let config = build_config(Some(&server.uri()));

        Mock::given(method("POST"))
            .and(path("/oauth2/v1/tokens/bearer"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = refresh_tokens(&config, "token").await;
        assert!(matches!(result, Err(AuthError::Decode(_))));
    }
}
