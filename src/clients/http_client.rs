//! The API client for QuickBooks Online communication.
//!
//! This module provides the [`ApiClient`] type, the single entry point used
//! by resource services to make authenticated, typed requests through the
//! transport pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::auth::TokenSource;
use crate::clients::errors::{ApiError, DecodeError, Error, RateLimitedError};
use crate::clients::http_request::ApiRequest;
use crate::clients::http_response::ApiResponse;
use crate::config::{CompanyId, QuickBooksConfig};
use crate::transport::{
    AuthStage, LoggingStage, Middleware, Pipeline, PipelineRequest, RateLimitStage, RateLimiter,
    RetryStage,
};

/// SDK version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The API client for a single QuickBooks company connection.
///
/// The client binds a base URL and company (realm) ID to the transport
/// pipeline: retry, rate limiting, token injection, and logging are applied
/// to every request. All state is instance-owned: separate clients for
/// separate companies do not share a rate limiter or token cache.
///
/// # Thread Safety
///
/// `ApiClient` is `Send + Sync`, making it safe to share across async tasks;
/// the token source and rate limiter are the only shared mutable state and
/// both are internally synchronized.
///
/// # Example
///
/// ```rust,ignore
/// use quickbooks_api::{ApiClient, ApiRequest, HttpMethod};
/// use tokio_util::sync::CancellationToken;
///
/// let client = ApiClient::new(config, company_id, token_source);
///
/// let request = ApiRequest::builder(HttpMethod::Get, "companyinfo/1")
///     .build()
///     .unwrap();
///
/// let info: CompanyInfoResponse = client
///     .execute(request, &CancellationToken::new())
///     .await?;
/// ```
#[derive(Debug)]
pub struct ApiClient {
    company_id: CompanyId,
    base_uri: String,
    default_headers: HashMap<String, String>,
    pipeline: Pipeline,
    token_source: Arc<TokenSource>,
}

// Verify ApiClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiClient>();
};

impl ApiClient {
    /// Creates a new client for the given company connection.
    ///
    /// # Arguments
    ///
    /// * `config` - SDK configuration (environment, retry, rate limit)
    /// * `company_id` - The company (realm) the client operates on
    /// * `token_source` - Shared token source providing access tokens
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This should
    /// only happen in extremely unusual circumstances (e.g., TLS
    /// initialization failure).
    #[must_use]
    pub fn new(
        config: &QuickBooksConfig,
        company_id: CompanyId,
        token_source: Arc<TokenSource>,
    ) -> Self {
        let base_uri = config.api_host().map_or_else(
            || config.environment().api_base_url().to_string(),
            str::to_string,
        );

        // Build User-Agent header
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent = format!(
            "{user_agent_prefix}QuickBooks API Library v{SDK_VERSION} | Rust {rust_version}"
        );

        let mut default_headers = HashMap::new();
        default_headers.insert("user-agent".to_string(), user_agent);
        default_headers.insert("accept".to_string(), "application/json".to_string());

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .expect("Failed to create HTTP client");

        let limiter = Arc::new(RateLimiter::new(*config.rate_limit()));
        let stages: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(RetryStage::new(config.retry_policy().clone())),
            Arc::new(RateLimitStage::new(limiter)),
            Arc::new(AuthStage::new(Arc::clone(&token_source))),
            Arc::new(LoggingStage::new()),
        ];

        Self {
            company_id,
            base_uri,
            default_headers,
            pipeline: Pipeline::new(stages, client),
            token_source,
        }
    }

    /// Returns the base URI for this client.
    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Returns the company (realm) ID this client operates on.
    #[must_use]
    pub const fn company_id(&self) -> &CompanyId {
        &self.company_id
    }

    /// Returns the default headers sent on every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the token source this client authenticates with.
    #[must_use]
    pub fn token_source(&self) -> Arc<TokenSource> {
        Arc::clone(&self.token_source)
    }

    /// Executes a request and decodes the 2xx response body into `T`.
    ///
    /// This is the sole entry point used by resource services. The request
    /// is validated, run through the transport pipeline, and decoded only on
    /// success; a non-2xx response is never silently decoded as `T`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] if the request fails validation
    /// - [`Error::Auth`] if no access token could be obtained
    /// - [`Error::Api`] / [`Error::RateLimited`] for non-2xx responses,
    ///   carrying status, provider fault code, and attempt count
    /// - [`Error::Transport`] for connection-level failures after retries
    /// - [`Error::Decode`] if the 2xx body does not match `T`
    /// - [`Error::Cancelled`] if `cancel` fires before completion
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<T, Error> {
        let response = self.execute_raw(request, cancel).await?;
        Ok(response.json()?)
    }

    /// Executes a request and returns the raw 2xx response.
    ///
    /// Use this when the caller wants the undecoded body bytes or response
    /// headers.
    ///
    /// # Errors
    ///
    /// As [`execute`](Self::execute), minus `Decode`.
    pub async fn execute_raw(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse, Error> {
        request.verify()?;

        let url = self.build_url(&request);
        let mut wire = PipelineRequest::new(request.method, url);

        for (name, value) in &self.default_headers {
            wire.set_header(name, value.clone());
        }
        if let Some(extra) = &request.extra_headers {
            for (name, value) in extra {
                wire.set_header(name, value.clone());
            }
        }
        if let Some(body) = &request.body {
            wire.set_header("content-type", "application/json");
            wire.body =
                Some(serde_json::to_vec(body).map_err(|source| DecodeError { source })?);
        }

        let response = self.pipeline.execute(wire, cancel).await?;

        if response.is_ok() {
            Ok(ApiResponse::new(response))
        } else if response.status == 429 {
            Err(RateLimitedError::from_response(&response).into())
        } else {
            Err(ApiError::from_response(&response).into())
        }
    }

    /// Builds the full request URL: base, company segment, path, and query.
    fn build_url(&self, request: &ApiRequest) -> String {
        let mut url = format!(
            "{}/v3/company/{}/{}",
            self.base_uri,
            self.company_id.as_ref(),
            request.path.trim_start_matches('/'),
        );

        if let Some(query) = &request.query {
            // Sorted for a deterministic wire form
            let mut params: Vec<(&String, &String)> = query.iter().collect();
            params.sort();

            let encoded: Vec<String> = params
                .into_iter()
                .map(|(key, value)| {
                    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
                })
                .collect();

            if !encoded.is_empty() {
                url.push('?');
                url.push_str(&encoded.join("&"));
            }
        }

        url
    }
}
