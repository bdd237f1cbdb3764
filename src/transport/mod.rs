//! The middleware transport pipeline.
//!
//! Every API call flows through an ordered chain of middleware stages before
//! reaching the base `reqwest` sender, and the response flows back through
//! the same stages in reverse:
//!
//! ```text
//! retry -> rate limit -> auth -> logging -> sender
//! ```
//!
//! Retry is the outermost stage so that every attempt re-acquires rate-limit
//! admission, re-fetches a fresh access token if the cached one expired
//! mid-flight, and is logged with the headers actually sent.
//!
//! The chain is built once at client construction time from explicit stage
//! values; there is no dynamic registration.
//!
//! # Overview
//!
//! - [`PipelineRequest`] / [`PipelineResponse`]: transient wire value objects
//! - [`Middleware`] / [`Next`]: the stage contract and chain walker
//! - [`Pipeline`]: the assembled chain plus base sender
//! - [`AuthStage`], [`LoggingStage`], [`RateLimitStage`], [`RetryStage`]:
//!   the built-in stages

mod auth;
mod logging;
mod rate_limit;
mod retry;

pub use auth::AuthStage;
pub use logging::{redact_header_value, LoggingStage, REDACTED_VALUE};
pub use rate_limit::{RateLimitConfig, RateLimitStage, RateLimiter};
pub use retry::{RetryPolicy, RetryStage};

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clients::{Error, HttpMethod};

/// Boxed future returned by [`Middleware::handle`] and [`Next::run`].
pub type MiddlewareFuture<'a> =
    Pin<Box<dyn Future<Output = Result<PipelineResponse, Error>> + Send + 'a>>;

/// A wire request flowing through the pipeline.
///
/// Header keys are stored lowercase so stages can look headers up without
/// worrying about the casing a previous stage used.
#[derive(Clone, Debug)]
pub struct PipelineRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The full request URL, query string included.
    pub url: String,
    /// Request headers, keyed by lowercase name.
    pub headers: HashMap<String, String>,
    /// The request body bytes, if any.
    pub body: Option<Vec<u8>>,
}

impl PipelineRequest {
    /// Creates a request with no headers or body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Sets a header, normalizing the name to lowercase.
    pub fn set_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_lowercase(), value.into());
    }
}

/// A wire response flowing back through the pipeline.
#[derive(Clone, Debug)]
pub struct PipelineResponse {
    /// The HTTP status code.
    pub status: u16,
    /// Response headers, keyed by lowercase name (headers may repeat).
    pub headers: HashMap<String, Vec<String>>,
    /// The raw response body bytes.
    pub body: Vec<u8>,
    /// How many attempts were made to obtain this response.
    ///
    /// `1` unless the retry stage re-sent the request.
    pub attempts: u32,
}

impl PipelineResponse {
    /// Returns `true` if the status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// Returns the first value of the named header, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// A single stage in the transport pipeline.
///
/// A stage receives the request, may decorate it, and calls `next.run` to
/// hand it to the remaining stages (ending with the base sender). A stage
/// that fails before calling `next` aborts the call without sending anything.
pub trait Middleware: Send + Sync {
    /// Handles one request, delegating to `next` for the rest of the chain.
    fn handle<'a>(
        &'a self,
        request: PipelineRequest,
        next: Next<'a>,
        cancel: &'a CancellationToken,
    ) -> MiddlewareFuture<'a>;
}

/// The remainder of the pipeline after the current stage.
///
/// `Next` is `Copy`, so a stage (such as retry) can run the remaining chain
/// more than once.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [Arc<dyn Middleware>],
    sender: &'a BaseSender,
}

impl<'a> Next<'a> {
    /// Runs the remaining stages, then the base sender.
    #[must_use]
    pub fn run(
        self,
        request: PipelineRequest,
        cancel: &'a CancellationToken,
    ) -> MiddlewareFuture<'a> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.handle(
                request,
                Self {
                    stages: rest,
                    sender: self.sender,
                },
                cancel,
            ),
            None => self.sender.send(request, cancel),
        }
    }
}

/// The assembled middleware chain wrapping a base `reqwest` sender.
pub struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
    sender: BaseSender,
}

impl Pipeline {
    /// Builds a pipeline from an ordered stage list (outermost first).
    #[must_use]
    pub fn new(stages: Vec<Arc<dyn Middleware>>, client: reqwest::Client) -> Self {
        Self {
            stages,
            sender: BaseSender { client },
        }
    }

    /// Runs a request through every stage and the base sender.
    ///
    /// # Errors
    ///
    /// Returns whatever error the stages or the sender produce; see
    /// [`Error`](crate::Error) for the taxonomy.
    pub async fn execute(
        &self,
        request: PipelineRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineResponse, Error> {
        Next {
            stages: &self.stages,
            sender: &self.sender,
        }
        .run(request, cancel)
        .await
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .finish_non_exhaustive()
    }
}

/// The innermost sender: executes the wire request with `reqwest`.
struct BaseSender {
    client: reqwest::Client,
}

impl BaseSender {
    fn send<'a>(
        &'a self,
        request: PipelineRequest,
        cancel: &'a CancellationToken,
    ) -> MiddlewareFuture<'a> {
        Box::pin(async move {
            let mut builder = match request.method {
                HttpMethod::Get => self.client.get(&request.url),
                HttpMethod::Post => self.client.post(&request.url),
                HttpMethod::Put => self.client.put(&request.url),
                HttpMethod::Delete => self.client.delete(&request.url),
            };

            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = tokio::select! {
                result = builder.send() => result.map_err(|source| Error::Transport {
                    attempts: 1,
                    source,
                })?,
                () = cancel.cancelled() => return Err(Error::Cancelled),
            };

            let status = response.status().as_u16();
            let mut headers: HashMap<String, Vec<String>> = HashMap::new();
            for (name, value) in response.headers() {
                let value = value.to_str().unwrap_or_default().to_string();
                headers
                    .entry(name.as_str().to_lowercase())
                    .or_default()
                    .push(value);
            }

            let body = tokio::select! {
                result = response.bytes() => result.map_err(|source| Error::Transport {
                    attempts: 1,
                    source,
                })?,
                () = cancel.cancelled() => return Err(Error::Cancelled),
            };

            Ok(PipelineResponse {
                status,
                headers,
                body: body.to_vec(),
                attempts: 1,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_request_lowercases_header_names() {
        let mut request = PipelineRequest::new(HttpMethod::Get, "https://example.com");
        request.set_header("Authorization", "Bearer token");
        request.set_header("X-Custom", "value");

        assert_eq!(
            request.headers.get("authorization"),
            Some(&"Bearer token".to_string())
        );
        assert_eq!(request.headers.get("x-custom"), Some(&"value".to_string()));
    }

    #[test]
    fn test_pipeline_response_is_ok_for_2xx_only() {
        let mut response = PipelineResponse {
            status: 200,
            headers: HashMap::new(),
            body: Vec::new(),
            attempts: 1,
        };
        assert!(response.is_ok());

        response.status = 204;
        assert!(response.is_ok());

        response.status = 404;
        assert!(!response.is_ok());

        response.status = 500;
        assert!(!response.is_ok());
    }

    #[test]
    fn test_pipeline_response_header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("intuit_tid".to_string(), vec!["tid-123".to_string()]);

        let response = PipelineResponse {
            status: 200,
            headers,
            body: Vec::new(),
            attempts: 1,
        };

        assert_eq!(response.header("intuit_tid"), Some("tid-123"));
        assert_eq!(response.header("Intuit_Tid"), Some("tid-123"));
        assert_eq!(response.header("missing"), None);
    }
}
