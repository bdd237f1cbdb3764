//! Error types for API calls.
//!
//! This module contains the error taxonomy surfaced by the transport
//! pipeline and the API client:
//!
//! - [`ApiError`]: structured non-2xx response from the provider
//! - [`RateLimitedError`]: 429 responses that survived retry
//! - [`DecodeError`]: response body does not match the expected shape
//! - [`InvalidRequestError`]: request failed validation before sending
//! - [`Error`]: unified error type encompassing all of the above
//!
//! # Error Handling
//!
//! Every failure is returned as a value; the pipeline never converts a
//! failure into a fabricated success. Callers pattern-match on [`Error`]:
//!
//! ```rust,ignore
//! match client.execute::<Invoice>(request, &cancel).await {
//!     Ok(invoice) => println!("{}", invoice.id),
//!     Err(Error::Api(e)) => eprintln!("API error {}: {}", e.status, e.message),
//!     Err(Error::RateLimited(e)) => eprintln!("throttled after {} attempts", e.attempts),
//!     Err(Error::Cancelled) => eprintln!("cancelled"),
//!     Err(other) => eprintln!("{other}"),
//! }
//! ```

use serde::Deserialize;
use thiserror::Error as ThisError;

use crate::auth::AuthError;
use crate::transport::PipelineResponse;

/// A structured error response from the QuickBooks API.
///
/// Carries the HTTP status, the provider's fault code and message when the
/// body contains the standard fault envelope, the number of attempts the
/// pipeline made, and the provider request ID (`intuit_tid` header) for
/// support tickets.
#[derive(Debug, ThisError)]
#[error("QuickBooks API error (status {status}): {message}")]
pub struct ApiError {
    /// The HTTP status code of the response.
    pub status: u16,
    /// The provider fault code (e.g. `610`), if present.
    pub code: Option<String>,
    /// The fault message, or the raw body when no envelope was present.
    pub message: String,
    /// The fault detail, if present.
    pub detail: Option<String>,
    /// How many attempts the pipeline made before giving up.
    pub attempts: u32,
    /// The provider request ID for error reports.
    pub request_id: Option<String>,
}

/// Error returned when 429 responses survive the retry budget.
#[derive(Debug, ThisError)]
#[error("Rate limited by the QuickBooks API after {attempts} attempt(s).")]
pub struct RateLimitedError {
    /// How many attempts the pipeline made before giving up.
    pub attempts: u32,
    /// Seconds to wait before retrying, from the `Retry-After` header.
    pub retry_after: Option<f64>,
    /// The provider request ID for error reports.
    pub request_id: Option<String>,
}

/// Error returned when a 2xx response body does not match the expected type.
///
/// Decode failures are never retried: the schema will not change on the next
/// attempt.
#[derive(Debug, ThisError)]
#[error("Failed to decode response body: {source}")]
pub struct DecodeError {
    /// The underlying parse error.
    #[source]
    pub source: serde_json::Error,
}

/// Error returned when a request fails validation before being sent.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum InvalidRequestError {
    /// A POST or PUT request was built without a body.
    #[error("Cannot use {method} without specifying a body.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// The request path is empty.
    #[error("Request path cannot be empty.")]
    EmptyPath,
}

/// Unified error type for all API call failures.
///
/// This enum provides a single error type for the transport pipeline, the
/// client, and the pager, making it easy to handle errors at API boundaries
/// while still allowing pattern matching on specific kinds.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Token load, refresh, or injection failed; no request was sent.
    #[error(transparent)]
    Auth(AuthError),

    /// A connection-level failure (DNS, TLS, timeout), after retries.
    #[error("Network error after {attempts} attempt(s): {source}")]
    Transport {
        /// How many attempts the pipeline made.
        attempts: u32,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// A non-2xx response from the provider.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A 429 response that survived the retry budget.
    #[error(transparent)]
    RateLimited(#[from] RateLimitedError),

    /// A 2xx response body that does not match the expected shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The request failed validation before being sent.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequestError),

    /// The caller's cancellation token fired before the call completed.
    #[error("The operation was cancelled.")]
    Cancelled,
}

impl Error {
    /// Maps an auth failure into the unified taxonomy, keeping cancellation
    /// distinguishable from provider errors.
    #[must_use]
    pub fn from_auth(error: AuthError) -> Self {
        match error {
            AuthError::Cancelled => Self::Cancelled,
            other => Self::Auth(other),
        }
    }

    /// Returns `true` if this error is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the HTTP status associated with this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.status),
            Self::RateLimited(_) => Some(429),
            _ => None,
        }
    }

    /// Returns how many attempts the pipeline made, if this error came out
    /// of the retry stage.
    #[must_use]
    pub const fn attempts(&self) -> Option<u32> {
        match self {
            Self::Api(e) => Some(e.attempts),
            Self::RateLimited(e) => Some(e.attempts),
            Self::Transport { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

/// The provider's fault envelope, as returned on error responses.
#[derive(Debug, Deserialize)]
struct FaultEnvelope {
    #[serde(rename = "Fault")]
    fault: Fault,
}

#[derive(Debug, Deserialize)]
struct Fault {
    #[serde(rename = "Error", default)]
    errors: Vec<FaultDetail>,
}

#[derive(Debug, Deserialize)]
struct FaultDetail {
    #[serde(rename = "Message", default)]
    message: Option<String>,
    #[serde(rename = "Detail", default)]
    detail: Option<String>,
    #[serde(rename = "code", default)]
    code: Option<String>,
}

impl ApiError {
    /// Builds an error from a non-2xx pipeline response, parsing the fault
    /// envelope when the body carries one.
    #[must_use]
    pub fn from_response(response: &PipelineResponse) -> Self {
        let request_id = response.header("intuit_tid").map(str::to_string);

        let parsed: Option<FaultEnvelope> = serde_json::from_slice(&response.body).ok();
        let first = parsed
            .as_ref()
            .and_then(|envelope| envelope.fault.errors.first());

        let message = first.and_then(|f| f.message.clone()).unwrap_or_else(|| {
            let body = String::from_utf8_lossy(&response.body);
            if body.trim().is_empty() {
                format!("HTTP status {}", response.status)
            } else {
                body.into_owned()
            }
        });

        Self {
            status: response.status,
            code: first.and_then(|f| f.code.clone()),
            message,
            detail: first.and_then(|f| f.detail.clone()),
            attempts: response.attempts,
            request_id,
        }
    }
}

impl RateLimitedError {
    /// Builds an error from a 429 pipeline response.
    #[must_use]
    pub fn from_response(response: &PipelineResponse) -> Self {
        Self {
            attempts: response.attempts,
            retry_after: response
                .header("retry-after")
                .and_then(|value| value.trim().parse().ok()),
            request_id: response.header("intuit_tid").map(str::to_string),
        }
    }
}
