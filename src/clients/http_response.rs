//! HTTP response types for the QuickBooks API SDK.
//!
//! This module provides the [`ApiResponse`] type for accessing API response
//! data and decoding it into typed results.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::clients::errors::DecodeError;
use crate::transport::PipelineResponse;

/// A successful (2xx) response from the QuickBooks API.
///
/// The body is kept as raw bytes and handed to the caller unmodified;
/// [`json`](Self::json) decodes it into the caller's type on demand. Non-2xx
/// responses never become an `ApiResponse`; the client maps them to
/// [`ApiError`](crate::ApiError) before this type is constructed.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    /// The HTTP status code.
    pub status: u16,
    /// Response headers, keyed by lowercase name (headers may repeat).
    pub headers: HashMap<String, Vec<String>>,
    /// The raw response body bytes.
    pub body: Vec<u8>,
    /// How many attempts the pipeline made to obtain this response.
    pub attempts: u32,
}

impl ApiResponse {
    /// Wraps a pipeline response.
    #[must_use]
    pub fn new(response: PipelineResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers,
            body: response.body,
            attempts: response.attempts,
        }
    }

    /// Returns the first value of the named header, if present.
    ///
    /// Lookup is case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the provider request ID (`intuit_tid` header), if present.
    ///
    /// This ID is useful for debugging and should be included in error reports.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("intuit_tid")
    }

    /// Decodes the body into the caller's type.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        serde_json::from_slice(&self.body).map_err(|source| DecodeError { source })
    }

    /// Returns the body as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
