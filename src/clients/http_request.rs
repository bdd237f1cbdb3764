//! HTTP request types for the QuickBooks API SDK.
//!
//! This module provides the [`ApiRequest`] type and its builder for
//! constructing requests to the QuickBooks API.

use std::collections::HashMap;
use std::fmt;

use crate::clients::errors::InvalidRequestError;

/// HTTP methods supported by the QuickBooks API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET method for retrieving resources.
    Get,
    /// HTTP POST method for creating and updating resources.
    Post,
    /// HTTP PUT method for uploads.
    Put,
    /// HTTP DELETE method for removing resources.
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// A typed request to be sent to the QuickBooks API.
///
/// The path is relative to the company root
/// (`/v3/company/{realm}/`); the client prepends the base URL and company
/// segment when building the wire request.
///
/// Use [`ApiRequest::builder`] to construct requests with the builder pattern.
///
/// # Example
///
/// ```rust
/// use quickbooks_api::clients::{ApiRequest, HttpMethod};
/// use serde_json::json;
///
/// // GET request with query parameters
/// let get_request = ApiRequest::builder(HttpMethod::Get, "query")
///     .query_param("query", "select * from Invoice")
///     .build()
///     .unwrap();
///
/// // POST request with JSON body
/// let post_request = ApiRequest::builder(HttpMethod::Post, "invoice")
///     .body(json!({"Line": [], "CustomerRef": {"value": "1"}}))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct ApiRequest {
    /// The HTTP method for this request.
    pub method: HttpMethod,
    /// The path relative to the company root.
    pub path: String,
    /// The JSON request body, if any.
    pub body: Option<serde_json::Value>,
    /// Query parameters to append to the URL.
    pub query: Option<HashMap<String, String>>,
    /// Additional headers to include in the request.
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ApiRequest {
    /// Creates a new builder for constructing an `ApiRequest`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use quickbooks_api::clients::{ApiRequest, HttpMethod};
    ///
    /// let request = ApiRequest::builder(HttpMethod::Get, "companyinfo/1")
    ///     .build()
    ///     .unwrap();
    /// ```
    #[must_use]
    pub fn builder(method: HttpMethod, path: impl Into<String>) -> ApiRequestBuilder {
        ApiRequestBuilder::new(method, path)
    }

    /// Validates the request, ensuring it meets all requirements.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequestError`] if:
    /// - The path is empty
    /// - The method is `Post` or `Put` but no body is set
    pub fn verify(&self) -> Result<(), InvalidRequestError> {
        if self.path.is_empty() {
            return Err(InvalidRequestError::EmptyPath);
        }

        if matches!(self.method, HttpMethod::Post | HttpMethod::Put) && self.body.is_none() {
            return Err(InvalidRequestError::MissingBody {
                method: self.method.to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for constructing [`ApiRequest`] instances.
///
/// Provides a fluent API for building requests with optional parameters.
#[derive(Debug)]
pub struct ApiRequestBuilder {
    method: HttpMethod,
    path: String,
    body: Option<serde_json::Value>,
    query: Option<HashMap<String, String>>,
    extra_headers: Option<HashMap<String, String>>,
}

impl ApiRequestBuilder {
    /// Creates a new builder with the required method and path.
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: None,
            extra_headers: None,
        }
    }

    /// Sets the JSON request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<serde_json::Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets all query parameters at once.
    #[must_use]
    pub fn query(mut self, query: HashMap<String, String>) -> Self {
        self.query = Some(query);
        self
    }

    /// Adds a single query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Adds a single extra header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Builds the [`ApiRequest`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequestError`] if the request fails validation.
    pub fn build(self) -> Result<ApiRequest, InvalidRequestError> {
        let request = ApiRequest {
            method: self.method,
            path: self.path,
            body: self.body,
            query: self.query,
            extra_headers: self.extra_headers,
        };
        request.verify()?;
        Ok(request)
    }
}
