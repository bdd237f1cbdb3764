//! API client types for QuickBooks Online communication.
//!
//! This module provides the typed client layer over the transport pipeline:
//! request building, execution, response decoding, and the error taxonomy.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ApiClient`]: The async client bound to one company connection
//! - [`ApiRequest`]: A typed request spec with a builder
//! - [`ApiResponse`]: A raw 2xx response with typed decoding
//! - [`HttpMethod`]: Supported HTTP methods (GET, POST, PUT, DELETE)
//! - [`Error`]: The unified error type for all API call failures
//!
//! # Example
//!
//! ```rust,ignore
//! use quickbooks_api::clients::{ApiClient, ApiRequest, HttpMethod};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = ApiClient::new(&config, company_id, token_source);
//!
//! let request = ApiRequest::builder(HttpMethod::Get, "companyinfo/1")
//!     .build()
//!     .unwrap();
//!
//! let info: CompanyInfoResponse = client
//!     .execute(request, &CancellationToken::new())
//!     .await?;
//! ```
//!
//! # Retry Behavior
//!
//! The pipeline retries 429 and 5xx responses and connection-level failures
//! with exponential backoff, up to the configured attempt budget. Other 4xx
//! responses are returned immediately. See
//! [`RetryPolicy`](crate::transport::RetryPolicy).

mod errors;
mod http_client;
mod http_request;
mod http_response;

pub use errors::{ApiError, DecodeError, Error, InvalidRequestError, RateLimitedError};
pub use http_client::{ApiClient, SDK_VERSION};
pub use http_request::{ApiRequest, ApiRequestBuilder, HttpMethod};
pub use http_response::ApiResponse;
