//! Request/response logging with secret redaction.

use std::collections::HashMap;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::transport::{Middleware, MiddlewareFuture, Next, PipelineRequest};

/// The fixed mask recorded in place of a sensitive header value.
pub const REDACTED_VALUE: &str = "[REDACTED]";

/// Header names whose values are never recorded.
const SENSITIVE_HEADERS: [&str; 6] = [
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "api-key",
    "x-api-key",
];

/// Returns the value to record for a header: the fixed mask for sensitive
/// names, the value itself otherwise.
///
/// `name` must already be lowercase, which pipeline header maps guarantee.
#[must_use]
pub fn redact_header_value<'a>(name: &str, value: &'a str) -> &'a str {
    if SENSITIVE_HEADERS.contains(&name) {
        REDACTED_VALUE
    } else {
        value
    }
}

fn redact_request_headers(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| (name.clone(), redact_header_value(name, value).to_string()))
        .collect()
}

fn redact_response_headers(
    headers: &HashMap<String, Vec<String>>,
) -> HashMap<String, Vec<String>> {
    headers
        .iter()
        .map(|(name, values)| {
            let values = values
                .iter()
                .map(|value| redact_header_value(name, value).to_string())
                .collect();
            (name.clone(), values)
        })
        .collect()
}

/// Records method, URL, status, and duration for every attempt.
///
/// Sits innermost in the chain so it observes the headers actually sent,
/// after auth injection. Sensitive header values are replaced with
/// [`REDACTED_VALUE`] before recording; the literal value never reaches the
/// log event.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingStage;

impl LoggingStage {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for LoggingStage {
    fn handle<'a>(
        &'a self,
        request: PipelineRequest,
        next: Next<'a>,
        cancel: &'a CancellationToken,
    ) -> MiddlewareFuture<'a> {
        Box::pin(async move {
            let method = request.method;
            let url = request.url.clone();
            let request_headers = redact_request_headers(&request.headers);

            tracing::debug!(
                %method,
                %url,
                headers = ?request_headers,
                "Sending request"
            );

            let start = Instant::now();
            let result = next.run(request, cancel).await;
            let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match &result {
                Ok(response) => {
                    tracing::debug!(
                        %method,
                        %url,
                        status = response.status,
                        duration_ms,
                        headers = ?redact_response_headers(&response.headers),
                        "Received response"
                    );
                }
                Err(error) => {
                    tracing::debug!(%method, %url, duration_ms, %error, "Request failed");
                }
            }

            result
        })
    }
}
