//! Authorization header injection.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::TokenSource;
use crate::clients::Error;
use crate::transport::{Middleware, MiddlewareFuture, Next, PipelineRequest};

/// Injects a bearer token from the [`TokenSource`] into every attempt.
///
/// The token is fetched per attempt, so a retry after a mid-flight expiry
/// picks up a freshly refreshed token. If the token source fails, the call
/// is aborted before anything is sent.
pub struct AuthStage {
    token_source: Arc<TokenSource>,
}

impl AuthStage {
    /// Creates the stage around a shared token source.
    #[must_use]
    pub fn new(token_source: Arc<TokenSource>) -> Self {
        Self { token_source }
    }
}

impl Middleware for AuthStage {
    fn handle<'a>(
        &'a self,
        request: PipelineRequest,
        next: Next<'a>,
        cancel: &'a CancellationToken,
    ) -> MiddlewareFuture<'a> {
        Box::pin(async move {
            let token = self
                .token_source
                .access_token(cancel)
                .await
                .map_err(Error::from_auth)?;

            let mut request = request;
            request.set_header("authorization", format!("Bearer {token}"));

            next.run(request, cancel).await
        })
    }
}
