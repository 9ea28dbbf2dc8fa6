//! Version-filtered handler chains.
//!
//! # Responsibilities
//! - Pair a route handler with its version filter
//! - Run the handler or the continuation, exactly one of them
//! - Link the handlers registered for one method + path into a chain
//!
//! # Design Decisions
//! - Chains are frozen into an `Arc<[VersionedHandler]>` when the router is
//!   built; dispatch never locks
//! - The continuation of entry *i* is entry *i + 1*; past the last entry the
//!   not-found handler runs
//! - Calling a handler without a continuation is allowed; it only fails when
//!   the filter actually has to defer

use std::sync::Arc;

use axum::body::Body;
use axum::handler::Handler;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::error::AdapterError;
use crate::observability::metrics;
use crate::versioning::filter::{Decision, VersionFilter};

/// Type-erased request handler.
pub type BoxedHandler = Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Response> + Send + Sync>;

/// Renders adapter errors into responses.
pub type ErrorHandler = Arc<dyn Fn(AdapterError) -> Response + Send + Sync>;

/// Erase an axum handler into a [`BoxedHandler`].
pub fn boxed<H, T>(handler: H) -> BoxedHandler
where
    H: Handler<T, ()>,
    T: 'static,
{
    Arc::new(move |req: Request<Body>| {
        let handler = handler.clone();
        Box::pin(handler.call(req, ())) as BoxFuture<'static, Response>
    })
}

/// A handler that only runs for the versions it was registered with.
#[derive(Clone)]
pub struct VersionedHandler {
    filter: VersionFilter,
    handler: BoxedHandler,
}

impl VersionedHandler {
    pub fn new(filter: VersionFilter, handler: BoxedHandler) -> Self {
        Self { filter, handler }
    }

    pub fn filter(&self) -> &VersionFilter {
        &self.filter
    }

    /// Run the handler or the continuation for this request.
    ///
    /// Fails with [`AdapterError::VersionFilterUnsupported`] when the filter
    /// defers and `next` is `None`.
    pub async fn call(
        &self,
        req: Request<Body>,
        next: Option<Next>,
    ) -> Result<Response, AdapterError> {
        let decision = self.filter.decide(&req);
        let strategy = self.filter.options().kind();
        metrics::record_version_decision(strategy, decision);

        tracing::trace!(
            strategy,
            decision = decision.as_str(),
            path = %req.uri().path(),
            "Version filter evaluated"
        );

        match decision {
            Decision::Handle => Ok((self.handler)(req).await),
            Decision::Next => match next {
                Some(next) => Ok(next.run(req).await),
                None => {
                    metrics::record_filter_misconfigured(strategy);
                    Err(AdapterError::VersionFilterUnsupported)
                }
            },
        }
    }
}

/// Continuation into the rest of a handler chain.
#[derive(Clone)]
pub struct Next {
    chain: Arc<[VersionedHandler]>,
    position: usize,
    fallback: BoxedHandler,
    on_error: ErrorHandler,
}

impl Next {
    /// Continue with the entry at the current position, or the fallback past the end.
    pub fn run(self, req: Request<Body>) -> BoxFuture<'static, Response> {
        Box::pin(async move {
            let Some(entry) = self.chain.get(self.position).cloned() else {
                return (self.fallback)(req).await;
            };

            let next = Next {
                chain: self.chain.clone(),
                position: self.position + 1,
                fallback: self.fallback.clone(),
                on_error: self.on_error.clone(),
            };

            match entry.call(req, Some(next)).await {
                Ok(response) => response,
                Err(err) => (self.on_error)(err),
            }
        })
    }
}

/// Handlers registered for one method + path, in registration order.
#[derive(Clone, Default)]
pub struct HandlerChain {
    entries: Vec<VersionedHandler>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handler: VersionedHandler) {
        self.entries.push(handler);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the chain into its entry continuation.
    pub fn into_next(self, fallback: BoxedHandler, on_error: ErrorHandler) -> Next {
        Next {
            chain: self.entries.into(),
            position: 0,
            fallback,
            on_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::{VersionSpec, VersioningOptions};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn header_handler(version: &'static str, body: &'static str) -> VersionedHandler {
        let filter = VersionFilter::new(
            VersionSpec::single(version),
            VersioningOptions::header("X-Api-Version").unwrap(),
        )
        .unwrap();
        VersionedHandler::new(filter, boxed(move || async move { body }))
    }

    fn not_found() -> BoxedHandler {
        boxed(|| async { StatusCode::NOT_FOUND })
    }

    fn on_error() -> ErrorHandler {
        Arc::new(|err: AdapterError| err.into_response())
    }

    fn request(version: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/users");
        if let Some(v) = version {
            builder = builder.header("X-Api-Version", v);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_call_without_continuation_fails_when_deferring() {
        let handler = header_handler("2", "v2");
        let result = handler.call(request(Some("3")), None).await;
        assert!(matches!(result, Err(AdapterError::VersionFilterUnsupported)));
    }

    fn handler_with(options: VersioningOptions) -> VersionedHandler {
        let filter = VersionFilter::new(VersionSpec::single("2"), options).unwrap();
        VersionedHandler::new(filter, boxed(|| async { "v2" }))
    }

    fn accept(value: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/users");
        if let Some(v) = value {
            builder = builder.header("Accept", v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_media_type_deferral_without_continuation_fails() {
        let handler = handler_with(VersioningOptions::media_type("v=").unwrap());

        for req in [accept(Some("application/json;v=3")), accept(Some("application/json")), accept(None)] {
            let result = handler.call(req, None).await;
            assert!(matches!(result, Err(AdapterError::VersionFilterUnsupported)));
        }

        let response = handler.call(accept(Some("application/json;v=2")), None).await.unwrap();
        assert_eq!(body_text(response).await, "v2");
    }

    #[tokio::test]
    async fn test_custom_deferral_without_continuation_fails() {
        let undefined = handler_with(VersioningOptions::custom(|_| None));
        let result = undefined.call(request(None), None).await;
        assert!(matches!(result, Err(AdapterError::VersionFilterUnsupported)));

        let mismatch = handler_with(VersioningOptions::custom(|_| Some(vec!["4", "5"].into())));
        let result = mismatch.call(request(None), None).await;
        assert!(matches!(result, Err(AdapterError::VersionFilterUnsupported)));
    }

    #[tokio::test]
    async fn test_call_without_continuation_succeeds_when_handling() {
        let handler = header_handler("2", "v2");
        let response = handler.call(request(Some("2")), None).await.unwrap();
        assert_eq!(body_text(response).await, "v2");
    }

    #[tokio::test]
    async fn test_chain_picks_first_matching_entry() {
        let mut chain = HandlerChain::new();
        chain.push(header_handler("1", "v1"));
        chain.push(header_handler("2", "v2"));
        let next = chain.into_next(not_found(), on_error());

        let response = next.clone().run(request(Some("2"))).await;
        assert_eq!(body_text(response).await, "v2");

        let response = next.clone().run(request(Some("1"))).await;
        assert_eq!(body_text(response).await, "v1");
    }

    #[tokio::test]
    async fn test_chain_falls_back_when_nothing_matches() {
        let mut chain = HandlerChain::new();
        chain.push(header_handler("1", "v1"));
        let next = chain.into_next(not_found(), on_error());

        let response = next.clone().run(request(Some("9"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = next.run(request(None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
