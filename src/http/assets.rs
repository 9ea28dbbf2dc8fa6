//! Static asset serving.
//!
//! Directories are served by `tower_http::services::ServeDir`. Prefixed
//! directories are nested under their prefix; unprefixed directories are
//! probed in registration order from the router fallback, before the
//! not-found handler.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::versioning::chain::BoxedHandler;

/// Options for [`crate::adapter::AxumAdapter::use_static_assets`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeStaticOptions {
    /// URL prefix to mount the directory under.
    pub prefix: Option<String>,
    /// Do not serve `index.html` for directory requests.
    pub no_index: bool,
}

/// A directory registered for static serving.
#[derive(Debug, Clone)]
pub struct StaticMount {
    pub root: PathBuf,
    pub options: ServeStaticOptions,
}

impl StaticMount {
    pub fn new(root: impl Into<PathBuf>, options: ServeStaticOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    /// Prefix to nest under, or `None` for the root.
    pub fn prefix(&self) -> Option<&str> {
        self.options
            .prefix
            .as_deref()
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty())
    }

    pub fn service(&self) -> ServeDir {
        ServeDir::new(&self.root)
            .append_index_html_on_directories(!self.options.no_index)
            .call_fallback_on_method_not_allowed(true)
    }
}

/// Fallback that tries each root directory before the not-found handler.
pub fn root_fallback(mounts: Vec<StaticMount>, not_found: BoxedHandler) -> BoxedHandler {
    let dirs: Arc<[ServeDir]> = mounts.iter().map(StaticMount::service).collect();

    Arc::new(move |req: Request<Body>| {
        let dirs = dirs.clone();
        let not_found = not_found.clone();
        Box::pin(async move {
            for dir in dirs.iter() {
                let probe = probe_request(&req);
                let response = match dir.clone().oneshot(probe).await {
                    Ok(response) => response,
                    Err(infallible) => match infallible {},
                };
                if response.status() != StatusCode::NOT_FOUND {
                    return response.map(Body::new);
                }
            }
            not_found(req).await
        }) as BoxFuture<'static, Response>
    })
}

/// Copy of the request head with an empty body; static serving ignores bodies.
fn probe_request(req: &Request<Body>) -> Request<Body> {
    let mut probe = Request::new(Body::empty());
    *probe.method_mut() = req.method().clone();
    *probe.uri_mut() = req.uri().clone();
    *probe.headers_mut() = req.headers().clone();
    probe
}
