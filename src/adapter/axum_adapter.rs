//! Adapter hooks implemented on axum.
//!
//! # Responsibilities
//! - Collect routes, version filters, static mounts, CORS and body parser settings
//! - Build the axum `Router` and its middleware stack
//! - Start and stop the HTTP server
//!
//! # Design Decisions
//! - Every route goes through a handler chain; unversioned routes carry a
//!   neutral filter
//! - One axum route per path; the method is resolved by the path dispatcher,
//!   so `All` registrations can share a path with method-specific ones
//! - The router is rebuilt from the registrations on every `listen`

use std::any::Any;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::handler::Handler;
use axum::http::{Method, Request, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Extension, Router};
use futures_util::future::BoxFuture;
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::adapter::context::{AppContext, SETTING_TRUST_PROXY, SETTING_VIEWS, SETTING_VIEW_ENGINE};
use crate::adapter::{HttpAdapter, RequestMethod};
use crate::config::{AdapterConfig, CorsConfig};
use crate::error::{AdapterError, AdapterResult};
use crate::http::assets::{root_fallback, ServeStaticOptions, StaticMount};
use crate::http::body::{
    get_body_parser_options, parse_body, under_prefix, BodyParserOptions, DEFAULT_BODY_LIMIT,
};
use crate::http::request::{self, record_metrics, UuidRequestId, X_REQUEST_ID};
use crate::http::response::{ReplyBody, ResponseHandle};
use crate::net::server::serve;
use crate::net::{RunningServer, ServerOptions};
use crate::security::cors::cors_layer;
use crate::versioning::chain::{boxed, BoxedHandler, ErrorHandler};
use crate::versioning::{
    HandlerChain, Next, VersionFilter, VersionSpec, VersionedHandler, VersioningOptions,
};
use crate::views::ViewEngine;

struct ChainEntry {
    path: String,
    method: RequestMethod,
    chain: HandlerChain,
}

/// Chains registered for one path, selected by request method.
#[derive(Clone)]
struct PathDispatch {
    by_method: Arc<HashMap<Method, Next>>,
    any: Option<Next>,
    not_found: BoxedHandler,
}

impl PathDispatch {
    fn dispatch(&self, req: Request<Body>) -> BoxFuture<'static, Response> {
        let method = req.method();
        let next = self
            .by_method
            .get(method)
            .or_else(|| {
                // GET routes answer HEAD, as axum's method router does.
                (*method == Method::HEAD)
                    .then(|| self.by_method.get(&Method::GET))
                    .flatten()
            })
            .or(self.any.as_ref());

        match next {
            Some(next) => next.clone().run(req),
            None => (self.not_found)(req),
        }
    }
}

/// HTTP adapter backed by axum and axum-server.
pub struct AxumAdapter {
    context: AppContext,
    chains: Vec<ChainEntry>,
    static_mounts: Vec<StaticMount>,
    cors: Option<CorsLayer>,
    body_parser: Option<BodyParserOptions>,
    not_found: BoxedHandler,
    error_handler: ErrorHandler,
    server_options: ServerOptions,
    server: Option<RunningServer>,
}

impl Default for AxumAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl AxumAdapter {
    pub fn new() -> Self {
        Self {
            context: AppContext::new(),
            chains: Vec::new(),
            static_mounts: Vec::new(),
            cors: None,
            body_parser: None,
            not_found: boxed(|| async { (StatusCode::NOT_FOUND, "Not Found") }),
            error_handler: Arc::new(|err: AdapterError| err.into_response()),
            server_options: ServerOptions::default(),
            server: None,
        }
    }

    /// Create an adapter with the middleware described by `config`.
    ///
    /// Routes are not part of the config; register them afterwards.
    pub fn from_config(config: &AdapterConfig) -> AdapterResult<Self> {
        let mut adapter = Self::new();
        adapter.init_http_server(ServerOptions::from(config));

        if config.body_parser.enabled {
            adapter.body_parser = Some(get_body_parser_options(
                config.body_parser.raw_body,
                Some(BodyParserOptions {
                    limit: config.body_parser.limit_bytes,
                    raw_body: false,
                    prefix: config.body_parser.prefix.clone(),
                }),
            ));
        }

        if config.cors.enabled {
            adapter.enable_cors(&config.cors)?;
        }

        for assets in &config.static_assets {
            adapter.use_static_assets(
                &assets.path,
                ServeStaticOptions {
                    prefix: assets.prefix.clone(),
                    no_index: !assets.index,
                },
            );
        }

        if let Some(dir) = &config.views.base_dir {
            adapter.set_base_views_dir(dir);
        }
        if let Some(ext) = &config.views.engine {
            adapter.set_view_engine(ext);
        }

        Ok(adapter)
    }

    /// Shared settings, locals, and view engines.
    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn set(&mut self, key: &str, value: Value) -> &mut Self {
        self.context.set(key, value);
        self
    }

    pub fn enable(&mut self, key: &str) -> &mut Self {
        self.context.enable(key);
        self
    }

    pub fn disable(&mut self, key: &str) -> &mut Self {
        self.context.disable(key);
        self
    }

    pub fn enabled(&self, key: &str) -> bool {
        self.context.enabled(key)
    }

    pub fn set_local(&mut self, key: &str, value: Value) -> &mut Self {
        self.context.set_local(key, value);
        self
    }

    /// Register a view engine for a template extension.
    pub fn engine(&mut self, ext: &str, engine: Arc<dyn ViewEngine>) -> &mut Self {
        self.context.register_engine(ext, engine);
        self
    }

    pub fn set_base_views_dir(&mut self, dir: &str) -> &mut Self {
        self.context.set(SETTING_VIEWS, Value::String(dir.to_string()));
        self
    }

    pub fn set_view_engine(&mut self, ext: &str) -> &mut Self {
        self.context.set(SETTING_VIEW_ENGINE, Value::String(ext.to_string()));
        self
    }

    /// Register an unversioned handler.
    pub fn route<H, T>(&mut self, method: RequestMethod, path: &str, handler: H) -> &mut Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let versioned = VersionedHandler::new(VersionFilter::neutral(), boxed(handler));
        self.push_chain(method, normalize_path(path), versioned);
        self
    }

    /// Pair a handler with a version filter.
    pub fn apply_version_filter(
        &self,
        handler: BoxedHandler,
        version: VersionSpec,
        options: VersioningOptions,
    ) -> AdapterResult<VersionedHandler> {
        let filter = VersionFilter::new(version, options)?;
        Ok(VersionedHandler::new(filter, handler))
    }

    /// Register a handler that only serves `version`.
    ///
    /// URI versioning mounts the handler under `/{prefix}{token}{path}` for
    /// every token, plus the bare path when the set lists the neutral version.
    /// The other strategies share one chain per method and path.
    pub fn route_versioned<H, T>(
        &mut self,
        method: RequestMethod,
        path: &str,
        version: VersionSpec,
        options: VersioningOptions,
        handler: H,
    ) -> AdapterResult<&mut Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let versioned = self.apply_version_filter(boxed(handler), version.clone(), options)?;

        let prefix = match versioned.filter().options() {
            VersioningOptions::Uri { prefix } => Some(prefix.clone()),
            _ => None,
        };

        match prefix {
            Some(prefix) => {
                let base = normalize_path(path);
                let suffix = if base == "/" { "" } else { base.as_str() };
                for token in version.tokens() {
                    let mounted = format!("/{prefix}{token}{suffix}");
                    tracing::debug!(path = %mounted, "Mounting URI-versioned route");
                    self.push_chain(method, mounted, versioned.clone());
                }
                if version.includes_neutral() {
                    self.push_chain(method, base, versioned);
                }
            }
            None => self.push_chain(method, normalize_path(path), versioned),
        }

        Ok(self)
    }

    fn push_chain(&mut self, method: RequestMethod, path: String, handler: VersionedHandler) {
        match self
            .chains
            .iter_mut()
            .find(|entry| entry.method == method && entry.path == path)
        {
            Some(entry) => entry.chain.push(handler),
            None => {
                let mut chain = HandlerChain::new();
                chain.push(handler);
                self.chains.push(ChainEntry { path, method, chain });
            }
        }
    }

    /// Registrar that mounts handlers for `method`.
    pub fn create_middleware_factory(&mut self, method: RequestMethod) -> MiddlewareFactory<'_> {
        MiddlewareFactory {
            adapter: self,
            method,
        }
    }

    /// Serve files from `path`.
    pub fn use_static_assets(
        &mut self,
        path: impl Into<PathBuf>,
        options: ServeStaticOptions,
    ) -> &mut Self {
        let mount = StaticMount::new(path, options);
        tracing::debug!(
            root = %mount.root.display(),
            prefix = mount.prefix().unwrap_or("/"),
            "Static assets registered"
        );
        self.static_mounts.push(mount);
        self
    }

    pub fn enable_cors(&mut self, config: &CorsConfig) -> AdapterResult<&mut Self> {
        self.cors = Some(cors_layer(config)?);
        Ok(self)
    }

    /// Install JSON and urlencoded body parsing.
    ///
    /// A previously configured size limit is kept.
    pub fn register_parser_middleware(&mut self, prefix: Option<&str>, raw_body: bool) -> &mut Self {
        let limit = self
            .body_parser
            .as_ref()
            .map_or(DEFAULT_BODY_LIMIT, |options| options.limit);
        self.body_parser = Some(get_body_parser_options(
            raw_body,
            Some(BodyParserOptions {
                limit,
                raw_body: false,
                prefix: prefix.map(str::to_string),
            }),
        ));
        self
    }

    pub fn set_error_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(AdapterError) -> Response + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(handler);
        self
    }

    pub fn set_not_found_handler<H, T>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.not_found = boxed(handler);
        self
    }

    pub fn init_http_server(&mut self, options: ServerOptions) -> &mut Self {
        self.server_options = options;
        self
    }

    /// Address of the running server.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(RunningServer::local_addr)
    }

    /// Build the axum router from the current registrations.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let mut router = Router::new();

        // With a parser prefix, only routes below it get the body limit.
        let scoped_limit = self
            .body_parser
            .as_ref()
            .and_then(|options| options.prefix.as_deref().map(|prefix| (prefix, options.limit)));

        for (path, dispatch) in self.dispatch_table() {
            let mut method_router = any(move |req: Request<Body>| dispatch.dispatch(req));
            if let Some((prefix, limit)) = scoped_limit {
                if under_prefix(&path, prefix) {
                    method_router = method_router.layer(RequestBodyLimitLayer::new(limit));
                }
            }
            router = router.route(&path, method_router);
        }

        let mut root_mounts = Vec::new();
        for mount in &self.static_mounts {
            match mount.prefix() {
                Some(prefix) => router = router.nest_service(prefix, mount.service()),
                None => root_mounts.push(mount.clone()),
            }
        }

        let fallback = if root_mounts.is_empty() {
            self.not_found.clone()
        } else {
            root_fallback(root_mounts, self.not_found.clone())
        };
        router = router.fallback(move |req: Request<Body>| fallback(req));

        if let Some(timeout) = self.server_options.request_timeout {
            router = router.layer(TimeoutLayer::new(timeout));
        }

        if let Some(options) = &self.body_parser {
            router = router.layer(middleware::from_fn_with_state(
                Arc::new(options.clone()),
                parse_body,
            ));
            if options.prefix.is_none() {
                router = router.layer(RequestBodyLimitLayer::new(options.limit));
            }
        }

        router = router.layer(Extension(self.context.clone()));

        if let Some(cors) = &self.cors {
            router = router.layer(cors.clone());
        }

        let on_panic = self.error_handler.clone();
        router
            .layer(CatchPanicLayer::custom(
                move |panic: Box<dyn Any + Send + 'static>| {
                    on_panic(AdapterError::HandlerPanicked(panic_message(panic.as_ref())))
                },
            ))
            .layer(middleware::from_fn(record_metrics))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// Group chains by path. Method-specific chains fall through to the
    /// path's `All` chain before the not-found handler.
    fn dispatch_table(&self) -> HashMap<String, PathDispatch> {
        let mut grouped: HashMap<&str, Vec<&ChainEntry>> = HashMap::new();
        for entry in &self.chains {
            grouped.entry(entry.path.as_str()).or_default().push(entry);
        }

        grouped
            .into_iter()
            .map(|(path, entries)| {
                let any = entries
                    .iter()
                    .find(|entry| entry.method == RequestMethod::All)
                    .map(|entry| {
                        entry
                            .chain
                            .clone()
                            .into_next(self.not_found.clone(), self.error_handler.clone())
                    });

                let fallback: BoxedHandler = match &any {
                    Some(any) => {
                        let any = any.clone();
                        Arc::new(move |req: Request<Body>| any.clone().run(req))
                    }
                    None => self.not_found.clone(),
                };

                let by_method: HashMap<Method, Next> = entries
                    .iter()
                    .filter_map(|entry| {
                        let method = entry.method.as_method()?;
                        let next = entry
                            .chain
                            .clone()
                            .into_next(fallback.clone(), self.error_handler.clone());
                        Some((method, next))
                    })
                    .collect();

                let dispatch = PathDispatch {
                    by_method: Arc::new(by_method),
                    any,
                    not_found: self.not_found.clone(),
                };
                (path.to_string(), dispatch)
            })
            .collect()
    }

    /// Build the router and start serving on `addr`. Returns the bound address.
    pub async fn listen(&mut self, addr: &str) -> AdapterResult<SocketAddr> {
        if self.server.is_some() {
            return Err(AdapterError::AlreadyListening);
        }

        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| AdapterError::InvalidAddress(addr.to_string()))?;

        let running = serve(self.router(), addr, &self.server_options).await?;
        let local_addr = running.local_addr();
        self.server = Some(running);
        Ok(local_addr)
    }

    /// Stop the server. Does nothing when the adapter is not listening.
    pub async fn close(&mut self) -> AdapterResult<()> {
        match self.server.take() {
            Some(server) => server.close().await,
            None => Ok(()),
        }
    }
}

/// Add the leading slash and rewrite `:name` / `*name` segments into axum
/// captures (`{name}` / `{*name}`).
fn normalize_path(path: &str) -> String {
    let segments: Vec<String> = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':').filter(|n| !n.is_empty()) {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                let name = if name.is_empty() { "rest" } else { name };
                format!("{{*{name}}}")
            } else {
                segment.to_string()
            }
        })
        .collect();
    format!("/{}", segments.join("/"))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

/// Mounts handlers for one method. Created by
/// [`AxumAdapter::create_middleware_factory`].
pub struct MiddlewareFactory<'a> {
    adapter: &'a mut AxumAdapter,
    method: RequestMethod,
}

impl MiddlewareFactory<'_> {
    pub fn register<H, T>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.adapter.route(self.method, path, handler);
        self
    }
}

impl HttpAdapter for AxumAdapter {
    type Request = Request<Body>;
    type Response = ResponseHandle;

    fn reply(
        &self,
        res: &mut ResponseHandle,
        body: ReplyBody,
        status: Option<StatusCode>,
    ) -> AdapterResult<()> {
        if let Some(status) = status {
            res.set_status(status);
        }
        res.send(body)
    }

    fn status(&self, res: &mut ResponseHandle, status: StatusCode) {
        res.set_status(status);
    }

    fn end(&self, res: &mut ResponseHandle, message: Option<&str>) -> AdapterResult<()> {
        res.end(message)
    }

    fn render(&self, res: &mut ResponseHandle, view: &str, context: &Value) -> AdapterResult<()> {
        let html = self.context.render(view, context)?;
        res.send(ReplyBody::Text(html))
    }

    fn redirect(&self, res: &mut ResponseHandle, status: StatusCode, url: &str) -> AdapterResult<()> {
        res.redirect(status, url)
    }

    fn is_headers_sent(&self, res: &ResponseHandle) -> bool {
        res.is_sent()
    }

    fn set_header(&self, res: &mut ResponseHandle, name: &str, value: &str) -> AdapterResult<()> {
        res.set_header(name, value)
    }

    fn get_request_hostname(&self, req: &Request<Body>) -> Option<String> {
        request::hostname(req, self.context.enabled(SETTING_TRUST_PROXY))
    }

    fn get_request_method<'a>(&self, req: &'a Request<Body>) -> &'a str {
        request::method(req)
    }

    fn get_request_url(&self, req: &Request<Body>) -> String {
        request::original_url(req)
    }

    fn get_type(&self) -> &'static str {
        "axum"
    }
}
