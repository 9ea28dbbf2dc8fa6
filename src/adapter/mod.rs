//! Framework-facing adapter.
//!
//! # Data Flow
//! ```text
//! Framework registration:
//!     route / route_versioned / create_middleware_factory
//!     → versioning::chain (one chain per method + path)
//!
//! listen(addr):
//!     axum_adapter.rs builds the Router (chains, statics, layers)
//!     → net::server (axum-server task)
//!
//! Inside a handler:
//!     HttpAdapter hooks → http::response / http::request
//! ```

pub mod axum_adapter;
pub mod context;

use axum::http::{Method, StatusCode};
use serde_json::Value;

use crate::error::AdapterResult;
use crate::http::response::ReplyBody;

pub use axum_adapter::{AxumAdapter, MiddlewareFactory};
pub use context::AppContext;

/// Request/response hooks the framework drives.
///
/// Response hooks mutate a response under construction; request hooks are
/// read-only accessors.
pub trait HttpAdapter {
    type Request;
    type Response;

    /// Write `body`, optionally setting `status` first.
    fn reply(
        &self,
        res: &mut Self::Response,
        body: ReplyBody,
        status: Option<StatusCode>,
    ) -> AdapterResult<()>;

    fn status(&self, res: &mut Self::Response, status: StatusCode);

    fn end(&self, res: &mut Self::Response, message: Option<&str>) -> AdapterResult<()>;

    /// Render a view into an HTML body.
    fn render(&self, res: &mut Self::Response, view: &str, context: &Value) -> AdapterResult<()>;

    fn redirect(&self, res: &mut Self::Response, status: StatusCode, url: &str)
        -> AdapterResult<()>;

    fn is_headers_sent(&self, res: &Self::Response) -> bool;

    fn set_header(&self, res: &mut Self::Response, name: &str, value: &str) -> AdapterResult<()>;

    fn get_request_hostname(&self, req: &Self::Request) -> Option<String>;

    fn get_request_method<'a>(&self, req: &'a Self::Request) -> &'a str;

    fn get_request_url(&self, req: &Self::Request) -> String;

    /// Name of the underlying HTTP library.
    fn get_type(&self) -> &'static str;
}

/// HTTP method a handler is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    /// Every method.
    All,
}

impl RequestMethod {
    /// The concrete method, or `None` for [`RequestMethod::All`].
    pub fn as_method(self) -> Option<Method> {
        match self {
            RequestMethod::Get => Some(Method::GET),
            RequestMethod::Post => Some(Method::POST),
            RequestMethod::Put => Some(Method::PUT),
            RequestMethod::Delete => Some(Method::DELETE),
            RequestMethod::Patch => Some(Method::PATCH),
            RequestMethod::Options => Some(Method::OPTIONS),
            RequestMethod::Head => Some(Method::HEAD),
            RequestMethod::All => None,
        }
    }
}
