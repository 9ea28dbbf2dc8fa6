//! Response handle used by the adapter's reply hooks.
//!
//! # Responsibilities
//! - Collect status, headers, and body before the response is handed to axum
//! - Track whether the response has been sent
//! - Default `Content-Type` by body kind when the caller did not set one
//!
//! # Design Decisions
//! - Writing after the response was sent is an error, not a silent overwrite
//! - Header names/values are validated on insert, so conversion never fails

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::error::{AdapterError, AdapterResult};

/// Body accepted by [`ResponseHandle::send`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Empty,
    Text(String),
    Json(Value),
    Bytes(Bytes),
}

impl ReplyBody {
    fn default_content_type(&self) -> Option<&'static str> {
        match self {
            ReplyBody::Empty => None,
            ReplyBody::Text(_) => Some("text/html; charset=utf-8"),
            ReplyBody::Json(_) => Some("application/json"),
            ReplyBody::Bytes(_) => Some("application/octet-stream"),
        }
    }

    fn into_bytes(self) -> Bytes {
        match self {
            ReplyBody::Empty => Bytes::new(),
            ReplyBody::Text(text) => Bytes::from(text),
            ReplyBody::Json(value) => Bytes::from(value.to_string()),
            ReplyBody::Bytes(bytes) => bytes,
        }
    }
}

impl From<&str> for ReplyBody {
    fn from(text: &str) -> Self {
        ReplyBody::Text(text.to_string())
    }
}

impl From<String> for ReplyBody {
    fn from(text: String) -> Self {
        ReplyBody::Text(text)
    }
}

impl From<Value> for ReplyBody {
    fn from(value: Value) -> Self {
        ReplyBody::Json(value)
    }
}

impl From<Vec<u8>> for ReplyBody {
    fn from(bytes: Vec<u8>) -> Self {
        ReplyBody::Bytes(Bytes::from(bytes))
    }
}

impl From<Bytes> for ReplyBody {
    fn from(bytes: Bytes) -> Self {
        ReplyBody::Bytes(bytes)
    }
}

/// A response under construction.
#[derive(Debug, Clone)]
pub struct ResponseHandle {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    sent: bool,
}

impl Default for ResponseHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseHandle {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            sent: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Insert a header, replacing any previous value.
    pub fn set_header(&mut self, name: &str, value: &str) -> AdapterResult<()> {
        if self.sent {
            return Err(AdapterError::HeadersAlreadySent);
        }
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| AdapterError::InvalidHeaderName(name.to_string()))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| AdapterError::InvalidHeaderValue { name: name.to_string() })?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// Write the body and mark the response as sent.
    pub fn send(&mut self, body: ReplyBody) -> AdapterResult<()> {
        if self.sent {
            return Err(AdapterError::HeadersAlreadySent);
        }
        if let Some(content_type) = body.default_content_type() {
            if !self.headers.contains_key(header::CONTENT_TYPE) {
                self.headers
                    .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }
        self.body = body.into_bytes();
        self.sent = true;
        Ok(())
    }

    /// Finish the response with an optional plain message.
    pub fn end(&mut self, message: Option<&str>) -> AdapterResult<()> {
        if self.sent {
            return Err(AdapterError::HeadersAlreadySent);
        }
        if let Some(message) = message {
            self.body = Bytes::copy_from_slice(message.as_bytes());
        }
        self.sent = true;
        Ok(())
    }

    /// Redirect to `url` with the given status.
    pub fn redirect(&mut self, status: StatusCode, url: &str) -> AdapterResult<()> {
        self.set_header(header::LOCATION.as_str(), url)?;
        self.status = status;
        self.sent = true;
        Ok(())
    }
}

impl IntoResponse for ResponseHandle {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
