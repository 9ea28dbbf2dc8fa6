//! Request body parsing middleware.
//!
//! # Responsibilities
//! - Decode JSON and urlencoded bodies into a [`ParsedBody`] extension
//! - Optionally keep the raw bytes as a [`RawBody`] extension
//! - Re-attach the buffered bytes so axum extractors still see the body
//!
//! # Design Decisions
//! - Decoding is delegated to `serde_json` and `url::form_urlencoded`
//! - Other content types pass through untouched
//! - Size is bounded twice: `RequestBodyLimitLayer` rejects declared lengths,
//!   buffering rejects streamed bodies past the same limit

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

/// Default body size limit (100 KiB).
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;

/// Effective body parser settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyParserOptions {
    /// Maximum accepted body size in bytes.
    pub limit: usize,
    /// Store the raw body bytes as a [`RawBody`] extension.
    pub raw_body: bool,
    /// Only parse bodies for paths under this prefix.
    pub prefix: Option<String>,
}

impl Default for BodyParserOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_BODY_LIMIT,
            raw_body: false,
            prefix: None,
        }
    }
}

/// Merge caller options with the raw-body flag.
pub fn get_body_parser_options(raw_body: bool, options: Option<BodyParserOptions>) -> BodyParserOptions {
    let mut options = options.unwrap_or_default();
    if raw_body {
        options.raw_body = true;
    }
    options
}

/// Decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(Value),
    Form(Map<String, Value>),
}

/// Raw request body bytes, present when raw-body capture is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBody(pub Bytes);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

fn body_kind(req: &Request<Body>) -> Option<BodyKind> {
    let content_type = req.headers().get(header::CONTENT_TYPE)?.to_str().ok()?;
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();

    if essence == "application/json" || essence.ends_with("+json") {
        Some(BodyKind::Json)
    } else if essence == "application/x-www-form-urlencoded" {
        Some(BodyKind::Form)
    } else {
        None
    }
}

/// True when `path` is `prefix` itself or lies below it.
pub(crate) fn under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    path == prefix || prefix.is_empty() || path.starts_with(&format!("{prefix}/"))
}

/// Decode urlencoded pairs. Repeated keys collect into an array.
fn parse_form(bytes: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            None => {
                map.insert(key.into_owned(), value);
            }
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
    map
}

/// Middleware that buffers and decodes JSON / urlencoded bodies.
pub async fn parse_body(
    State(options): State<Arc<BodyParserOptions>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(prefix) = &options.prefix {
        if !under_prefix(req.uri().path(), prefix) {
            return next.run(req).await;
        }
    }

    let Some(kind) = body_kind(&req) else {
        return next.run(req).await;
    };

    let (mut parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, options.limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, limit = options.limit, "Failed to buffer request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    if !bytes.is_empty() {
        let parsed = match kind {
            BodyKind::Json => match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => ParsedBody::Json(value),
                Err(e) => {
                    tracing::debug!(error = %e, "Malformed JSON body");
                    return (StatusCode::BAD_REQUEST, "Malformed JSON body").into_response();
                }
            },
            BodyKind::Form => ParsedBody::Form(parse_form(&bytes)),
        };
        parts.extensions.insert(parsed);
    }

    if options.raw_body {
        parts.extensions.insert(RawBody(bytes.clone()));
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::post, Extension, Router};
    use serde_json::json;
    use tower::ServiceExt;

    async fn echo(
        parsed: Option<Extension<ParsedBody>>,
        raw: Option<Extension<RawBody>>,
    ) -> String {
        let parsed = match parsed {
            Some(Extension(ParsedBody::Json(v))) => format!("json:{v}"),
            Some(Extension(ParsedBody::Form(m))) => format!("form:{}", Value::Object(m)),
            None => "none".to_string(),
        };
        let raw = raw.map(|Extension(RawBody(b))| b.len()).unwrap_or(0);
        format!("{parsed}|raw={raw}")
    }

    fn app(options: BodyParserOptions) -> Router {
        Router::new()
            .route("/api/echo", post(echo))
            .route("/other", post(echo))
            .layer(middleware::from_fn_with_state(Arc::new(options), parse_body))
    }

    async fn send(app: Router, path: &str, content_type: &str, body: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_json_body_parsed() {
        let (status, body) = send(
            app(BodyParserOptions::default()),
            "/api/echo",
            "application/json",
            r#"{"a":1}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("json:{}|raw=0", json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_form_body_with_repeated_keys() {
        let (_, body) = send(
            app(BodyParserOptions::default()),
            "/api/echo",
            "application/x-www-form-urlencoded; charset=utf-8",
            "a=1&b=x+y&a=2",
        )
        .await;
        assert_eq!(body, format!("form:{}|raw=0", json!({"a": ["1", "2"], "b": "x y"})));
    }

    #[tokio::test]
    async fn test_raw_body_kept() {
        let options = get_body_parser_options(true, None);
        let (_, body) = send(app(options), "/api/echo", "application/json", "[1,2]").await;
        assert_eq!(body, "json:[1,2]|raw=5");
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let (status, _) = send(
            app(BodyParserOptions::default()),
            "/api/echo",
            "application/json",
            "{not json",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let options = BodyParserOptions {
            limit: 4,
            ..Default::default()
        };
        let (status, _) = send(app(options), "/api/echo", "application/json", "[1,2,3]").await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_prefix_limits_parsing() {
        let options = BodyParserOptions {
            prefix: Some("/api".into()),
            ..Default::default()
        };
        let (_, body) = send(app(options.clone()), "/other", "application/json", "{}").await;
        assert_eq!(body, "none|raw=0");

        let (_, body) = send(app(options), "/api/echo", "application/json", "{}").await;
        assert_eq!(body, "json:{}|raw=0");
    }

    #[test]
    fn test_get_body_parser_options() {
        let options = get_body_parser_options(false, None);
        assert_eq!(options, BodyParserOptions::default());

        let options = get_body_parser_options(
            true,
            Some(BodyParserOptions {
                limit: 10,
                ..Default::default()
            }),
        );
        assert!(options.raw_body);
        assert_eq!(options.limit, 10);
    }
}
