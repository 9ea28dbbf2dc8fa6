//! CORS layer construction.
//!
//! # Design Decisions
//! - `"*"` in origins or headers means "any"
//! - With credentials enabled, `"*"` mirrors the request instead; browsers
//!   reject a literal `*` alongside credentials

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;
use crate::error::{AdapterError, AdapterResult};

/// Build a `CorsLayer` from config.
pub fn cors_layer(config: &CorsConfig) -> AdapterResult<CorsLayer> {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        if config.allow_credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        }
    } else {
        let origins = config
            .allowed_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).map_err(|_| AdapterError::InvalidHeaderValue {
                    name: "access-control-allow-origin".to_string(),
                })
            })
            .collect::<AdapterResult<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    let methods = config
        .allowed_methods
        .iter()
        .map(|m| {
            Method::from_bytes(m.as_bytes())
                .map_err(|_| AdapterError::InvalidHeaderValue {
                    name: "access-control-allow-methods".to_string(),
                })
        })
        .collect::<AdapterResult<Vec<_>>>()?;

    let headers = if config.allowed_headers.iter().any(|h| h == "*") {
        if config.allow_credentials {
            AllowHeaders::mirror_request()
        } else {
            AllowHeaders::any()
        }
    } else {
        let names = config
            .allowed_headers
            .iter()
            .map(|h| {
                HeaderName::from_bytes(h.as_bytes())
                    .map_err(|_| AdapterError::InvalidHeaderName(h.clone()))
            })
            .collect::<AdapterResult<Vec<_>>>()?;
        AllowHeaders::list(names)
    };

    let mut layer = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(config.allow_credentials);

    if let Some(secs) = config.max_age_secs {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    tracing::debug!(
        origins = ?config.allowed_origins,
        credentials = config.allow_credentials,
        "CORS enabled"
    );

    Ok(layer)
}
