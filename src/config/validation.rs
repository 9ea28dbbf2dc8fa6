//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, header names, and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AdapterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, Method};

use crate::config::schema::{AdapterConfig, VersioningConfig};

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidAddress { field: &'static str, value: String },
    InvalidHeaderName(String),
    EmptyMediaTypeKey,
    InvalidMethod(String),
    EmptyStaticPath,
    InvalidPrefix(String),
    ZeroBodyLimit,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidAddress { field, value } => {
                write!(f, "{} is not a socket address: {}", field, value)
            }
            ValidationError::InvalidHeaderName(name) => {
                write!(f, "versioning.header is not a valid header name: {}", name)
            }
            ValidationError::EmptyMediaTypeKey => write!(f, "versioning.key must not be empty"),
            ValidationError::InvalidMethod(m) => write!(f, "cors.allowed_methods has invalid method: {}", m),
            ValidationError::EmptyStaticPath => write!(f, "static_assets.path must not be empty"),
            ValidationError::InvalidPrefix(p) => write!(f, "prefix must start with '/': {}", p),
            ValidationError::ZeroBodyLimit => write!(f, "body_parser.limit_bytes must be greater than 0"),
        }
    }
}

/// Validate a parsed config, collecting every problem.
pub fn validate_config(config: &AdapterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    match &config.versioning {
        VersioningConfig::Header { header } => {
            if HeaderName::from_bytes(header.as_bytes()).is_err() {
                errors.push(ValidationError::InvalidHeaderName(header.clone()));
            }
        }
        VersioningConfig::MediaType { key } => {
            if key.is_empty() {
                errors.push(ValidationError::EmptyMediaTypeKey);
            }
        }
        VersioningConfig::Uri { .. } => {}
    }

    for method in &config.cors.allowed_methods {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod(method.clone()));
        }
    }

    for assets in &config.static_assets {
        if assets.path.is_empty() {
            errors.push(ValidationError::EmptyStaticPath);
        }
        check_prefix(assets.prefix.as_deref(), &mut errors);
    }

    if config.body_parser.limit_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    check_prefix(config.body_parser.prefix.as_deref(), &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_prefix(prefix: Option<&str>, errors: &mut Vec<ValidationError>) {
    if let Some(p) = prefix {
        if !p.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix(p.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::StaticAssetsConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AdapterConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_header_name() {
        let mut config = AdapterConfig::default();
        config.versioning = VersioningConfig::Header {
            header: "X Api".into(),
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidHeaderName("X Api".into())]);
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AdapterConfig::default();
        config.body_parser.limit_bytes = 0;
        config.cors.allowed_methods.push("NOT A METHOD".into());
        config.static_assets.push(StaticAssetsConfig {
            path: String::new(),
            prefix: Some("public".into()),
            index: true,
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroBodyLimit));
        assert!(errors.contains(&ValidationError::EmptyStaticPath));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = AdapterConfig::default();
        config.observability.metrics_address = "bad".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
