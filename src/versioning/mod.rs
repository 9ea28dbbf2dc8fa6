//! API versioning subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration:
//!     (handler, VersionSpec, VersioningOptions)
//!     → filter.rs (VersionFilter::new validates the pair)
//!     → chain.rs (appended to the chain for method + path)
//!
//! Incoming request:
//!     chain.rs walks entries in registration order
//!     → filter.rs decides Handle / Next per entry
//!     → media_type.rs parses the Accept header (MEDIA_TYPE only)
//!     → first Handle runs, otherwise the not-found handler
//! ```
//!
//! # Design Decisions
//! - Strategies are a closed enum, matched exhaustively
//! - Filters are pure: same headers + same options → same decision
//! - Each filter only sees its own handler's versions, so it cannot pick the
//!   highest matching version across registrations

pub mod chain;
pub mod filter;
pub mod media_type;

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderName, Request};

use crate::config::VersioningConfig;
use crate::error::AdapterError;

pub use chain::{HandlerChain, Next, VersionedHandler};
pub use filter::{Decision, VersionFilter};

/// Default path prefix for URI versioning (`/v1/...`).
pub const DEFAULT_URI_PREFIX: &str = "v";

/// A single element of a version set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    /// Matches every requested version.
    Neutral,
    /// A concrete version token such as `"2"`.
    Value(String),
}

impl Version {
    pub fn value(token: impl Into<String>) -> Self {
        Version::Value(token.into())
    }

    fn as_token(&self) -> Option<&str> {
        match self {
            Version::Neutral => None,
            Version::Value(token) => Some(token),
        }
    }
}

impl From<&str> for Version {
    fn from(token: &str) -> Self {
        Version::Value(token.to_string())
    }
}

impl From<String> for Version {
    fn from(token: String) -> Self {
        Version::Value(token)
    }
}

/// The versions a registered handler serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// Serve regardless of the requested version.
    Neutral,
    /// Serve exactly one version.
    Single(String),
    /// Serve any of an ordered, non-empty set of versions.
    Set(Vec<Version>),
}

impl VersionSpec {
    pub fn single(token: impl Into<String>) -> Self {
        VersionSpec::Single(token.into())
    }

    pub fn set<I, V>(versions: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Version>,
    {
        VersionSpec::Set(versions.into_iter().map(Into::into).collect())
    }

    /// True when a set spec lists the neutral sentinel.
    ///
    /// A bare `Neutral` spec is handled before any header is read, so this
    /// only inspects sets.
    pub fn set_contains_neutral(&self) -> bool {
        match self {
            VersionSpec::Set(versions) => versions.contains(&Version::Neutral),
            _ => false,
        }
    }

    /// Compare a requested token against this spec.
    pub fn matches_token(&self, requested: &str) -> bool {
        match self {
            VersionSpec::Neutral => false,
            VersionSpec::Single(token) => token == requested,
            VersionSpec::Set(versions) => versions
                .iter()
                .any(|v| v.as_token() == Some(requested)),
        }
    }

    /// Compare an extracted version (single token or set) against this spec.
    pub fn matches_extracted(&self, extracted: &ExtractedVersion) -> bool {
        match extracted {
            ExtractedVersion::Single(token) => self.matches_token(token),
            ExtractedVersion::Multiple(tokens) => {
                tokens.iter().any(|token| self.matches_token(token))
            }
        }
    }

    /// Concrete tokens in declaration order. Neutral entries are skipped.
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            VersionSpec::Neutral => Vec::new(),
            VersionSpec::Single(token) => vec![token.as_str()],
            VersionSpec::Set(versions) => versions.iter().filter_map(Version::as_token).collect(),
        }
    }

    /// True when the spec (or any set element) is the neutral sentinel.
    pub fn includes_neutral(&self) -> bool {
        matches!(self, VersionSpec::Neutral) || self.set_contains_neutral()
    }
}

impl From<&str> for VersionSpec {
    fn from(token: &str) -> Self {
        VersionSpec::single(token)
    }
}

/// Version information returned by a custom extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedVersion {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for ExtractedVersion {
    fn from(token: &str) -> Self {
        ExtractedVersion::Single(token.to_string())
    }
}

impl From<Vec<&str>> for ExtractedVersion {
    fn from(tokens: Vec<&str>) -> Self {
        ExtractedVersion::Multiple(tokens.into_iter().map(str::to_string).collect())
    }
}

/// Caller-supplied version extractor for custom versioning.
pub type VersionExtractor =
    Arc<dyn Fn(&Request<Body>) -> Option<ExtractedVersion> + Send + Sync>;

/// How the requested version is read from a request.
#[derive(Clone)]
pub enum VersioningOptions {
    /// Version lives in the path (`/v2/users`); resolved by route mounting.
    Uri { prefix: String },
    /// Version computed by a caller-supplied function.
    Custom { extractor: VersionExtractor },
    /// Version is a parameter of the `Accept` header, e.g. `v=` in
    /// `application/json;v=2`.
    MediaType { key: String },
    /// Version is the value of a dedicated header.
    Header { header: HeaderName },
}

impl VersioningOptions {
    pub fn uri() -> Self {
        VersioningOptions::Uri {
            prefix: DEFAULT_URI_PREFIX.to_string(),
        }
    }

    pub fn custom<F>(extractor: F) -> Self
    where
        F: Fn(&Request<Body>) -> Option<ExtractedVersion> + Send + Sync + 'static,
    {
        VersioningOptions::Custom {
            extractor: Arc::new(extractor),
        }
    }

    pub fn media_type(key: impl Into<String>) -> Result<Self, AdapterError> {
        let key = key.into();
        if key.is_empty() {
            return Err(AdapterError::InvalidVersioning(
                "media type key must not be empty".to_string(),
            ));
        }
        Ok(VersioningOptions::MediaType { key })
    }

    pub fn header(name: &str) -> Result<Self, AdapterError> {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| AdapterError::InvalidHeaderName(name.to_string()))?;
        Ok(VersioningOptions::Header { header })
    }

    /// Strategy label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            VersioningOptions::Uri { .. } => "uri",
            VersioningOptions::Custom { .. } => "custom",
            VersioningOptions::MediaType { .. } => "media_type",
            VersioningOptions::Header { .. } => "header",
        }
    }
}

impl TryFrom<&VersioningConfig> for VersioningOptions {
    type Error = AdapterError;

    fn try_from(config: &VersioningConfig) -> Result<Self, Self::Error> {
        match config {
            VersioningConfig::Uri { prefix } => Ok(VersioningOptions::Uri {
                prefix: prefix.clone(),
            }),
            VersioningConfig::MediaType { key } => VersioningOptions::media_type(key.clone()),
            VersioningConfig::Header { header } => VersioningOptions::header(header),
        }
    }
}

impl fmt::Debug for VersioningOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersioningOptions::Uri { prefix } => {
                f.debug_struct("Uri").field("prefix", prefix).finish()
            }
            VersioningOptions::Custom { .. } => f.debug_struct("Custom").finish_non_exhaustive(),
            VersioningOptions::MediaType { key } => {
                f.debug_struct("MediaType").field("key", key).finish()
            }
            VersioningOptions::Header { header } => {
                f.debug_struct("Header").field("header", header).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_matches_token() {
        let spec = VersionSpec::set(["1", "2"]);
        assert!(spec.matches_token("2"));
        assert!(!spec.matches_token("3"));
        assert!(!spec.set_contains_neutral());
    }

    #[test]
    fn test_neutral_in_set_never_equals_token() {
        let spec = VersionSpec::Set(vec![Version::Neutral]);
        assert!(spec.set_contains_neutral());
        assert!(!spec.matches_token(""));
        assert!(spec.tokens().is_empty());
    }

    #[test]
    fn test_matches_extracted_overlap() {
        let spec = VersionSpec::single("2");
        assert!(spec.matches_extracted(&vec!["1", "2"].into()));
        assert!(!spec.matches_extracted(&vec!["4", "5"].into()));
        assert!(spec.matches_extracted(&"2".into()));
    }

    #[test]
    fn test_header_option_rejects_invalid_name() {
        assert!(VersioningOptions::header("X-Api-Version").is_ok());
        assert!(matches!(
            VersioningOptions::header("bad header"),
            Err(AdapterError::InvalidHeaderName(_))
        ));
    }

    #[test]
    fn test_media_type_option_rejects_empty_key() {
        assert!(VersioningOptions::media_type("").is_err());
        assert_eq!(VersioningOptions::media_type("v=").unwrap().kind(), "media_type");
    }

    #[test]
    fn test_options_from_config() {
        let options = VersioningOptions::try_from(&VersioningConfig::Header {
            header: "X-Api-Version".into(),
        })
        .unwrap();
        assert!(matches!(options, VersioningOptions::Header { ref header } if header == "x-api-version"));

        let options = VersioningOptions::try_from(&VersioningConfig::default()).unwrap();
        assert!(matches!(options, VersioningOptions::Uri { ref prefix } if prefix == "v"));

        assert!(VersioningOptions::try_from(&VersioningConfig::MediaType { key: String::new() }).is_err());
    }
}
