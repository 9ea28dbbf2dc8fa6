//! Per-handler version filter.
//!
//! # Responsibilities
//! - Read the requested version according to the versioning strategy
//! - Compare it against the versions a handler is registered for
//! - Report whether the handler runs or the request moves on
//!
//! # Design Decisions
//! - Pure: reads headers only, holds no mutable state
//! - Malformed or missing version information means "no version supplied",
//!   never an error
//! - A missing version only matches a set that lists the neutral sentinel

use axum::body::Body;
use axum::http::{header, HeaderName, Request};

use crate::error::AdapterError;
use crate::versioning::media_type::version_from_accept;
use crate::versioning::{VersionSpec, VersioningOptions};

/// Outcome of evaluating a filter against one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Invoke the version-scoped handler.
    Handle,
    /// Defer to the continuation.
    Next,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Handle => "handle",
            Decision::Next => "next",
        }
    }
}

impl From<bool> for Decision {
    fn from(handle: bool) -> Self {
        if handle {
            Decision::Handle
        } else {
            Decision::Next
        }
    }
}

/// Version filter for a single registered handler.
#[derive(Debug, Clone)]
pub struct VersionFilter {
    spec: VersionSpec,
    options: VersioningOptions,
}

impl VersionFilter {
    /// Create a filter. An empty version set is rejected.
    pub fn new(spec: VersionSpec, options: VersioningOptions) -> Result<Self, AdapterError> {
        if let VersionSpec::Set(versions) = &spec {
            if versions.is_empty() {
                return Err(AdapterError::EmptyVersionSet);
            }
        }
        Ok(Self { spec, options })
    }

    /// Filter that always handles; used for routes registered without a version.
    pub fn neutral() -> Self {
        Self {
            spec: VersionSpec::Neutral,
            options: VersioningOptions::uri(),
        }
    }

    pub fn spec(&self) -> &VersionSpec {
        &self.spec
    }

    pub fn options(&self) -> &VersioningOptions {
        &self.options
    }

    /// Decide whether the handler should serve this request.
    pub fn decide(&self, req: &Request<Body>) -> Decision {
        if self.spec == VersionSpec::Neutral {
            return Decision::Handle;
        }

        match &self.options {
            // Path matching already selected the version.
            VersioningOptions::Uri { .. } => Decision::Handle,
            VersioningOptions::Custom { extractor } => match extractor(req) {
                Some(extracted) => self.spec.matches_extracted(&extracted).into(),
                None => Decision::Next,
            },
            VersioningOptions::MediaType { key } => {
                let requested =
                    header_value(req, &header::ACCEPT).and_then(|accept| version_from_accept(accept, key));
                self.decide_requested(requested)
            }
            VersioningOptions::Header { header } => {
                self.decide_requested(header_value(req, header))
            }
        }
    }

    fn decide_requested(&self, requested: Option<&str>) -> Decision {
        match requested {
            None => self.spec.set_contains_neutral().into(),
            Some(token) => self.spec.matches_token(token).into(),
        }
    }
}

/// Case-insensitive header lookup. Empty values and values that are not
/// visible ASCII count as absent.
fn header_value<'a>(req: &'a Request<Body>, name: &HeaderName) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::{ExtractedVersion, Version};

    fn request(headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("http://example.com/users");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn header_filter(spec: VersionSpec) -> VersionFilter {
        VersionFilter::new(spec, VersioningOptions::header("X-Api-Version").unwrap()).unwrap()
    }

    fn media_filter(spec: VersionSpec) -> VersionFilter {
        VersionFilter::new(spec, VersioningOptions::media_type("v=").unwrap()).unwrap()
    }

    fn custom_filter(spec: VersionSpec, extracted: Option<ExtractedVersion>) -> VersionFilter {
        let options = VersioningOptions::custom(move |_| extracted.clone());
        VersionFilter::new(spec, options).unwrap()
    }

    #[test]
    fn test_neutral_spec_always_handles() {
        let req = request(&[("X-Api-Version", "9"), ("Accept", "application/json;v=9")]);
        let strategies = vec![
            VersioningOptions::uri(),
            VersioningOptions::custom(|_| None),
            VersioningOptions::media_type("v=").unwrap(),
            VersioningOptions::header("X-Api-Version").unwrap(),
        ];
        for options in strategies {
            let filter = VersionFilter::new(VersionSpec::Neutral, options).unwrap();
            assert_eq!(filter.decide(&req), Decision::Handle);
            assert_eq!(filter.decide(&request(&[])), Decision::Handle);
        }
    }

    #[test]
    fn test_uri_strategy_ignores_headers() {
        let filter = VersionFilter::new(VersionSpec::single("1"), VersioningOptions::uri()).unwrap();
        assert_eq!(filter.decide(&request(&[("X-Api-Version", "7")])), Decision::Handle);
        assert_eq!(filter.decide(&request(&[])), Decision::Handle);
    }

    #[test]
    fn test_header_strategy() {
        let req = request(&[("X-Api-Version", "2")]);
        assert_eq!(header_filter(VersionSpec::single("2")).decide(&req), Decision::Handle);
        assert_eq!(header_filter(VersionSpec::single("3")).decide(&req), Decision::Next);
        assert_eq!(header_filter(VersionSpec::set(["1", "2"])).decide(&req), Decision::Handle);
    }

    #[test]
    fn test_header_absent() {
        let req = request(&[]);
        let with_neutral = VersionSpec::Set(vec![Version::Neutral, Version::value("2")]);
        assert_eq!(header_filter(with_neutral).decide(&req), Decision::Handle);
        assert_eq!(header_filter(VersionSpec::single("2")).decide(&req), Decision::Next);
        assert_eq!(header_filter(VersionSpec::set(["2"])).decide(&req), Decision::Next);
    }

    #[test]
    fn test_empty_header_counts_as_absent() {
        let neutral = VersionSpec::Set(vec![Version::Neutral]);
        let req = request(&[("X-Api-Version", "")]);
        assert_eq!(header_filter(neutral.clone()).decide(&req), Decision::Handle);
        assert_eq!(header_filter(VersionSpec::single("2")).decide(&req), Decision::Next);

        let req = request(&[("Accept", "")]);
        assert_eq!(media_filter(neutral).decide(&req), Decision::Handle);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let filter = header_filter(VersionSpec::single("2"));
        assert_eq!(filter.decide(&request(&[("x-api-version", "2")])), Decision::Handle);
        assert_eq!(filter.decide(&request(&[("X-API-VERSION", "2")])), Decision::Handle);
    }

    #[test]
    fn test_media_type_strategy() {
        let spec = VersionSpec::set(["1", "2"]);
        let filter = media_filter(spec);
        assert_eq!(
            filter.decide(&request(&[("Accept", "application/json;v=2")])),
            Decision::Handle
        );
        assert_eq!(
            filter.decide(&request(&[("accept", "application/json;v=2")])),
            Decision::Handle
        );
        assert_eq!(
            filter.decide(&request(&[("Accept", "application/json;v=5")])),
            Decision::Next
        );
    }

    #[test]
    fn test_media_type_without_version_falls_back_to_neutral() {
        let neutral = media_filter(VersionSpec::Set(vec![Version::Neutral]));
        let strict = media_filter(VersionSpec::single("1"));

        for headers in [
            vec![],
            vec![("Accept", "application/json")],
            vec![("Accept", "application/json;q=0.5")],
        ] {
            let req = request(&headers);
            assert_eq!(neutral.decide(&req), Decision::Handle);
            assert_eq!(strict.decide(&req), Decision::Next);
        }
    }

    #[test]
    fn test_custom_strategy() {
        let set = VersionSpec::set(["1", "2", "3"]);
        assert_eq!(
            custom_filter(set.clone(), Some("2".into())).decide(&request(&[])),
            Decision::Handle
        );
        assert_eq!(
            custom_filter(set, Some(vec!["3", "9"].into())).decide(&request(&[])),
            Decision::Handle
        );
        assert_eq!(
            custom_filter(VersionSpec::single("2"), Some(vec!["4", "5"].into()))
                .decide(&request(&[])),
            Decision::Next
        );
        assert_eq!(
            custom_filter(VersionSpec::single("2"), Some("2".into())).decide(&request(&[])),
            Decision::Handle
        );
    }

    #[test]
    fn test_custom_none_always_defers() {
        let with_neutral = VersionSpec::Set(vec![Version::Neutral]);
        for spec in [VersionSpec::single("1"), VersionSpec::set(["1"]), with_neutral] {
            assert_eq!(custom_filter(spec, None).decide(&request(&[])), Decision::Next);
        }
    }

    #[test]
    fn test_custom_extractor_reads_request() {
        let options = VersioningOptions::custom(|req| {
            req.uri()
                .query()
                .and_then(|q| q.strip_prefix("version="))
                .map(ExtractedVersion::from)
        });
        let filter = VersionFilter::new(VersionSpec::single("4"), options).unwrap();
        let req = Request::builder()
            .uri("http://example.com/users?version=4")
            .body(Body::empty())
            .unwrap();
        assert_eq!(filter.decide(&req), Decision::Handle);
    }

    #[test]
    fn test_repeated_decisions_are_stable() {
        let filter = header_filter(VersionSpec::single("2"));
        let req = request(&[("X-Api-Version", "2")]);
        let first = filter.decide(&req);
        for _ in 0..10 {
            assert_eq!(filter.decide(&req), first);
        }
    }

    #[test]
    fn test_empty_set_rejected() {
        let result = VersionFilter::new(VersionSpec::Set(vec![]), VersioningOptions::uri());
        assert!(matches!(result, Err(AdapterError::EmptyVersionSet)));
    }
}
