//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the adapter.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the adapter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdapterConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// HTTP server options.
    pub server: ServerConfig,

    /// API versioning strategy.
    pub versioning: VersioningConfig,

    /// Cross-origin resource sharing.
    pub cors: CorsConfig,

    /// Static directories to serve.
    pub static_assets: Vec<StaticAssetsConfig>,

    /// Request body parsing.
    pub body_parser: BodyParserConfig,

    /// Template rendering.
    pub views: ViewsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// HTTP server behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Close open connections immediately on shutdown instead of draining them.
    pub force_close_connections: bool,

    /// How long a graceful shutdown waits for in-flight requests, in seconds.
    pub shutdown_timeout_secs: u64,

    /// Request timeout in seconds. Zero disables the timeout.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            force_close_connections: false,
            shutdown_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

/// Versioning strategy as written in the config file.
///
/// Custom extractors need code and are configured through
/// [`crate::versioning::VersioningOptions::custom`] instead.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VersioningConfig {
    Uri {
        #[serde(default = "default_uri_prefix")]
        prefix: String,
    },
    MediaType {
        key: String,
    },
    Header {
        header: String,
    },
}

impl Default for VersioningConfig {
    fn default() -> Self {
        VersioningConfig::Uri {
            prefix: default_uri_prefix(),
        }
    }
}

fn default_uri_prefix() -> String {
    crate::versioning::DEFAULT_URI_PREFIX.to_string()
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Install the CORS layer.
    pub enabled: bool,

    /// Allowed origins; `"*"` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Allowed methods.
    pub allowed_methods: Vec<String>,

    /// Allowed request headers; `"*"` allows any header.
    pub allowed_headers: Vec<String>,

    /// Send `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,

    /// Preflight cache duration in seconds.
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["*".to_string()],
            allow_credentials: false,
            max_age_secs: None,
        }
    }
}

/// A directory served as static files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticAssetsConfig {
    /// Directory on disk.
    pub path: String,

    /// URL prefix (e.g., "/public"). Without one, files are served from the root.
    pub prefix: Option<String>,

    /// Serve `index.html` for directory requests.
    #[serde(default = "default_true")]
    pub index: bool,
}

fn default_true() -> bool {
    true
}

/// Body parser configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyParserConfig {
    /// Install JSON and urlencoded parsing.
    pub enabled: bool,

    /// Keep the raw body bytes alongside the parsed value.
    pub raw_body: bool,

    /// Maximum accepted body size in bytes.
    pub limit_bytes: usize,

    /// Only parse bodies for paths under this prefix.
    pub prefix: Option<String>,
}

impl Default for BodyParserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            raw_body: false,
            limit_bytes: 100 * 1024,
            prefix: None,
        }
    }
}

/// Template rendering configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ViewsConfig {
    /// Base directory for templates.
    pub base_dir: Option<String>,

    /// Default template extension (e.g., "html").
    pub engine: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
