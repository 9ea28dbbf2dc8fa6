//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AdapterConfig (validated, immutable)
//!     → applied to AxumAdapter at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdapterConfig, BodyParserConfig, CorsConfig, ListenerConfig, ObservabilityConfig,
    ServerConfig, StaticAssetsConfig, TlsConfig, VersioningConfig, ViewsConfig,
};
pub use validation::{validate_config, ValidationError};
