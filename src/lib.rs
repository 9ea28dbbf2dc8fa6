//! axum HTTP adapter with API version filtering.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net (axum-server) ──▶ middleware stack ──▶ path dispatcher
//!                                            request id, trace,       │
//!                                            metrics, panic, cors,    ▼
//!                                            body parser         handler chain
//!                                                                     │
//!                                                  VersionFilter: Handle / Next
//!                                                                     │
//!     Client Response                                                 ▼
//!     ◀────────────── response hooks ◀──────────────────────── handler or 404
//! ```
//!
//! Registration happens on [`AxumAdapter`]; [`HttpAdapter`] is the hook seam
//! the framework drives.

// Core subsystems
pub mod adapter;
pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod versioning;
pub mod views;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use adapter::{AppContext, AxumAdapter, HttpAdapter, RequestMethod};
pub use config::schema::AdapterConfig;
pub use error::{AdapterError, AdapterResult};
pub use versioning::{
    Decision, ExtractedVersion, Version, VersionFilter, VersionSpec, VersioningOptions,
};
