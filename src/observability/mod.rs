//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON when configured)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging via `tracing` fields, not formatted strings
//! - Request ID flows through every request span
//! - Metric updates are cheap; recording without an installed exporter is a no-op

pub mod logging;
pub mod metrics;
