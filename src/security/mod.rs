//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (preflight answered, CORS headers added)
//!     → Pass to routing
//! ```

pub mod cors;
