//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → AxumAdapter::close
//! ```

pub mod signals;

pub use signals::shutdown_signal;
