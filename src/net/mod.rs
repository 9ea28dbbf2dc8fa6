//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! AxumAdapter::listen
//!     → tls.rs (optional PEM loading)
//!     → server.rs (axum-server task + Handle)
//!
//! AxumAdapter::close
//!     → server.rs (graceful drain or forced close)
//! ```

pub mod server;
pub mod tls;

pub use server::{RunningServer, ServerOptions};
