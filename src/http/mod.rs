//! HTTP request/response plumbing.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → request.rs (request ID, metrics, accessors)
//!     → body.rs (JSON / urlencoded decoding)
//!     → handler chain, or assets.rs (static files)
//!     → response.rs (reply hooks) → Send to client
//! ```

pub mod assets;
pub mod body;
pub mod request;
pub mod response;

pub use body::{BodyParserOptions, ParsedBody, RawBody};
pub use request::X_REQUEST_ID;
pub use response::{ReplyBody, ResponseHandle};
