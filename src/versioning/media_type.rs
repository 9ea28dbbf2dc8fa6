//! `Accept` header version parameter parsing.
//!
//! The version parameter is taken from the second `;`-delimited segment of
//! the header, and the token is whatever follows the first occurrence of the
//! configured key in that segment:
//!
//! ```text
//! application/json;v=2      key "v="  →  "2"
//! application/json; v=2     key "v="  →  "2"
//! application/json          key "v="  →  none (no parameter segment)
//! application/json;q=1      key "v="  →  none (key not present)
//! ```
//!
//! Known limitation: a header with parameters in another order
//! (`application/json;charset=utf-8;v=2`) is read from the wrong segment and
//! yields no version. Kept as-is for compatibility with existing clients.

/// Extract the version token from an `Accept` header value.
///
/// Returns `None` when the parameter segment or the key is missing.
pub fn version_from_accept<'a>(accept: &'a str, key: &str) -> Option<&'a str> {
    let parameters = accept.split(';').nth(1)?;
    if key.is_empty() {
        return None;
    }
    parameters.split(key).nth(1)
}
