//! HTTP protocol layer module
//!
//! Range, validator, header and response helpers, decoupled from the
//! method handlers that use them.

pub mod cache;
pub mod headers;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use cache::{evaluate_preconditions, weak_etag, Precondition};
pub use range::{range_tokens, RangeError, RangeSpec, RawRange, WriteWindow};
pub use response::{
    build_416_response, build_error_response, build_redirect_response, build_status_response,
    ALLOW,
};
