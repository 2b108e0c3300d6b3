//! Request handler module
//!
//! Verb dispatch for local resources and the per-verb handlers behind it.

mod methods;
mod redirect;
pub mod router;
mod verb;

// Re-export main entry point
pub use router::{Engine, RequestContext};
pub use verb::Verb;
