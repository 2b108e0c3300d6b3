//! Filesystem-to-HTTP translation engine
//!
//! Requests addressed to `file:` URLs are answered from the local
//! filesystem with HTTP-shaped responses: byte ranges, conditional
//! requests, integrity checks and symbolic-link redirects included.
//! Everything else is forwarded to a real network client.
//!
//! ```no_run
//! use poteto::{Config, Poteto, RequestInit};
//!
//! # async fn run() -> Result<(), poteto::Error> {
//! let poteto = Poteto::new(&Config::default())?;
//! let response = poteto
//!     .fetch("notes.txt", RequestInit::new().header("Range", "bytes=0-99"))
//!     .await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod fs;
pub mod handler;
pub mod http;
pub mod integrity;
pub mod logger;
pub mod request;

pub use body::Body;
pub use client::{NativeFetch, Poteto, ReqwestFetch};
pub use config::Config;
pub use error::Error;
pub use handler::{Engine, Verb};
pub use request::{FetchRequest, RedirectPolicy, RequestInit, Resource, ResourceRef};
pub use tokio_util::sync::CancellationToken;
