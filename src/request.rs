//! Request construction
//!
//! [`FetchRequest::new`] normalizes whatever the caller passed (an address
//! string, a parsed URL, or an earlier request) plus a [`RequestInit`] into
//! one request value.

use std::future::Future;
use std::path::{Path, PathBuf};

use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::body::Body;
use crate::error::Error;
use crate::handler::Verb;

/// A `file:` URL and the local path it names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub url: Url,
    pub path: PathBuf,
}

impl ResourceRef {
    /// `None` for any scheme other than `file`
    pub fn from_url(url: Url) -> Result<Option<Self>, Error> {
        if url.scheme() != "file" {
            return Ok(None);
        }
        let path = url.to_file_path().map_err(|()| Error::InvalidUrl {
            message: format!("{url} does not name a local path"),
        })?;
        Ok(Some(Self { url, path }))
    }

    /// Reference an absolute path directly
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let url = Url::from_file_path(path).map_err(|()| Error::InvalidUrl {
            message: format!("{} is not an absolute path", path.display()),
        })?;
        Ok(Self {
            url,
            path: path.to_path_buf(),
        })
    }
}

/// What to do when the resource is a symbolic link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    /// Let the filesystem follow the link
    #[default]
    Follow,
    /// Fail with [`Error::Redirect`]
    Error,
    /// Answer 302 with the link target in `Location`
    Manual,
}

/// Anything a request can be made from
#[derive(Debug)]
pub enum Resource {
    Address(String),
    Url(Url),
    Request(FetchRequest),
}

impl From<&str> for Resource {
    fn from(address: &str) -> Self {
        Self::Address(address.to_string())
    }
}

impl From<String> for Resource {
    fn from(address: String) -> Self {
        Self::Address(address)
    }
}

impl From<&String> for Resource {
    fn from(address: &String) -> Self {
        Self::Address(address.clone())
    }
}

impl From<Url> for Resource {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl From<FetchRequest> for Resource {
    fn from(request: FetchRequest) -> Self {
        Self::Request(request)
    }
}

/// Optional request settings; anything set overrides the resource's own
#[derive(Debug, Default)]
pub struct RequestInit {
    method: Option<Verb>,
    headers: HeaderMap,
    body: Option<Body>,
    integrity: Option<String>,
    redirect: Option<RedirectPolicy>,
    signal: Option<CancellationToken>,
    invalid_header: Option<String>,
}

impl RequestInit {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<Verb>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Append a header; an invalid name or value is reported by
    /// [`FetchRequest::new`]
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => {
                self.invalid_header.get_or_insert_with(|| format!("{name}: {value}"));
            }
        }
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn integrity(mut self, token: impl Into<String>) -> Self {
        self.integrity = Some(token.into());
        self
    }

    #[must_use]
    pub const fn redirect(mut self, policy: RedirectPolicy) -> Self {
        self.redirect = Some(policy);
        self
    }

    #[must_use]
    pub fn signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// A normalized request
#[derive(Debug, Default)]
pub struct FetchRequest {
    /// Address as given, resolved later against the base directory
    pub url: String,
    pub method: Verb,
    pub headers: HeaderMap,
    pub body: Body,
    pub integrity: Option<String>,
    pub redirect: RedirectPolicy,
    pub signal: Option<CancellationToken>,
}

impl FetchRequest {
    pub fn new(resource: impl Into<Resource>, init: RequestInit) -> Result<Self, Error> {
        if let Some(header) = init.invalid_header {
            return Err(Error::InvalidHeader { message: header });
        }

        let mut request = match resource.into() {
            Resource::Address(url) => Self {
                url,
                ..Self::default()
            },
            Resource::Url(url) => Self {
                url: url.into(),
                ..Self::default()
            },
            Resource::Request(request) => request,
        };

        if let Some(method) = init.method {
            request.method = method;
        }
        if !init.headers.is_empty() {
            request.headers = init.headers;
        }
        if let Some(body) = init.body {
            request.body = body;
        }
        if init.integrity.is_some() {
            request.integrity = init.integrity;
        }
        if let Some(policy) = init.redirect {
            request.redirect = policy;
        }
        if init.signal.is_some() {
            request.signal = init.signal;
        }
        Ok(request)
    }
}

/// Whether the caller wants JSON error bodies
pub(crate) fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(hyper::header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("application/json"))
}

/// Run `fut` unless `signal` fires first
pub async fn abortable<T, F>(signal: Option<&CancellationToken>, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match signal {
        Some(signal) if signal.is_cancelled() => Err(Error::Aborted),
        Some(signal) => tokio::select! {
            biased;
            () = signal.cancelled() => Err(Error::Aborted),
            result = fut => result,
        },
        None => fut.await,
    }
}
