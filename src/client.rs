//! Fetch client
//!
//! [`Poteto`] is the value callers hold in place of a global fetch: it
//! serves `file:` addresses from the engine and hands every other address
//! to an injected [`NativeFetch`].

use std::path::PathBuf;

use async_trait::async_trait;
use hyper::header;
use hyper::{Method, Response};
use reqwest::redirect::Policy;
use reqwest::Client;
use url::Url;

use crate::body::Body;
use crate::config::Config;
use crate::error::Error;
use crate::handler::Engine;
use crate::http::response::build_response;
use crate::integrity;
use crate::request::{abortable, FetchRequest, RedirectPolicy, RequestInit, Resource, ResourceRef};

/// The real-network fetch that non-local addresses are forwarded to
#[async_trait]
pub trait NativeFetch: Send + Sync {
    /// `request.url` is absolute by the time it gets here
    async fn fetch(&self, request: FetchRequest) -> Result<Response<Body>, Error>;
}

/// [`NativeFetch`] backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    follow: Client,
    manual: Client,
}

impl ReqwestFetch {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            follow: Client::builder().build()?,
            manual: Client::builder().redirect(Policy::none()).build()?,
        })
    }
}

#[async_trait]
impl NativeFetch for ReqwestFetch {
    async fn fetch(&self, request: FetchRequest) -> Result<Response<Body>, Error> {
        let FetchRequest {
            url,
            method,
            headers,
            body,
            integrity: token,
            redirect,
            signal,
        } = request;

        let method = Method::from_bytes(method.as_str().as_bytes()).map_err(|_| {
            Error::InvalidMethod {
                method: method.to_string(),
            }
        })?;
        let target = Url::parse(&url)?;
        let client = match redirect {
            RedirectPolicy::Follow => &self.follow,
            RedirectPolicy::Error | RedirectPolicy::Manual => &self.manual,
        };

        let mut builder = client.request(method, target).headers(headers);
        if !body.is_absent() {
            builder = builder.body(body.bytes().await.map_err(Error::BodyStream)?);
        }

        abortable(signal.as_ref(), async {
            let response = builder.send().await?;
            let status = response.status();

            if redirect == RedirectPolicy::Error && status.is_redirection() {
                let location = response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                return Err(Error::Redirect {
                    link: url.clone(),
                    target: location,
                });
            }

            let headers = response.headers().clone();
            let data = response.bytes().await?;
            let data = integrity::validate(token.as_deref(), &[data])?;
            Ok::<_, Error>(build_response(status, headers, Body::Full(data)))
        })
        .await
    }
}

/// Where relative addresses are resolved from
#[derive(Debug, Clone)]
enum BaseDir {
    Fixed(PathBuf),
    /// The process's current directory at call time
    Current,
}

/// Fetch client: local files through the engine, the rest delegated
pub struct Poteto<N = ReqwestFetch> {
    engine: Engine,
    native: N,
    base: BaseDir,
}

impl Poteto<ReqwestFetch> {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Self::with_native(config, ReqwestFetch::new()?)
    }
}

impl<N: NativeFetch> Poteto<N> {
    pub fn with_native(config: &Config, native: N) -> Result<Self, Error> {
        let base = if config.engine.persist_cwd {
            BaseDir::Fixed(std::env::current_dir().map_err(Error::WorkingDirectory)?)
        } else {
            BaseDir::Current
        };
        Ok(Self {
            engine: Engine::new(config),
            native,
            base,
        })
    }

    /// Pin relative addresses to `dir`
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base = BaseDir::Fixed(dir.into());
        self
    }

    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Resolve an address against the base directory
    ///
    /// `name`, `./name`, `file:name` and `file:///abs/name` are all accepted;
    /// addresses with another scheme come back unchanged.
    pub fn resolve(&self, address: &str) -> Result<Url, Error> {
        let dir = match &self.base {
            BaseDir::Fixed(dir) => dir.clone(),
            BaseDir::Current => std::env::current_dir().map_err(Error::WorkingDirectory)?,
        };
        let base = Url::from_directory_path(&dir).map_err(|()| Error::InvalidUrl {
            message: format!("base directory {} is not absolute", dir.display()),
        })?;
        Ok(base.join(address)?)
    }

    /// Build a request from `resource` and `init` and run it
    pub async fn fetch(
        &self,
        resource: impl Into<Resource> + Send,
        init: RequestInit,
    ) -> Result<Response<Body>, Error> {
        let mut request = FetchRequest::new(resource, init)?;
        let url = self.resolve(&request.url)?;

        if let Some(local) = ResourceRef::from_url(url.clone())? {
            return self.engine.execute(&local, request).await;
        }
        request.url = url.into();
        self.native.fetch(request).await
    }
}
