//! Request dispatch module
//!
//! Entry point for engine requests: redirect resolution, verb dispatch and
//! translation of handler errors into responses.

use std::time::Instant;

use hyper::header::{self, HeaderMap};
use hyper::{Response, StatusCode};
use tokio_util::sync::CancellationToken;

use super::methods;
use super::redirect;
use super::verb::Verb;
use crate::body::Body;
use crate::config::{Config, EngineConfig};
use crate::error::Error;
use crate::fs::WriteMode;
use crate::http::{build_error_response, build_status_response};
use crate::logger::{self, RequestLogEntry};
use crate::request::{abortable, accepts_json, FetchRequest, RedirectPolicy, ResourceRef};

/// Request context encapsulating information needed by the handlers
pub struct RequestContext<'a> {
    pub cfg: &'a EngineConfig,
    pub resource: &'a ResourceRef,
    pub headers: &'a HeaderMap,
    pub integrity: Option<&'a str>,
    pub signal: Option<&'a CancellationToken>,
    /// Error bodies as JSON
    pub json: bool,
}

impl RequestContext<'_> {
    pub fn range_header(&self) -> Option<&str> {
        self.headers
            .get(header::RANGE)
            .and_then(|value| value.to_str().ok())
    }
}

/// Filesystem request executor
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    access_log: bool,
    access_log_format: String,
}

impl Engine {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.engine.clone(),
            access_log: config.logging.access_log,
            access_log_format: config.logging.access_log_format.clone(),
        }
    }

    /// Run `request` against a local resource
    ///
    /// Handler failures come back as error responses. Only a redirect
    /// policy violation, cancellation, or an error without a status
    /// escapes as `Err`.
    pub async fn execute(
        &self,
        resource: &ResourceRef,
        request: FetchRequest,
    ) -> Result<Response<Body>, Error> {
        let started = Instant::now();
        let FetchRequest {
            method,
            headers,
            body,
            integrity,
            redirect,
            signal,
            ..
        } = request;

        let ctx = RequestContext {
            cfg: &self.config,
            resource,
            headers: &headers,
            integrity: integrity.as_deref(),
            signal: signal.as_ref(),
            json: accepts_json(&headers),
        };

        let outcome = abortable(ctx.signal, self.dispatch(&ctx, &method, body, redirect)).await;
        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                let Some(status) = err.status() else {
                    logger::log_debug(&format!("[{method}] {}: {err}", resource.url));
                    return Err(err);
                };
                logger::log_error(&format!("[{method}] {}: {err}", resource.url));
                build_error_response(&self.config, &err, status, ctx.json, method == Verb::Head)
            }
        };

        self.log_request(&method, resource, &response, started);
        Ok(response)
    }

    async fn dispatch(
        &self,
        ctx: &RequestContext<'_>,
        method: &Verb,
        body: Body,
        redirect: RedirectPolicy,
    ) -> Result<Response<Body>, Error> {
        if let Some(response) = redirect::resolve(ctx.cfg, ctx.resource, redirect).await? {
            return Ok(response);
        }

        match method {
            Verb::Get => methods::get(ctx, false).await,
            Verb::Head => methods::get(ctx, true).await,
            Verb::Put | Verb::Write => methods::write(ctx, body, WriteMode::Truncate).await,
            Verb::Post => methods::write(ctx, body, WriteMode::Update).await,
            Verb::Delete => methods::delete(ctx).await,
            Verb::Read => methods::read(ctx).await,
            Verb::Append => methods::append(ctx, body).await,
            Verb::List => methods::list(ctx).await,
            rejected if rejected.is_rejected() => {
                logger::log_warning(&format!("Method not implemented: {rejected}"));
                Ok(build_status_response(ctx.cfg, StatusCode::NOT_IMPLEMENTED))
            }
            other => {
                logger::log_warning(&format!("Method not allowed: {other}"));
                Ok(build_status_response(ctx.cfg, StatusCode::METHOD_NOT_ALLOWED))
            }
        }
    }

    fn log_request(
        &self,
        method: &Verb,
        resource: &ResourceRef,
        response: &Response<Body>,
        started: Instant,
    ) {
        if !self.access_log {
            return;
        }
        let mut entry = RequestLogEntry::new(method.as_str(), resource.url.as_str());
        entry.status = response.status().as_u16();
        entry.bytes = hyper::body::Body::size_hint(response.body()).exact();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_request(&entry, &self.access_log_format);
    }
}
