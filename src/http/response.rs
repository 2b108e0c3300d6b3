//! HTTP response building module
//!
//! Builders for the responses the engine produces, decoupled from the
//! method handlers.

use bytes::Bytes;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Response, StatusCode};

use super::headers::{error_headers, generic_headers, stat_headers};
use crate::body::Body;
use crate::config::EngineConfig;
use crate::error::Error;
use crate::fs::StatSnapshot;

/// Verbs advertised on 405 and 501
pub const ALLOW: &str = "GET, HEAD, PUT, POST, DELETE, READ, WRITE, APPEND, LIST";

/// Assemble a response from parts
pub fn build_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Bodiless response carrying only the generic headers
///
/// 405 and 501 also carry `Allow` and a short text body.
pub fn build_status_response(cfg: &EngineConfig, status: StatusCode) -> Response<Body> {
    let mut headers = generic_headers(cfg);
    if !matches!(
        status,
        StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
    ) {
        return build_response(status, headers, Body::Empty);
    }

    headers.insert(header::ALLOW, HeaderValue::from_static(ALLOW));
    let text = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    );
    text_body(&mut headers, "text/plain; charset=utf-8", text.len());
    build_response(status, headers, Body::from(text))
}

/// 422 for writes that came without a body
pub fn build_422_response(cfg: &EngineConfig) -> Response<Body> {
    let mut headers = generic_headers(cfg);
    let text = "422 Unprocessable Entity: request body required";
    text_body(&mut headers, "text/plain; charset=utf-8", text.len());
    build_response(StatusCode::UNPROCESSABLE_ENTITY, headers, Body::from(text))
}

/// 304 or 412: stat headers, no body
pub fn build_precondition_response(
    cfg: &EngineConfig,
    status: StatusCode,
    stat: Option<&StatSnapshot>,
) -> Response<Body> {
    let mut headers = generic_headers(cfg);
    if let Some(stat) = stat {
        stat_headers(cfg, stat, &mut headers);
    }
    if status != StatusCode::NOT_MODIFIED {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(0u64));
    }
    build_response(status, headers, Body::Empty)
}

/// Build 302 redirect response
pub fn build_redirect_response(cfg: &EngineConfig, target: &str) -> Response<Body> {
    let mut builder = Response::builder().status(StatusCode::FOUND);
    if let Some(headers) = builder.headers_mut() {
        headers.extend(generic_headers(cfg));
    }
    builder
        .header(header::LOCATION, target)
        .header(header::CONTENT_LENGTH, 0)
        .body(Body::Empty)
        .unwrap_or_else(|e| {
            log_build_error("302", &e);
            build_response(StatusCode::FOUND, generic_headers(cfg), Body::Empty)
        })
}

/// Response for an error that carries a status
///
/// The body is the error message, or the JSON form when `json` is set.
/// HEAD responses keep the headers and drop the body.
pub fn build_error_response(
    cfg: &EngineConfig,
    err: &Error,
    status: StatusCode,
    json: bool,
    is_head: bool,
) -> Response<Body> {
    let mut headers = generic_headers(cfg);
    error_headers(cfg, err, &mut headers);

    let (content_type, text) = if json {
        ("application/json", err.to_json().to_string())
    } else {
        ("text/plain; charset=utf-8", err.to_string())
    };
    text_body(&mut headers, content_type, text.len());

    let body = if is_head {
        Body::Empty
    } else {
        Body::from(text)
    };
    build_response(status, headers, body)
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(
    cfg: &EngineConfig,
    err: &Error,
    size: u64,
    json: bool,
    is_head: bool,
) -> Response<Body> {
    let mut response =
        build_error_response(cfg, err, StatusCode::RANGE_NOT_SATISFIABLE, json, is_head);
    if let Ok(value) = HeaderValue::from_str(&format!("bytes */{size}")) {
        response.headers_mut().insert(header::CONTENT_RANGE, value);
    }
    response
}

/// Build 200/206 response around bytes already read
pub fn build_bytes_response(
    status: StatusCode,
    headers: HeaderMap,
    data: Bytes,
    is_head: bool,
) -> Response<Body> {
    let body = if is_head { Body::Empty } else { Body::Full(data) };
    build_response(status, headers, body)
}

fn text_body(headers: &mut HeaderMap, content_type: &'static str, len: usize) {
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
