//! Per-verb handlers
//!
//! Each handler performs its filesystem calls and returns the response, or
//! the error for the router to translate.

use std::path::MAIN_SEPARATOR;

use bytes::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use tokio::fs::File;

use super::router::RequestContext;
use crate::body::Body;
use crate::error::Error;
use crate::fs::{
    read_ranges, write_body, FileStream, FsError, FsErrorKind, FsResultExt, StatSnapshot,
    WriteMode,
};
use crate::http::cache::{evaluate_preconditions, has_preconditions, Precondition};
use crate::http::headers::{generic_headers, set_length, stat_headers};
use crate::http::range::{range_tokens, resolve_ranges, RangeSpec, RawRange, WriteWindow};
use crate::http::response::{
    build_416_response, build_422_response, build_bytes_response, build_precondition_response,
    build_response, build_status_response,
};
use crate::integrity;

/// `GET` and `HEAD`
pub async fn get(ctx: &RequestContext<'_>, is_head: bool) -> Result<Response<Body>, Error> {
    let path = &ctx.resource.path;
    let stat = StatSnapshot::capture(path).await?;

    match evaluate_preconditions(ctx.headers, Some(&stat)) {
        Precondition::Proceed => {}
        Precondition::NotModified => {
            return Ok(build_precondition_response(
                ctx.cfg,
                StatusCode::NOT_MODIFIED,
                Some(&stat),
            ))
        }
        Precondition::Failed => {
            return Ok(build_precondition_response(
                ctx.cfg,
                StatusCode::PRECONDITION_FAILED,
                Some(&stat),
            ))
        }
    }

    let mut headers = generic_headers(ctx.cfg);
    stat_headers(ctx.cfg, &stat, &mut headers);

    let Some(tokens) = range_tokens(ctx.range_header()) else {
        if is_head {
            return Ok(build_bytes_response(StatusCode::OK, headers, Bytes::new(), true));
        }
        let data = tokio::fs::read(path).await.fs_context("read", path)?;
        let data = integrity::validate(ctx.integrity, &[Bytes::from(data)])?;
        set_length(ctx.cfg, &mut headers, data.len() as u64);
        return Ok(build_bytes_response(StatusCode::OK, headers, data, false));
    };

    let ranges = match resolve_ranges(&tokens, stat.size) {
        Ok(ranges) => ranges,
        Err(err) => {
            return Ok(build_416_response(
                ctx.cfg,
                &err.into(),
                stat.size,
                ctx.json,
                is_head,
            ))
        }
    };

    let total: u64 = ranges.iter().map(RangeSpec::len).sum();
    set_length(ctx.cfg, &mut headers, total);
    if let [single] = ranges.as_slice() {
        let content_range = format!("bytes {}-{}/{}", single.start, single.end, stat.size);
        if let Ok(value) = HeaderValue::from_str(&content_range) {
            headers.insert(header::CONTENT_RANGE, value);
        }
    }
    if is_head {
        return Ok(build_bytes_response(
            StatusCode::PARTIAL_CONTENT,
            headers,
            Bytes::new(),
            true,
        ));
    }

    let chunks = read_ranges(path, &ranges).await?;
    let data = integrity::validate(ctx.integrity, &chunks)?;
    Ok(build_bytes_response(
        StatusCode::PARTIAL_CONTENT,
        headers,
        data,
        false,
    ))
}

/// `PUT`/`WRITE` (create or truncate) and `POST` (update in place)
///
/// Honours the first token of a `Range` header as the write window.
pub async fn write(
    ctx: &RequestContext<'_>,
    body: Body,
    mode: WriteMode,
) -> Result<Response<Body>, Error> {
    if body.is_absent() {
        return Ok(build_422_response(ctx.cfg));
    }
    if let Some(response) = check_write_preconditions(ctx).await? {
        return Ok(response);
    }

    let window = match range_tokens(ctx.range_header()).and_then(|t| t.first().copied()) {
        Some(token) => Some(write_window(ctx, token).await?),
        None => None,
    };

    write_body(&ctx.resource.path, mode, window, body, ctx.signal).await?;
    Ok(build_status_response(ctx.cfg, StatusCode::CREATED))
}

/// `APPEND`: the whole body goes to the end, `Range` is ignored
pub async fn append(ctx: &RequestContext<'_>, body: Body) -> Result<Response<Body>, Error> {
    if body.is_absent() {
        return Ok(build_422_response(ctx.cfg));
    }
    if let Some(response) = check_write_preconditions(ctx).await? {
        return Ok(response);
    }
    write_body(&ctx.resource.path, WriteMode::Append, None, body, ctx.signal).await?;
    Ok(build_status_response(ctx.cfg, StatusCode::CREATED))
}

async fn write_window(ctx: &RequestContext<'_>, token: &str) -> Result<WriteWindow, Error> {
    let raw = RawRange::parse(token)?;
    let current_size = match raw {
        RawRange::Suffix(_) => current_stat(ctx).await?.map_or(0, |stat| stat.size),
        _ => 0,
    };
    Ok(WriteWindow::from_raw(raw, current_size)?)
}

/// Stat that treats a missing resource as `None`
async fn current_stat(ctx: &RequestContext<'_>) -> Result<Option<StatSnapshot>, Error> {
    match StatSnapshot::capture(&ctx.resource.path).await {
        Ok(stat) => Ok(Some(stat)),
        Err(err) if err.kind() == FsErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Conditional headers on a write: anything but `Proceed` is a 412
async fn check_write_preconditions(
    ctx: &RequestContext<'_>,
) -> Result<Option<Response<Body>>, Error> {
    if !has_preconditions(ctx.headers) {
        return Ok(None);
    }
    let stat = current_stat(ctx).await?;
    match evaluate_preconditions(ctx.headers, stat.as_ref()) {
        Precondition::Proceed => Ok(None),
        Precondition::NotModified | Precondition::Failed => Ok(Some(build_precondition_response(
            ctx.cfg,
            StatusCode::PRECONDITION_FAILED,
            stat.as_ref(),
        ))),
    }
}

/// `READ`: a live stream bound to an open descriptor
pub async fn read(ctx: &RequestContext<'_>) -> Result<Response<Body>, Error> {
    let path = &ctx.resource.path;
    let file = File::open(path).await.fs_context("open", path)?;
    let meta = file.metadata().await.fs_context("fstat", path)?;
    let stat = StatSnapshot::from_metadata(&meta);
    if stat.is_dir {
        return Err(FsError::from_errno(libc::EISDIR, "read", path).into());
    }

    let mut headers = generic_headers(ctx.cfg);
    stat_headers(ctx.cfg, &stat, &mut headers);

    let stream = FileStream::new(file, ctx.cfg.read_chunk_size)
        .with_len(stat.size)
        .with_signal(ctx.signal.cloned())
        .with_label(path);
    Ok(build_response(StatusCode::OK, headers, Body::File(stream)))
}

/// `LIST`: sorted entry names as JSON, directories with a trailing separator
pub async fn list(ctx: &RequestContext<'_>) -> Result<Response<Body>, Error> {
    let path = &ctx.resource.path;
    let stat = StatSnapshot::capture(path).await?;
    let mut entries = tokio::fs::read_dir(path).await.fs_context("scandir", path)?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.fs_context("scandir", path)? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            name.push(MAIN_SEPARATOR);
        }
        names.push(name);
    }
    names.sort();

    let json = serde_json::Value::from(names).to_string();
    let mut headers = generic_headers(ctx.cfg);
    stat_headers(ctx.cfg, &stat, &mut headers);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(json.len()));
    Ok(build_response(StatusCode::OK, headers, Body::from(json)))
}

/// `DELETE`: non-recursive
pub async fn delete(ctx: &RequestContext<'_>) -> Result<Response<Body>, Error> {
    let path = &ctx.resource.path;
    tokio::fs::remove_file(path).await.fs_context("unlink", path)?;
    Ok(build_status_response(ctx.cfg, StatusCode::NO_CONTENT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::request::ResourceRef;
    use hyper::header::HeaderMap;

    struct Fixture {
        _dir: tempfile::TempDir,
        resource: ResourceRef,
        cfg: EngineConfig,
        headers: HeaderMap,
    }

    impl Fixture {
        fn new(contents: Option<&[u8]>) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("file");
            if let Some(contents) = contents {
                std::fs::write(&path, contents).unwrap();
            }
            Self {
                resource: ResourceRef::from_path(&path).unwrap(),
                _dir: dir,
                cfg: EngineConfig::default(),
                headers: HeaderMap::new(),
            }
        }

        fn header(mut self, name: header::HeaderName, value: &str) -> Self {
            self.headers.insert(name, value.parse().unwrap());
            self
        }

        fn ctx(&self) -> RequestContext<'_> {
            RequestContext {
                cfg: &self.cfg,
                resource: &self.resource,
                headers: &self.headers,
                integrity: None,
                signal: None,
                json: false,
            }
        }
    }

    #[tokio::test]
    async fn test_get_whole() {
        let fx = Fixture::new(Some(b"test"));
        let response = get(&fx.ctx(), false).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");
        assert_eq!(response.into_body().bytes().await.unwrap(), "test");
    }

    #[tokio::test]
    async fn test_get_multiple_ranges_concatenated() {
        let fx = Fixture::new(Some(b"0123456789")).header(header::RANGE, "bytes=8-9, 0-1");
        let response = get(&fx.ctx(), false).await.unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");
        assert!(!response.headers().contains_key(header::CONTENT_RANGE));
        assert_eq!(response.into_body().bytes().await.unwrap(), "8901");
    }

    #[tokio::test]
    async fn test_get_single_range_content_range() {
        let fx = Fixture::new(Some(b"0123456789")).header(header::RANGE, "bytes=-3");
        let response = get(&fx.ctx(), false).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 7-9/10");
        assert_eq!(response.headers()["x-poteto-size"], "3");
    }

    #[tokio::test]
    async fn test_get_unsatisfiable() {
        let fx = Fixture::new(Some(b"test")).header(header::RANGE, "bytes=2-4");
        let response = get(&fx.ctx(), false).await.unwrap();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */4");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let fx = Fixture::new(Some(b"test"));
        let response = get(&fx.ctx(), true).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");
        assert!(response.body().is_absent());
    }

    #[tokio::test]
    async fn test_write_without_body() {
        let fx = Fixture::new(None);
        let response = write(&fx.ctx(), Body::Empty, WriteMode::Truncate)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!fx.resource.path.exists());
    }

    #[tokio::test]
    async fn test_ranged_put_and_post() {
        let fx = Fixture::new(Some(b"abcdef")).header(header::RANGE, "bytes=2-3");
        let response = write(&fx.ctx(), Body::from("XYZ"), WriteMode::Update)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(std::fs::read(&fx.resource.path).unwrap(), b"abXYef");

        let response = write(&fx.ctx(), Body::from("XY"), WriteMode::Truncate)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(std::fs::read(&fx.resource.path).unwrap(), b"\0\0XY");
    }

    #[tokio::test]
    async fn test_suffix_write_uses_current_size() {
        let fx = Fixture::new(Some(b"abcdef")).header(header::RANGE, "bytes=-2");
        write(&fx.ctx(), Body::from("XYZ"), WriteMode::Update)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&fx.resource.path).unwrap(), b"abcdXY");
    }

    #[tokio::test]
    async fn test_conditional_write() {
        let fx = Fixture::new(None).header(header::IF_MATCH, "*");
        let response = write(&fx.ctx(), Body::from("x"), WriteMode::Truncate)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
        assert!(!fx.resource.path.exists());
    }

    #[tokio::test]
    async fn test_read_directory_is_eisdir() {
        let dir = tempfile::tempdir().unwrap();
        let resource = ResourceRef::from_path(dir.path()).unwrap();
        let cfg = EngineConfig::default();
        let headers = HeaderMap::new();
        let ctx = RequestContext {
            cfg: &cfg,
            resource: &resource,
            headers: &headers,
            integrity: None,
            signal: None,
            json: false,
        };
        let err = read(&ctx).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(err.code(), Some("EISDIR"));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        let cfg = EngineConfig::default();
        let headers = HeaderMap::new();

        let resource = ResourceRef::from_path(dir.path()).unwrap();
        let ctx = RequestContext {
            cfg: &cfg,
            resource: &resource,
            headers: &headers,
            integrity: None,
            signal: None,
            json: false,
        };
        let response = list(&ctx).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body = response.into_body().bytes().await.unwrap();
        let names: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(names, vec![format!("a{MAIN_SEPARATOR}"), "b.txt".to_string()]);

        let resource = ResourceRef::from_path(dir.path().join("b.txt")).unwrap();
        let ctx = RequestContext {
            resource: &resource,
            ..ctx
        };
        let response = delete(&ctx).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let err = delete(&ctx).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }
}
