//! Symbolic-link redirects
//!
//! Under `follow` the filesystem resolves links on its own. Under `error`
//! and `manual` the resource is read as a link first; one hop per call.

use std::path::{Component, Path, PathBuf};

use hyper::Response;
use url::Url;

use crate::body::Body;
use crate::config::EngineConfig;
use crate::error::Error;
use crate::fs::{FsError, FsErrorKind};
use crate::http::build_redirect_response;
use crate::logger;
use crate::request::{RedirectPolicy, ResourceRef};

/// Short-circuit response for a link, or `None` to carry on
pub async fn resolve(
    cfg: &EngineConfig,
    resource: &ResourceRef,
    policy: RedirectPolicy,
) -> Result<Option<Response<Body>>, Error> {
    if policy == RedirectPolicy::Follow {
        return Ok(None);
    }
    let Some(target) = read_link(&resource.path).await? else {
        return Ok(None);
    };
    let location = Url::from_file_path(&target).map_err(|()| Error::InvalidUrl {
        message: format!("link target {} is not absolute", target.display()),
    })?;

    match policy {
        RedirectPolicy::Error => Err(Error::Redirect {
            link: resource.url.to_string(),
            target: location.to_string(),
        }),
        RedirectPolicy::Manual => {
            logger::log_debug(&format!("[Redirect] {} -> {location}", resource.url));
            Ok(Some(build_redirect_response(cfg, location.as_str())))
        }
        RedirectPolicy::Follow => Ok(None),
    }
}

/// Absolute, normalized link target, `None` if `path` is not a link
async fn read_link(path: &Path) -> Result<Option<PathBuf>, Error> {
    match tokio::fs::read_link(path).await {
        Ok(target) => {
            let base = path.parent().unwrap_or_else(|| Path::new("/"));
            Ok(Some(normalize(&base.join(target))))
        }
        Err(err) => {
            let err = FsError::new(err, "readlink", path);
            match err.kind() {
                // EINVAL: exists but is not a link
                FsErrorKind::InvalidArgument | FsErrorKind::NotFound => Ok(None),
                _ => Err(err.into()),
            }
        }
    }
}

/// Lexically resolve `.` and `..`
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
