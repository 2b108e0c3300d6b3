#![cfg(unix)]

use std::os::unix::fs::symlink;

use hyper::{header, StatusCode};
use poteto::{Config, Error, Poteto, RedirectPolicy, RequestInit};
use url::Url;

#[tokio::test]
async fn test_symlink_policies() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("target"), b"target content").unwrap();
    symlink("target", dir.path().join("link1")).unwrap();

    let poteto = Poteto::new(&Config::default())
        .unwrap()
        .with_base_dir(dir.path());
    let expected = Url::from_file_path(dir.path().join("target")).unwrap();

    let response = poteto
        .fetch("link1", RequestInit::new().redirect(RedirectPolicy::Follow))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.into_body().bytes().await.unwrap(),
        "target content"
    );

    let response = poteto
        .fetch("link1", RequestInit::new().redirect(RedirectPolicy::Manual))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], expected.as_str());
    assert!(response.into_body().bytes().await.unwrap().is_empty());

    let err = poteto
        .fetch("link1", RequestInit::new().redirect(RedirectPolicy::Error))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Redirect { .. }));
}

#[tokio::test]
async fn test_manual_policy_on_plain_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("plain"), b"plain").unwrap();

    let poteto = Poteto::new(&Config::default())
        .unwrap()
        .with_base_dir(dir.path());
    let response = poteto
        .fetch("plain", RequestInit::new().redirect(RedirectPolicy::Manual))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.into_body().bytes().await.unwrap(), "plain");
}

#[tokio::test]
async fn test_manual_policy_walks_a_chain_one_hop_at_a_time() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("target"), b"target content").unwrap();
    symlink("target", dir.path().join("link1")).unwrap();
    symlink("link1", dir.path().join("link2")).unwrap();

    let poteto = Poteto::new(&Config::default())
        .unwrap()
        .with_base_dir(dir.path());
    let manual = || RequestInit::new().redirect(RedirectPolicy::Manual);

    let first = poteto.fetch("link2", manual()).await.unwrap();
    assert_eq!(first.status(), StatusCode::FOUND);
    let location = first.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert_eq!(
        location,
        Url::from_file_path(dir.path().join("link1")).unwrap().as_str()
    );

    let second = poteto.fetch(location.as_str(), manual()).await.unwrap();
    assert_eq!(second.status(), StatusCode::FOUND);
    let location = second.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert_eq!(
        location,
        Url::from_file_path(dir.path().join("target")).unwrap().as_str()
    );

    let last = poteto.fetch(location.as_str(), manual()).await.unwrap();
    assert_eq!(last.status(), StatusCode::OK);
    assert_eq!(last.into_body().bytes().await.unwrap(), "target content");
}

#[tokio::test]
async fn test_link_loop_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    symlink("loop", dir.path().join("loop")).unwrap();

    let poteto = Poteto::new(&Config::default())
        .unwrap()
        .with_base_dir(dir.path());
    let response = poteto.fetch("loop", RequestInit::new()).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["x-poteto-code"], "ELOOP");
}
