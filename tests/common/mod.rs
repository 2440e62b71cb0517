//! Test utilities and common setup.
#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use fileserve::fs::{FileInfo, FileReader, FileSystem, LocalFileSystem};
use fileserve::{routes, AppState, Config};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "fileserve-test-boundary";

/// Root with `a.txt` (5 bytes), `b/c.txt` and a dotfile.
pub fn fixture() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("a.txt"), "hello").unwrap();
    std::fs::create_dir(temp_dir.path().join("b")).unwrap();
    std::fs::write(temp_dir.path().join("b/c.txt"), "nested").unwrap();
    std::fs::write(temp_dir.path().join(".hidden"), "secret").unwrap();
    temp_dir
}

pub fn test_app(root: &Path, config: Config) -> Router {
    routes::app(AppState::new(root, config).unwrap())
}

/// Filesystem that records every call before delegating to local disk.
pub struct RecordingFileSystem {
    inner: LocalFileSystem,
    pub calls: Mutex<Vec<String>>,
}

impl RecordingFileSystem {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: LocalFileSystem::new(root).unwrap(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, op: &str, path: &str) {
        self.calls.lock().unwrap().push(format!("{op} {path}"));
    }
}

#[async_trait]
impl FileSystem for RecordingFileSystem {
    async fn stat(&self, path: &str) -> io::Result<FileInfo> {
        self.record("stat", path);
        self.inner.stat(path).await
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<FileInfo>> {
        self.record("read_dir", path);
        self.inner.read_dir(path).await
    }

    async fn open(&self, path: &str) -> io::Result<FileReader> {
        self.record("open", path);
        self.inner.open(path).await
    }
}

/// App over a [`RecordingFileSystem`], returned alongside it.
pub fn recording_app(root: &Path, config: Config) -> (Router, Arc<RecordingFileSystem>) {
    let fs = Arc::new(RecordingFileSystem::new(root));
    let state = AppState::with_filesystem(
        root.canonicalize().unwrap(),
        config,
        fs.clone() as Arc<dyn FileSystem>,
    )
    .unwrap();
    (routes::app(state), fs)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: header::HeaderName) -> &str {
        self.headers[name].to_str().unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();

    TestResponse {
        status,
        headers,
        body: body.to_vec(),
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(
        app,
        Request::builder()
            .uri(uri)
            .method(Method::GET)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

/// Single-field multipart body.
pub fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn upload(
    app: &Router,
    uri: &str,
    field: &str,
    filename: &str,
    content: &[u8],
) -> TestResponse {
    send(
        app,
        Request::builder()
            .uri(uri)
            .method(Method::POST)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(field, filename, content)))
            .unwrap(),
    )
    .await
}

pub fn uploads_config() -> Config {
    Config {
        uploads: true,
        ..Config::default()
    }
}
