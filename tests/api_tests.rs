//! Router-level tests for listings, file streaming and path guarding.

use axum::http::{header, StatusCode};
use fileserve::render::ContentType;
use fileserve::Config;
use serde_json::json;

mod common;
use common::{fixture, get, recording_app, test_app};

#[tokio::test]
async fn test_index_redirects_to_default_listing() {
    let root = fixture();
    let app = test_app(root.path(), Config::default());

    let response = get(&app, "/").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header(header::LOCATION), "/html/");

    let app = test_app(
        root.path(),
        Config {
            content_types: vec![ContentType::Text, ContentType::Json],
            ..Config::default()
        },
    );
    let response = get(&app, "/").await;
    assert_eq!(response.header(header::LOCATION), "/text/");
}

#[tokio::test]
async fn test_health_version_and_content_types() {
    let root = fixture();
    let app = test_app(root.path(), Config::default());

    let response = get(&app, "/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());

    let response = get(&app, "/version").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), format!("{}\n", fileserve::VERSION));

    let response = get(&app, "/content_types").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!(["html", "json", "text"]));
}

#[tokio::test]
async fn test_html_root_listing() {
    let root = fixture();
    let app = test_app(root.path(), Config::default());

    let response = get(&app, "/html/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header(header::CONTENT_TYPE),
        "text/html; charset=utf-8"
    );

    let html = response.text();
    let dir = html.find(">b/</a>").expect("directory row");
    let file = html.find(">a.txt</a>").expect("file row");
    assert!(dir < file);
    assert!(html.contains("5.00B"));
    assert!(!html.contains(".hidden"));
    assert!(!html.contains(">../</a>"));
}

#[tokio::test]
async fn test_root_without_trailing_slash() {
    let root = fixture();
    let app = test_app(root.path(), Config::default());

    let with_slash = get(&app, "/text/").await;
    let without_slash = get(&app, "/text").await;

    assert_eq!(without_slash.status, StatusCode::OK);
    assert_eq!(with_slash.body, without_slash.body);
    assert_eq!(with_slash.text(), "b/\na.txt 5.00B\n");
}

#[tokio::test]
async fn test_json_subdirectory_listing() {
    let root = fixture();
    let app = test_app(root.path(), Config::default());

    let response = get(&app, "/json/b").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "application/json");
    assert_eq!(
        response.json(),
        json!([
            {"path": ".", "name": "..", "is_dir": true},
            {"path": "b/c.txt", "name": "c.txt", "size": "6.00B", "is_dir": false},
        ])
    );
}

#[tokio::test]
async fn test_json_missing_file() {
    let root = fixture();
    let app = test_app(root.path(), Config::default());

    let response = get(&app, "/json/missing").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.json(),
        json!({"status": "Not Found", "message": "file not found: missing"})
    );
}

#[tokio::test]
async fn test_text_error_body() {
    let root = fixture();
    let app = test_app(root.path(), Config::default());

    let response = get(&app, "/text/missing").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "Not Found\nfile not found: missing\n");
}

#[tokio::test]
async fn test_streams_file_contents() {
    let root = fixture();
    let app = test_app(root.path(), Config::default());

    let response = get(&app, "/html/a.txt").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"hello");
    assert_eq!(response.header(header::CONTENT_LENGTH), "5");
    assert_eq!(response.header(header::CONTENT_TYPE), "text/plain");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "inline; filename=\"a.txt\""
    );

    // The content type prefix only selects how listings render
    let response = get(&app, "/json/b/c.txt").await;
    assert_eq!(response.body, b"nested");
}

#[tokio::test]
async fn test_streams_large_file_exactly() {
    let root = fixture();
    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(root.path().join("blob.bin"), &data).unwrap();
    let app = test_app(root.path(), Config::default());

    let response = get(&app, "/text/blob.bin").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_LENGTH), "200000");
    assert_eq!(response.body, data);
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let root = fixture();
    let app = test_app(root.path(), Config::default());

    for uri in ["/html/", "/json/b", "/text/", "/html/a.txt"] {
        let first = get(&app, uri).await;
        let second = get(&app, uri).await;
        assert_eq!(first.status, second.status, "{uri}");
        assert_eq!(first.body, second.body, "{uri}");
    }
}

#[tokio::test]
async fn test_traversal_rejected_before_filesystem() {
    let root = fixture();
    let (app, fs) = recording_app(root.path(), Config::default());

    for uri in [
        "/html/../../etc/passwd",
        "/json/b/../a.txt",
        "/text/~root",
        "/html/.hidden",
    ] {
        let response = get(&app, uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
    }

    assert!(fs.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_guard_applies_after_cleaning() {
    let root = fixture();
    let (app, fs) = recording_app(root.path(), Config::default());

    let response = get(&app, "/text/b//./c.txt").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"nested");
    assert_eq!(
        *fs.calls.lock().unwrap(),
        vec!["stat b/c.txt".to_string(), "open b/c.txt".to_string()]
    );
}

#[tokio::test]
async fn test_dotfiles_served_when_enabled() {
    let root = fixture();
    let app = test_app(
        root.path(),
        Config {
            include_dotfiles: true,
            ..Config::default()
        },
    );

    let response = get(&app, "/text/.hidden").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"secret");

    let listing = get(&app, "/text/").await;
    assert!(listing.text().contains(".hidden"));
}

#[tokio::test]
async fn test_excluded_segments_are_hidden() {
    let root = fixture();
    std::fs::create_dir_all(root.path().join("node_modules/pkg")).unwrap();
    std::fs::write(root.path().join("node_modules/pkg/index.js"), "x").unwrap();

    let app = test_app(
        root.path(),
        Config {
            exclude: Some("^node_modules$".to_string()),
            ..Config::default()
        },
    );

    let listing = get(&app, "/json/").await;
    assert!(!listing.text().contains("node_modules"));

    for uri in ["/json/node_modules", "/json/node_modules/pkg/index.js"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_disabled_content_type_rejected() {
    let root = fixture();
    let app = test_app(
        root.path(),
        Config {
            content_types: vec![ContentType::Json],
            ..Config::default()
        },
    );

    let response = get(&app, "/html/").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["message"],
        "unsupported content type \"html\", supported: [json]"
    );

    let response = get(&app, "/xml/a.txt").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_single_file_root() {
    let root = fixture();
    let app = test_app(&root.path().join("a.txt"), Config::default());

    let response = get(&app, "/text/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"hello");

    let response = get(&app, "/text/b").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_escape_is_not_found() {
    let root = fixture();
    let outside = tempfile::TempDir::new().unwrap();
    std::fs::write(outside.path().join("secret.txt"), "nope").unwrap();
    std::os::unix::fs::symlink(outside.path(), root.path().join("link")).unwrap();

    let app = test_app(root.path(), Config::default());

    let response = get(&app, "/text/link/secret.txt").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[cfg(unix)]
#[tokio::test]
async fn test_links_outside_root_absent_from_listing() {
    let root = fixture();
    let outside = tempfile::TempDir::new().unwrap();
    std::fs::write(outside.path().join("secret.txt"), "0123456789abcdef").unwrap();
    std::os::unix::fs::symlink(outside.path().join("secret.txt"), root.path().join("leak"))
        .unwrap();
    std::os::unix::fs::symlink(root.path().join("a.txt"), root.path().join("alias")).unwrap();

    let app = test_app(root.path(), Config::default());

    let listing = get(&app, "/text/").await;
    assert_eq!(listing.status, StatusCode::OK);
    assert!(!listing.text().contains("leak"));
    assert!(!listing.text().contains("16.00B"));
    assert!(listing.text().contains("alias 5.00B"));

    let response = get(&app, "/text/leak").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
