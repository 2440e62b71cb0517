use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::FileServerError;
use crate::fs::FileInfo;
use crate::guard::{clean_path, ROOT_DIR};
use crate::listing::build_listing;
use crate::render::{listing_url, ContentType};
use crate::upload::{self, StoredUpload};
use crate::AppState;

/// Health check endpoint
pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn version() -> String {
    format!("{}\n", crate::VERSION)
}

/// Enabled content types, default first.
pub async fn content_types(State(state): State<AppState>) -> Json<Vec<ContentType>> {
    Json(state.renderer.content_types().to_vec())
}

/// Redirect `/` to the root listing in the default format.
pub async fn index(State(state): State<AppState>) -> Redirect {
    Redirect::to(&listing_url(
        state.renderer.default_content_type(),
        ROOT_DIR,
    ))
}

/// List (or stream) the root.
pub async fn get_root(
    State(state): State<AppState>,
    Path(content_type): Path<String>,
) -> Response {
    serve(&state, &content_type, ROOT_DIR).await
}

/// List a directory or stream a file below the root.
pub async fn get_path(
    State(state): State<AppState>,
    Path((content_type, file)): Path<(String, String)>,
) -> Response {
    serve(&state, &content_type, &file).await
}

/// Upload a file via multipart form data.
pub async fn upload_file(
    State(state): State<AppState>,
    Path(content_type): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let content_type = match state.renderer.negotiate(&content_type) {
        Ok(ct) => ct,
        Err(err) => {
            return state
                .renderer
                .error_response(state.renderer.default_content_type(), &err)
        }
    };

    let stored = match receive_upload(&state, multipart).await {
        Ok(stored) => stored,
        Err(err) => return state.renderer.error_response(content_type, &err),
    };

    let dir = stored.listing_dir.as_deref().unwrap_or(ROOT_DIR);

    if content_type == ContentType::Html {
        return Redirect::to(&listing_url(ContentType::Html, dir)).into_response();
    }

    match state
        .renderer
        .listing_response(content_type, dir, std::slice::from_ref(&stored.record))
    {
        Ok(response) => (StatusCode::CREATED, response).into_response(),
        Err(err) => state.renderer.error_response(content_type, &err),
    }
}

async fn receive_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<StoredUpload, FileServerError> {
    if !state.config.uploads {
        return Err(FileServerError::UploadsDisabled);
    }

    let multipart =
        multipart.map_err(|rejection| FileServerError::Multipart(rejection.body_text()))?;

    upload::store_upload(state, multipart).await
}

async fn serve(state: &AppState, content_type: &str, raw_path: &str) -> Response {
    let content_type = match state.renderer.negotiate(content_type) {
        Ok(ct) => ct,
        Err(err) => {
            return state
                .renderer
                .error_response(state.renderer.default_content_type(), &err)
        }
    };

    match serve_path(state, content_type, raw_path).await {
        Ok(response) => response,
        Err(err) => state.renderer.error_response(content_type, &err),
    }
}

/// Clean, guard, stat, then either list or stream. The guard runs before any
/// filesystem access.
async fn serve_path(
    state: &AppState,
    content_type: ContentType,
    raw_path: &str,
) -> Result<Response, FileServerError> {
    let path = clean_path(raw_path)?;

    if state.guard.is_forbidden(&path) {
        return Err(FileServerError::NotFound(path));
    }

    let info = state
        .fs
        .stat(&path)
        .await
        .map_err(|e| FileServerError::from_io(e, &path))?;

    if !info.is_dir {
        return serve_file(state, &path, &info).await;
    }

    debug!("Listing directory: {}", path);

    let records = build_listing(
        state.fs.as_ref(),
        &state.guard,
        state.config.size_units,
        &path,
    )
    .await
    .map_err(|e| FileServerError::from_io(e, &path))?;

    state
        .renderer
        .listing_response(content_type, &path, &records)
}

async fn serve_file(
    state: &AppState,
    path: &str,
    info: &FileInfo,
) -> Result<Response, FileServerError> {
    debug!("Streaming file: {}", path);

    let reader = state
        .fs
        .open(path)
        .await
        .map_err(|e| FileServerError::from_io(e, path))?;

    let body = Body::from_stream(ReaderStream::new(reader));

    let mime = mime_guess::from_path(&info.name)
        .first_or_octet_stream()
        .to_string();

    // Sanitize filename for Content-Disposition header
    let safe_filename = info.name.replace('"', "'");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_LENGTH, info.size.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", safe_filename),
            ),
        ],
        body,
    )
        .into_response())
}
