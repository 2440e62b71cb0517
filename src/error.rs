use std::io;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::render::RenderError;

#[derive(Error, Debug)]
pub enum FileServerError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("unsupported content type {requested:?}, supported: [{supported}]")]
    UnsupportedContentType { requested: String, supported: String },

    #[error("uploads are disabled")]
    UploadsDisabled,

    #[error("file already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid multipart body: {0}")]
    Multipart(String),

    #[error("missing multipart field `file`")]
    MissingFile,

    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl FileServerError {
    /// Map a filesystem error for `path` onto the request error taxonomy.
    pub fn from_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_string()),
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidFilename => {
                Self::InvalidPath(path.to_string())
            }
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.to_string()),
            _ => Self::Io(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PermissionDenied(_) | Self::UploadsDisabled => StatusCode::FORBIDDEN,
            Self::InvalidPath(_)
            | Self::UnsupportedContentType { .. }
            | Self::AlreadyExists(_)
            | Self::Multipart(_)
            | Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io(err) => match err.kind() {
                io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
                io::ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
                io::ErrorKind::InvalidInput
                | io::ErrorKind::InvalidData
                | io::ErrorKind::InvalidFilename => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// Plain-text fallback for errors raised outside a renderer context.
impl IntoResponse for FileServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("{}\n", self),
        )
            .into_response()
    }
}
