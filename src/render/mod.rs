//! Output formats for listings and errors.
//!
//! Each request picks one [`ContentType`] from its URL prefix; the
//! [`Renderer`] dispatches to the matching [`Render`] strategy.

mod html;
mod json;
mod text;

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub use html::{breadcrumbs, HtmlRenderer, Link};
pub use json::JsonRenderer;
pub use text::TextRenderer;

use crate::config::Config;
use crate::error::FileServerError;
use crate::guard::ROOT_DIR;
use crate::listing::FileRecord;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output format selected per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Html,
    Json,
    Text,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [ContentType::Html, ContentType::Json, ContentType::Text];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Html => "html",
            ContentType::Json => "json",
            ContentType::Text => "text",
        }
    }

    /// Value of the `Content-Type` response header.
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Html => "text/html; charset=utf-8",
            ContentType::Json => "application/json",
            ContentType::Text => "text/plain; charset=utf-8",
        }
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|ct| ct.as_str() == s)
            .ok_or_else(|| format!("unknown content type {s:?}, expected html, json or text"))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering contract shared by every output format.
pub trait Render: Send + Sync {
    fn render_listing(
        &self,
        w: &mut dyn Write,
        dir: &str,
        records: &[FileRecord],
    ) -> Result<(), RenderError>;

    fn render_error(
        &self,
        w: &mut dyn Write,
        err: &FileServerError,
        status: StatusCode,
    ) -> Result<(), RenderError>;
}

/// Reason phrase for a status, e.g. `Not Found`.
pub fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// URL of `path` (cleaned, relative) under the given content type prefix.
pub fn listing_url(content_type: ContentType, path: &str) -> String {
    if path == ROOT_DIR {
        return format!("/{content_type}/");
    }

    let encoded: Vec<String> = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();

    format!("/{content_type}/{}", encoded.join("/"))
}

pub struct Renderer {
    enabled: Vec<ContentType>,
    html: HtmlRenderer,
    json: JsonRenderer,
    text: TextRenderer,
}

impl Renderer {
    pub fn new(config: &Config) -> Self {
        let enabled = if config.content_types.is_empty() {
            ContentType::ALL.to_vec()
        } else {
            config.content_types.clone()
        };

        Self {
            html: HtmlRenderer::new(enabled.clone(), config.uploads, crate::VERSION),
            json: JsonRenderer::new(config.json_indent),
            text: TextRenderer::new(config.text_full_path),
            enabled,
        }
    }

    /// Enabled content types, in configuration order.
    pub fn content_types(&self) -> &[ContentType] {
        &self.enabled
    }

    pub fn default_content_type(&self) -> ContentType {
        self.enabled.first().copied().unwrap_or(ContentType::Html)
    }

    /// Select the content type named by a URL prefix.
    pub fn negotiate(&self, requested: &str) -> Result<ContentType, FileServerError> {
        requested
            .parse::<ContentType>()
            .ok()
            .filter(|ct| self.enabled.contains(ct))
            .ok_or_else(|| FileServerError::UnsupportedContentType {
                requested: requested.to_string(),
                supported: self
                    .enabled
                    .iter()
                    .map(|ct| ct.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            })
    }

    fn strategy(&self, content_type: ContentType) -> &dyn Render {
        match content_type {
            ContentType::Html => &self.html,
            ContentType::Json => &self.json,
            ContentType::Text => &self.text,
        }
    }

    pub fn listing_response(
        &self,
        content_type: ContentType,
        dir: &str,
        records: &[FileRecord],
    ) -> Result<Response, FileServerError> {
        let mut body = Vec::new();
        self.strategy(content_type)
            .render_listing(&mut body, dir, records)?;

        Ok(([(header::CONTENT_TYPE, content_type.mime())], body).into_response())
    }

    /// Render `err` with its mapped status. Falls back to the raw error text
    /// when the renderer itself fails.
    pub fn error_response(&self, content_type: ContentType, err: &FileServerError) -> Response {
        let status = err.status();

        if status.is_server_error() {
            error!("Request failed with {}: {}", status, err);
        } else {
            warn!("Request failed with {}: {}", status, err);
        }

        let mut body = Vec::new();
        match self
            .strategy(content_type)
            .render_error(&mut body, err, status)
        {
            Ok(()) => (status, [(header::CONTENT_TYPE, content_type.mime())], body).into_response(),
            Err(render_err) => {
                error!("Failed to render error: {}", render_err);
                (
                    status,
                    [(header::CONTENT_TYPE, ContentType::Text.mime())],
                    format!("{}\n", err),
                )
                    .into_response()
            }
        }
    }
}
