//! Request path cleaning and visibility rules.
//!
//! Every path a client can name goes through [`clean_path`] and then
//! [`PathGuard::is_forbidden`] before the filesystem is touched. The same
//! check runs for each child while listing a directory, so hidden entries
//! never show up in listings either.

use regex::Regex;
use tracing::debug;

use crate::error::FileServerError;

/// The served root, as a cleaned relative path.
pub const ROOT_DIR: &str = ".";

/// Name of the synthetic parent-directory entry.
pub const PARENT_DIR: &str = "..";

/// Normalise a raw request path into a slash-separated relative path.
///
/// Empty and `.` segments are dropped. `..` segments are kept verbatim so the
/// guard can reject them; they are never resolved lexically. An empty result
/// is the root (`.`).
pub fn clean_path(raw: &str) -> Result<String, FileServerError> {
    if raw.contains('\0') {
        return Err(FileServerError::InvalidPath(
            "path contains a null byte".to_string(),
        ));
    }

    let segments: Vec<&str> = raw
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    if segments.is_empty() {
        return Ok(ROOT_DIR.to_string());
    }

    Ok(segments.join("/"))
}

#[derive(Debug, Clone, Default)]
pub struct PathGuard {
    exclude: Option<Regex>,
    include_dotfiles: bool,
}

impl PathGuard {
    pub fn new(exclude: Option<Regex>, include_dotfiles: bool) -> Self {
        Self {
            exclude,
            include_dotfiles,
        }
    }

    /// Returns true when `path` must be treated as nonexistent.
    pub fn is_forbidden(&self, path: &str) -> bool {
        if path == ROOT_DIR {
            return false;
        }

        let forbidden = path.split('/').any(|segment| self.is_forbidden_segment(segment));
        if forbidden {
            debug!("Path hidden by guard: {}", path);
        }
        forbidden
    }

    pub fn is_allowed(&self, path: &str) -> bool {
        !self.is_forbidden(path)
    }

    fn is_forbidden_segment(&self, segment: &str) -> bool {
        if segment == PARENT_DIR || segment.starts_with('~') {
            return true;
        }

        if !self.include_dotfiles && segment.starts_with('.') {
            return true;
        }

        self.exclude
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(segment))
    }
}
