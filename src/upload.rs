//! Multipart uploads into the configured upload directory.

use axum::extract::multipart::{Field, Multipart};
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::error::FileServerError;
use crate::listing::{parent_path, FileRecord};
use crate::units::format_size;
use crate::AppState;

/// Name of the multipart field carrying the file.
pub const UPLOAD_FIELD: &str = "file";

/// A file written by [`store_upload`].
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub record: FileRecord,
    /// Directory holding the upload relative to the root, when it lies inside it
    pub listing_dir: Option<String>,
}

/// Longest file name most filesystems accept, in bytes.
pub const MAX_NAME_BYTES: usize = 255;

const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

fn replace_unsafe(c: char) -> Option<char> {
    match c {
        c if c.is_control() => None,
        '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => Some('_'),
        c => Some(c),
    }
}

/// Device names are reserved on Windows whatever the extension.
fn is_reserved(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED_NAMES
        .iter()
        .any(|reserved| stem.eq_ignore_ascii_case(reserved))
}

/// Reduce a client-supplied name to a single safe path segment.
///
/// Control characters are dropped, separators and shell metacharacters
/// become `_`, and leading/trailing dots and spaces are trimmed so the
/// result can never be hidden or refer to a parent. Returns None when
/// nothing usable is left or the name is reserved.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let replaced: String = raw.chars().filter_map(replace_unsafe).collect();
    let name = replaced.trim_matches(|c| c == '.' || c == ' ');

    if name.is_empty() || is_reserved(name) {
        return None;
    }

    Some(name.to_string())
}

/// Join `prefix` and `name`, cutting `name` on a char boundary so the
/// result fits in [`MAX_NAME_BYTES`].
pub fn stored_name(prefix: &str, name: &str) -> String {
    let mut end = name.len().min(MAX_NAME_BYTES.saturating_sub(prefix.len()));
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    format!("{prefix}{}", &name[..end])
}

pub fn timestamp_prefix(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d_%H-%M-%S_").to_string()
}

/// Store the first `file` field of a multipart body.
///
/// The destination is opened with `create_new`, so an existing file is never
/// overwritten and concurrent uploads of the same name cannot both succeed.
pub async fn store_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<StoredUpload, FileServerError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Multipart error parsing field: {}", e);
        FileServerError::Multipart(e.to_string())
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        return write_field(state, field).await;
    }

    Err(FileServerError::MissingFile)
}

async fn write_field(
    state: &AppState,
    mut field: Field<'_>,
) -> Result<StoredUpload, FileServerError> {
    let raw_filename = field.file_name().unwrap_or_default().to_string();

    let invalid = || {
        warn!("Rejected invalid filename: {:?}", raw_filename);
        FileServerError::InvalidPath(format!("invalid filename: {:?}", raw_filename))
    };

    let name = sanitize_filename(&raw_filename).ok_or_else(invalid)?;
    let prefix = if state.config.uploads_timestamp {
        timestamp_prefix(Utc::now())
    } else {
        String::new()
    };
    let file_name = stored_name(&prefix, &name);

    let dest = state.uploads_dir.join(&file_name);

    // Path in listings, when the upload lands inside the root
    let relative = dest
        .strip_prefix(&state.root_dir)
        .ok()
        .filter(|_| state.root_is_dir)
        .map(|rel| rel.to_string_lossy().replace('\\', "/"));

    // A name the guard hides could never be listed or fetched
    if state.guard.is_forbidden(&file_name) {
        return Err(invalid());
    }

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&dest)
        .await
        .map_err(|e| FileServerError::from_io(e, &file_name))?;

    let size = match copy_field(&mut field, &mut file, state.config.max_upload_size).await {
        Ok(size) => size,
        Err(err) => {
            drop(file);
            if let Err(rm_err) = fs::remove_file(&dest).await {
                error!("Failed to remove partial upload {}: {}", dest.display(), rm_err);
            }
            return Err(err);
        }
    };

    info!("Uploaded file: {} ({} bytes)", dest.display(), size);

    let (path, listing_dir) = match relative {
        Some(rel) => {
            let dir = parent_path(&rel);
            (rel, Some(dir))
        }
        None => (file_name.clone(), None),
    };

    Ok(StoredUpload {
        record: FileRecord {
            path,
            name: file_name,
            size: Some(format_size(size, state.config.size_units)),
            is_dir: false,
        },
        listing_dir,
    })
}

/// Stream a field to disk chunk by chunk, enforcing the size limit.
async fn copy_field(
    field: &mut Field<'_>,
    file: &mut fs::File,
    limit: u64,
) -> Result<u64, FileServerError> {
    let mut total_size = 0u64;

    while let Some(chunk) = field.chunk().await.map_err(|e| {
        error!("Failed to read upload data: {}", e);
        FileServerError::Multipart(e.to_string())
    })? {
        total_size = total_size.saturating_add(chunk.len() as u64);
        if total_size > limit {
            return Err(FileServerError::FileTooLarge {
                size: total_size,
                limit,
            });
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    file.sync_all().await?;

    Ok(total_size)
}
