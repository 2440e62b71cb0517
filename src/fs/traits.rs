//! Filesystem trait definitions.

use std::io;

use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Metadata about a file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Base name of the entry.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Whether this is a directory.
    pub is_dir: bool,
}

impl FileInfo {
    /// Create info for a file.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            is_dir: false,
        }
    }

    /// Create info for a directory.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            is_dir: true,
        }
    }
}

/// Byte stream of an opened file.
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Read-only filesystem rooted at a fixed directory.
///
/// Paths are cleaned, slash-separated and relative to the root; `.` is the
/// root itself. Errors keep their [`io::ErrorKind`] so callers can map them
/// to HTTP statuses.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Get metadata for a path.
    async fn stat(&self, path: &str) -> io::Result<FileInfo>;

    /// List the entries of a directory, in no particular order.
    async fn read_dir(&self, path: &str) -> io::Result<Vec<FileInfo>>;

    /// Open a file for streaming.
    async fn open(&self, path: &str) -> io::Result<FileReader>;
}
