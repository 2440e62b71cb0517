//! Local filesystem implementation.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use super::{FileInfo, FileReader, FileSystem};
use crate::guard::ROOT_DIR;

/// Local disk rooted at a canonical directory (or a single file).
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    /// Create a filesystem rooted at `root`, which must exist.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the on-disk path for a relative path without following symlinks.
    fn full_path(&self, path: &str) -> io::Result<PathBuf> {
        let mut full = self.root.clone();

        if path == ROOT_DIR {
            return Ok(full);
        }

        for component in Path::new(path).components() {
            match component {
                Component::Normal(name) => full.push(name),
                Component::CurDir => continue,
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    warn!("Rejected path escaping root: {:?}", path);
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("path escapes root: {path}"),
                    ));
                }
            }
        }

        Ok(full)
    }

    /// Resolve symlinks and verify the target is still inside the root.
    async fn contained_path(&self, path: &str) -> io::Result<PathBuf> {
        let full = self.full_path(path)?;
        let canonical = fs::canonicalize(&full).await?;

        if !canonical.starts_with(&self.root) {
            warn!(
                "Symlink escape attempt: {:?} resolved to {:?} which is outside {:?}",
                full, canonical, self.root
            );
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file or directory: {path}"),
            ));
        }

        Ok(canonical)
    }

    fn base_name(&self, path: &str) -> String {
        if path == ROOT_DIR {
            return self
                .root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| ROOT_DIR.to_string());
        }
        path.rsplit('/').next().unwrap_or(path).to_string()
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn stat(&self, path: &str) -> io::Result<FileInfo> {
        let full_path = self.contained_path(path).await?;
        let meta = fs::metadata(&full_path).await?;
        let name = self.base_name(path);

        Ok(if meta.is_dir() {
            FileInfo::directory(name)
        } else {
            FileInfo::file(name, meta.len())
        })
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<FileInfo>> {
        let dir = self.contained_path(path).await?;
        let mut entries = fs::read_dir(&dir).await?;
        let mut infos = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();

            let meta = if entry.file_type().await?.is_symlink() {
                match fs::canonicalize(entry.path()).await {
                    Ok(target) if target.starts_with(&self.root) => {
                        fs::metadata(&target).await?
                    }
                    Ok(target) => {
                        debug!(
                            "Skipping symlink {:?} pointing outside root: {:?}",
                            name, target
                        );
                        continue;
                    }
                    // Dangling link is listed as itself
                    Err(_) => entry.metadata().await?,
                }
            } else {
                entry.metadata().await?
            };

            infos.push(if meta.is_dir() {
                FileInfo::directory(name)
            } else {
                FileInfo::file(name, meta.len())
            });
        }

        Ok(infos)
    }

    async fn open(&self, path: &str) -> io::Result<FileReader> {
        let full_path = self.contained_path(path).await?;
        let file = fs::File::open(&full_path).await?;
        Ok(Box::new(file))
    }
}
