//! Read-mostly HTTP file server.
//!
//! Serves a directory tree (or a single file) as HTML, JSON or plain-text
//! listings selected by URL prefix, streams file contents, and optionally
//! accepts multipart uploads. It can be used as the `fileserve` binary or
//! embedded in another application through [`routes::app`].

pub mod config;
pub mod error;
pub mod fs;
pub mod guard;
pub mod handlers;
pub mod listing;
pub mod logging;
pub mod render;
pub mod routes;
pub mod units;
pub mod upload;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use config::{Config, ConfigError};
pub use error::FileServerError;

use crate::fs::{FileSystem, LocalFileSystem};
use crate::guard::PathGuard;
use crate::render::Renderer;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Canonical root being served (a directory or a single file)
    pub root_dir: PathBuf,
    /// Whether the root is a directory; a file root disables subpaths
    pub root_is_dir: bool,
    /// Directory uploads are written into
    pub uploads_dir: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    pub guard: Arc<PathGuard>,
    pub renderer: Arc<Renderer>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Serve `root` from the local disk.
    pub fn new(root: impl AsRef<Path>, config: Config) -> Result<Self, ConfigError> {
        let root = root.as_ref();
        let fs = LocalFileSystem::new(root).map_err(|source| ConfigError::Root {
            path: root.to_path_buf(),
            source,
        })?;
        let root_dir = fs.root().to_path_buf();

        Self::with_filesystem(root_dir, config, Arc::new(fs))
    }

    /// Build state around any [`FileSystem`]; `root_dir` is used for the
    /// root kind and for locating uploads.
    pub fn with_filesystem(
        root_dir: PathBuf,
        config: Config,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self, ConfigError> {
        let guard = PathGuard::new(config.exclude_pattern()?, config.include_dotfiles);
        let renderer = Renderer::new(&config);
        let root_is_dir = root_dir.is_dir();

        let uploads_dir = match &config.uploads_dir {
            Some(dir) => dir.clone(),
            None if root_is_dir => root_dir.clone(),
            None => root_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root_dir.clone()),
        };
        // Canonical when it exists, so uploads inside the root map to a listing
        let uploads_dir = uploads_dir.canonicalize().unwrap_or(uploads_dir);

        Ok(Self {
            root_dir,
            root_is_dir,
            uploads_dir,
            fs,
            guard: Arc::new(guard),
            renderer: Arc::new(renderer),
            config: Arc::new(config),
        })
    }
}
