use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::ContentType;
use crate::units::SizeUnits;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid exclude pattern: {0}")]
    Exclude(#[from] regex::Error),

    #[error("invalid root {path}: {source}")]
    Root {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Fileserve configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Regex tested against every path segment; matches are hidden
    #[serde(default)]
    pub exclude: Option<String>,

    /// Serve entries whose name starts with a dot
    #[serde(default)]
    pub include_dotfiles: bool,

    /// Enabled output formats; the first one is the default
    #[serde(default = "default_content_types")]
    pub content_types: Vec<ContentType>,

    /// Indent JSON responses
    #[serde(default = "default_true")]
    pub json_indent: bool,

    /// Print paths relative to the root instead of names in text listings
    #[serde(default)]
    pub text_full_path: bool,

    /// Unit system for formatted sizes
    #[serde(default)]
    pub size_units: SizeUnits,

    /// Accept multipart uploads
    #[serde(default)]
    pub uploads: bool,

    /// Destination for uploads (defaults to the served root)
    #[serde(default)]
    pub uploads_dir: Option<PathBuf>,

    /// Prefix uploaded file names with a UTC timestamp
    #[serde(default)]
    pub uploads_timestamp: bool,

    /// Maximum file size for uploads (in bytes)
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_content_types() -> Vec<ContentType> {
    ContentType::ALL.to_vec()
}

fn default_true() -> bool {
    true
}

fn default_max_upload_size() -> u64 {
    100 * 1024 * 1024 // 100 MB
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude: None,
            include_dotfiles: false,
            content_types: default_content_types(),
            json_indent: default_true(),
            text_full_path: false,
            size_units: SizeUnits::default(),
            uploads: false,
            uploads_dir: None,
            uploads_timestamp: false,
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Compile the exclusion pattern, if any
    pub fn exclude_pattern(&self) -> Result<Option<regex::Regex>, ConfigError> {
        match self.exclude.as_deref() {
            Some(pattern) if !pattern.is_empty() => Ok(Some(regex::Regex::new(pattern)?)),
            _ => Ok(None),
        }
    }
}
