//! Directory listings: file records, ordering, and the listing builder.

use std::cmp::Ordering;
use std::io;

use serde::Serialize;

use crate::fs::{FileInfo, FileSystem};
use crate::guard::{PathGuard, PARENT_DIR, ROOT_DIR};
use crate::units::{format_size, SizeUnits};

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path relative to the root
    pub path: String,
    pub name: String,
    /// Formatted size, absent for directories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub is_dir: bool,
}

impl FileRecord {
    /// The synthetic `..` entry pointing at the parent of `dir`.
    pub fn parent_of(dir: &str) -> Self {
        Self {
            path: parent_path(dir),
            name: PARENT_DIR.to_string(),
            size: None,
            is_dir: true,
        }
    }

    pub fn from_info(dir: &str, info: &FileInfo, units: SizeUnits) -> Self {
        Self {
            path: join_path(dir, &info.name),
            name: info.name.clone(),
            size: (!info.is_dir).then(|| format_size(info.size, units)),
            is_dir: info.is_dir,
        }
    }

    pub fn is_parent(&self) -> bool {
        self.is_dir && self.name == PARENT_DIR
    }
}

/// Join a child name onto a cleaned relative directory path.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir == ROOT_DIR {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Parent of a cleaned relative path; top-level entries have the root as parent.
pub fn parent_path(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((parent, _)) => parent.to_string(),
        None => ROOT_DIR.to_string(),
    }
}

/// Listing order: parent entry, then directories, then files, each by name.
pub fn compare(a: &FileRecord, b: &FileRecord) -> Ordering {
    b.is_parent()
        .cmp(&a.is_parent())
        .then_with(|| b.is_dir.cmp(&a.is_dir))
        .then_with(|| a.name.cmp(&b.name))
}

pub fn sort(records: &mut [FileRecord]) {
    records.sort_by(compare);
}

/// Build the sorted listing for a directory that has already been resolved,
/// guarded and confirmed to be a directory.
pub async fn build_listing(
    fs: &dyn FileSystem,
    guard: &PathGuard,
    units: SizeUnits,
    dir: &str,
) -> io::Result<Vec<FileRecord>> {
    let entries = fs.read_dir(dir).await?;
    let mut records = Vec::with_capacity(entries.len() + 1);

    if dir != ROOT_DIR {
        records.push(FileRecord::parent_of(dir));
    }

    records.extend(
        entries
            .iter()
            .filter(|info| guard.is_allowed(&join_path(dir, &info.name)))
            .map(|info| FileRecord::from_info(dir, info, units)),
    );

    sort(&mut records);

    Ok(records)
}
