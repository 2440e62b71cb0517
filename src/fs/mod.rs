//! Read-only filesystem access rooted at a fixed directory.
//!
//! Provides a trait-based abstraction so handlers never touch paths outside
//! the served root directly:
//! - [`LocalFileSystem`] serves the local disk

mod local;
mod traits;

pub use local::LocalFileSystem;
pub use traits::{FileInfo, FileReader, FileSystem};
