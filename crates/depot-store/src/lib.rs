//! Filesystem storage for depot artifacts.
//!
//! [`RepositoryLayout`] maps a [`Coordinate`](depot_coordinate::Coordinate)
//! to its path under the repository root, and [`Repository`] performs the
//! existence checks, streamed reads and streamed writes against that path.
//! A [`RemoteFallbackResolver`] can be plugged in to satisfy local misses
//! when proxy fallback is enabled; the default resolves nothing.

pub mod fallback;
pub mod layout;
pub mod repository;

pub use fallback::{NoFallback, RemoteFallbackResolver};
pub use layout::{resolve_path, RepositoryLayout};
pub use repository::{Repository, Retrieval};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fsync a directory so that a preceding `rename()` into it is durable.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("path segment '{0}' is not allowed in a repository path")]
    UnsafeSegment(String),
    #[error("remote fallback failed: {0}")]
    Fallback(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
