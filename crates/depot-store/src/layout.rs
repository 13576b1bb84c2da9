use depot_coordinate::Coordinate;
use std::path::{Path, PathBuf};

/// On-disk layout of an artifact repository.
///
/// An artifact lives at
/// `<root>/<group-segment-1>/…/<group-segment-n>/<artifact>/[<version>/]<file>`;
/// the version directory is present exactly when the coordinate has a version.
#[derive(Debug, Clone)]
pub struct RepositoryLayout {
    root: PathBuf,
}

impl RepositoryLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn artifact_path(&self, coordinate: &Coordinate) -> PathBuf {
        resolve_path(coordinate, &self.root)
    }
}

/// Absolute storage path of `coordinate` under `root`. Pure path arithmetic.
pub fn resolve_path(coordinate: &Coordinate, root: &Path) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(coordinate.segments());
    path
}
