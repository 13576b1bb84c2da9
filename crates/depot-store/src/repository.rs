use crate::fallback::{NoFallback, RemoteFallbackResolver};
use crate::layout::RepositoryLayout;
use crate::{fsync_dir, StoreError};
use depot_coordinate::Coordinate;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

/// Outcome of [`Repository::retrieve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrieval {
    Found,
    NotFound,
}

/// Artifact repository rooted at one directory.
///
/// Built once per process and shared by reference with the request layer.
/// Stores are written to a temporary file in the destination directory and
/// renamed into place, so concurrent readers observe either the previous or
/// the new content in full. Concurrent stores to one coordinate are not
/// serialized: the last rename wins.
pub struct Repository {
    layout: RepositoryLayout,
    proxy_enabled: bool,
    fallback: Box<dyn RemoteFallbackResolver>,
}

impl Repository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: RepositoryLayout::new(root),
            proxy_enabled: false,
            fallback: Box::new(NoFallback),
        }
    }

    #[must_use]
    pub fn with_proxy(mut self, enabled: bool) -> Self {
        self.proxy_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, resolver: impl RemoteFallbackResolver + 'static) -> Self {
        self.fallback = Box::new(resolver);
        self
    }

    #[inline]
    pub fn layout(&self) -> &RepositoryLayout {
        &self.layout
    }

    #[inline]
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    #[inline]
    pub fn proxy_enabled(&self) -> bool {
        self.proxy_enabled
    }

    /// Resolve the storage path, refusing segments that would leave the root.
    pub fn artifact_path(&self, coordinate: &Coordinate) -> Result<PathBuf, StoreError> {
        if let Some(bad) = coordinate.segments().find(|s| matches!(*s, "." | "..")) {
            return Err(StoreError::UnsafeSegment(bad.to_owned()));
        }
        Ok(self.layout.artifact_path(coordinate))
    }

    /// Whether a regular file is stored for `coordinate`.
    pub fn exists(&self, coordinate: &Coordinate) -> Result<bool, StoreError> {
        let path = self.artifact_path(coordinate)?;
        is_regular_file(&path)
    }

    /// Copy the stored artifact into `sink`.
    ///
    /// With no sink this is an existence check: nothing is read and the
    /// outcome is still [`Retrieval::Found`] when the file exists. A missing
    /// artifact is `Ok(Retrieval::NotFound)`; I/O failures are errors.
    pub fn retrieve(
        &self,
        coordinate: &Coordinate,
        sink: Option<&mut dyn Write>,
    ) -> Result<Retrieval, StoreError> {
        let path = self.artifact_path(coordinate)?;
        if !is_regular_file(&path)? && !self.fetch_missing(coordinate)? {
            return Ok(Retrieval::NotFound);
        }
        if let Some(sink) = sink {
            copy_out(coordinate, &path, sink)?;
        }
        Ok(Retrieval::Found)
    }

    /// Open the stored artifact for streaming, going through the remote
    /// fallback on a local miss the same way [`Repository::retrieve`] does.
    pub fn open(&self, coordinate: &Coordinate) -> Result<Option<File>, StoreError> {
        let path = self.artifact_path(coordinate)?;
        if !is_regular_file(&path)? && !self.fetch_missing(coordinate)? {
            return Ok(None);
        }
        match File::open(&path) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!(
                    group = coordinate.group(),
                    artifact = coordinate.artifact(),
                    version = coordinate.version(),
                    file = coordinate.file_name(),
                    path = %path.display(),
                    "failed to open artifact: {e}"
                );
                Err(StoreError::io(&path, e))
            }
        }
    }

    /// Local miss: ask the fallback resolver when proxying is enabled and
    /// cache whatever it returns. `true` when the artifact is now stored.
    fn fetch_missing(&self, coordinate: &Coordinate) -> Result<bool, StoreError> {
        if !self.proxy_enabled {
            error!(
                group = coordinate.group(),
                artifact = coordinate.artifact(),
                version = coordinate.version(),
                file = coordinate.file_name(),
                "artifact not found in the local repository"
            );
            return Ok(false);
        }

        let Some(mut upstream) = self.fallback.resolve(coordinate)? else {
            debug!(
                group = coordinate.group(),
                artifact = coordinate.artifact(),
                version = coordinate.version(),
                file = coordinate.file_name(),
                "artifact not found locally or upstream"
            );
            return Ok(false);
        };
        let bytes = self.store(coordinate, &mut upstream)?;
        info!("cached {coordinate} from remote fallback ({bytes} bytes)");
        Ok(true)
    }

    /// Write the whole of `source` as the artifact for `coordinate`, replacing
    /// any previous content. Missing directories are created. Returns the
    /// number of bytes written.
    pub fn store(&self, coordinate: &Coordinate, source: &mut dyn Read) -> Result<u64, StoreError> {
        let path = self.artifact_path(coordinate)?;
        let dir = path.parent().unwrap_or(self.layout.root());
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let written = write_atomically(dir, &path, source).map_err(|e| {
            error!(
                group = coordinate.group(),
                artifact = coordinate.artifact(),
                version = coordinate.version(),
                file = coordinate.file_name(),
                path = %path.display(),
                "failed to store artifact: {e}"
            );
            StoreError::io(&path, e)
        })?;
        debug!("stored {coordinate}: {written} bytes");
        Ok(written)
    }
}

fn is_regular_file(path: &Path) -> Result<bool, StoreError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        // A file standing where a directory is expected means the artifact is absent.
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            Ok(false)
        }
        Err(e) => Err(StoreError::io(path, e)),
    }
}

fn copy_out(coordinate: &Coordinate, path: &Path, sink: &mut dyn Write) -> Result<u64, StoreError> {
    fn copy(path: &Path, sink: &mut dyn Write) -> io::Result<u64> {
        let mut reader = BufReader::new(File::open(path)?);
        let n = io::copy(&mut reader, sink)?;
        sink.flush()?;
        Ok(n)
    }

    copy(path, sink).map_err(|e| {
        error!(
            group = coordinate.group(),
            artifact = coordinate.artifact(),
            version = coordinate.version(),
            file = coordinate.file_name(),
            path = %path.display(),
            "failed to read artifact: {e}"
        );
        StoreError::io(path, e)
    })
}

fn write_atomically(dir: &Path, dest: &Path, source: &mut dyn Read) -> io::Result<u64> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    let written = io::copy(source, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    fsync_dir(dir)?;
    Ok(written)
}
