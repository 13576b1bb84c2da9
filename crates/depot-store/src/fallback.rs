use crate::StoreError;
use depot_coordinate::Coordinate;
use std::io::Read;

/// Source of artifacts that are missing from the local repository.
///
/// Consulted by [`Repository`](crate::Repository) only when proxy fallback is
/// enabled. Returning `Ok(Some(reader))` hands over the full artifact content,
/// which the repository caches locally before serving it. `Ok(None)` means the
/// artifact is unknown upstream as well.
pub trait RemoteFallbackResolver: Send + Sync {
    fn resolve(&self, coordinate: &Coordinate) -> Result<Option<Box<dyn Read + Send>>, StoreError>;
}

/// Resolver that never finds anything. No upstream integration exists yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl RemoteFallbackResolver for NoFallback {
    fn resolve(&self, coordinate: &Coordinate) -> Result<Option<Box<dyn Read + Send>>, StoreError> {
        tracing::trace!("no remote fallback configured for {coordinate}");
        Ok(None)
    }
}
