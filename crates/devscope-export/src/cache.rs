//! Time-bounded cache of the loaded export.

use crate::discovery::{ExportError, ExportInfo, latest_export};
use devscope_inventory::{Inventory, InventoryError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Default time-to-live: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);

struct CachedExport {
    path: PathBuf,
    modified: SystemTime,
    inventory: Arc<Inventory>,
    loaded_at: Instant,
}

/// Holds at most one parsed export. An entry is reused until it is older
/// than the TTL, the requested file changes (path or modification time), or
/// [`ExportCache::invalidate`] is called.
pub struct ExportCache {
    ttl: Duration,
    entry: Option<CachedExport>,
}

impl Default for ExportCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ExportCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Path of the cached export, if any.
    pub fn cached_path(&self) -> Option<&Path> {
        self.entry.as_ref().map(|e| e.path.as_path())
    }

    /// Whether the cache would reload at `now`. An empty cache is stale.
    pub fn is_stale_at(&self, now: Instant) -> bool {
        match &self.entry {
            None => true,
            Some(entry) => now.saturating_duration_since(entry.loaded_at) >= self.ttl,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Instant::now())
    }

    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            tracing::debug!("export cache invalidated");
        }
    }

    /// Cached inventory for `export`, loading from disk when stale or when the
    /// file differs from the cached one.
    pub fn get_or_load(&mut self, export: &ExportInfo) -> Result<Arc<Inventory>, InventoryError> {
        self.get_or_load_with(export, Instant::now(), Inventory::from_path)
    }

    pub fn get_or_load_with<F>(
        &mut self,
        export: &ExportInfo,
        now: Instant,
        load: F,
    ) -> Result<Arc<Inventory>, InventoryError>
    where
        F: FnOnce(&Path) -> Result<Inventory, InventoryError>,
    {
        if let Some(entry) = &self.entry
            && entry.path == export.path
            && entry.modified == export.modified
            && !self.is_stale_at(now)
        {
            tracing::debug!(path = %export.path.display(), "export cache hit");
            return Ok(Arc::clone(&entry.inventory));
        }

        let inventory = Arc::new(load(&export.path)?);
        tracing::debug!(path = %export.path.display(), rows = inventory.len(), "export loaded");
        self.entry = Some(CachedExport {
            path: export.path.clone(),
            modified: export.modified,
            inventory: Arc::clone(&inventory),
            loaded_at: now,
        });
        Ok(inventory)
    }

    /// Locate the newest export in `dir` and load it through the cache.
    /// `Ok(None)` when no export matches.
    pub fn load_latest(
        &mut self,
        dir: &Path,
        pattern: &str,
    ) -> Result<Option<(ExportInfo, Arc<Inventory>)>, ExportError> {
        let Some(info) = latest_export(dir, pattern)? else {
            tracing::debug!(dir = %dir.display(), pattern, "no export matches");
            return Ok(None);
        };
        let inventory = self.get_or_load(&info)?;
        Ok(Some((info, inventory)))
    }
}
