use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use super::error::Result;
use super::loader::{load_file, LoadReport};
use super::model::VehicleTable;

/// Longest refresh interval honoured by [`DataStore`].
pub const MAX_TTL: Duration = Duration::from_secs(3600);

struct Loaded {
    table: Arc<VehicleTable>,
    report: LoadReport,
    at: Instant,
}

/// Process-wide holder of the base table.
///
/// The first call to [`DataStore::table`] reads the file; later calls hand out
/// the same `Arc` until the TTL expires. A refresh builds the complete new
/// table before swapping it in, so readers never see a partial load.
pub struct DataStore {
    path: PathBuf,
    /// `None` = load once, never refresh.
    ttl: Option<Duration>,
    slot: RwLock<Option<Loaded>>,
}

impl DataStore {
    pub fn new(path: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            path: path.into(),
            ttl: ttl.map(|t| t.min(MAX_TTL)),
            slot: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached base table, loading or refreshing it when needed.
    pub fn table(&self) -> Result<Arc<VehicleTable>> {
        if let Some(table) = self.fresh() {
            log::debug!("Base table cache hit for {}", self.path.display());
            return Ok(table);
        }

        let (table, report) = load_file(&self.path)?;
        let table = Arc::new(table);
        log::info!(
            "Cached base table from {} ({} vehicles)",
            self.path.display(),
            table.len()
        );

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Loaded {
            table: Arc::clone(&table),
            report,
            at: Instant::now(),
        });
        Ok(table)
    }

    /// Row accounting from the most recent successful load.
    pub fn last_report(&self) -> Option<LoadReport> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|l| l.report)
    }

    /// Drop the cached table so the next [`DataStore::table`] reloads.
    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Restart the TTL of the cached table without reloading it, so a failed
    /// refresh is retried one full interval later.
    pub fn touch(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(loaded) = slot.as_mut() {
            loaded.at = Instant::now();
        }
    }

    /// Whether a loaded table has outlived the TTL.
    pub fn is_expired(&self) -> bool {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        match (slot.as_ref(), self.ttl) {
            (Some(loaded), Some(ttl)) => loaded.at.elapsed() >= ttl,
            _ => false,
        }
    }

    fn fresh(&self) -> Option<Arc<VehicleTable>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        let loaded = slot.as_ref()?;
        match self.ttl {
            Some(ttl) if loaded.at.elapsed() >= ttl => None,
            _ => Some(Arc::clone(&loaded.table)),
        }
    }
}
