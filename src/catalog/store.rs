//! Catalog store
//!
//! Holds the current catalog behind an `Arc` that is swapped wholesale, plus
//! the flag that keeps scans from overlapping.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::Catalog;

/// Scan state reported to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatus {
    pub scanning: bool,
    pub video_count: usize,
    pub last_scan_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct CatalogStore {
    current: RwLock<Arc<Catalog>>,
    scanning: Arc<AtomicBool>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current catalog. Readers keep their `Arc` for as long as they need it;
    /// a concurrent swap never changes what they see.
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current.read().clone()
    }

    /// Replace the catalog and return the new one.
    pub fn install(&self, catalog: Catalog) -> Arc<Catalog> {
        let catalog = Arc::new(catalog);
        *self.current.write() = catalog.clone();
        catalog
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Claim the scan slot. Returns `None` if a scan is already running.
    pub fn try_begin_scan(&self) -> Option<ScanPermit> {
        self.scanning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| ScanPermit {
                flag: self.scanning.clone(),
            })
    }

    /// Publish a finished scan. The slot is released only after the new
    /// catalog is visible.
    pub fn publish(&self, permit: ScanPermit, catalog: Catalog) -> Arc<Catalog> {
        let catalog = self.install(catalog);
        drop(permit);
        catalog
    }

    pub fn status(&self) -> ScanStatus {
        let catalog = self.snapshot();
        ScanStatus {
            scanning: self.is_scanning(),
            video_count: catalog.len(),
            last_scan_at: catalog.last_scan_at,
        }
    }
}

/// Exclusive right to run a scan. Owned, so it can move into the task that
/// does the walk. The slot is released on drop, including when that task
/// panics.
#[derive(Debug)]
pub struct ScanPermit {
    flag: Arc<AtomicBool>,
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
