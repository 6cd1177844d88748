//! Application state
//!
//! One `AppState` lives for the whole process and is shared by every
//! request handler through `Arc`:
//! - Configured roots (replaced on reload)
//! - Catalog store and identity index
//! - Favorites, access gate, metrics

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::{gate_from_config, AccessGate};
use crate::catalog::store::ScanPermit;
use crate::catalog::{scan_roots, snapshot, Catalog, CatalogStore};
use crate::config::{validate_roots, RootConfig, ServerConfig};
use crate::config_file::ConfigFile;
use crate::error::{Result, ShelfError};
use crate::favorites::FavoritesStore;
use crate::identity::IdentityIndex;
use crate::metrics::Metrics;

/// Result of a scan trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    /// False when another scan was already running
    pub started: bool,
    /// Videos in the catalog after the call
    pub count: usize,
}

#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    /// File the configuration was read from; reload reads it again
    pub config_path: Option<PathBuf>,
    roots: RwLock<Arc<Vec<RootConfig>>>,
    pub catalog: CatalogStore,
    pub identity: IdentityIndex,
    pub favorites: FavoritesStore,
    pub gate: Box<dyn AccessGate>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: ServerConfig, config_path: Option<PathBuf>) -> Self {
        let gate = gate_from_config(&config.auth);
        Self::with_gate(config, config_path, gate)
    }

    pub fn with_gate(
        config: ServerConfig,
        config_path: Option<PathBuf>,
        gate: Box<dyn AccessGate>,
    ) -> Self {
        Self {
            roots: RwLock::new(Arc::new(config.roots.clone())),
            favorites: FavoritesStore::open(&config.favorites_path),
            catalog: CatalogStore::new(),
            identity: IdentityIndex::new(),
            metrics: Metrics::new(),
            gate,
            config_path,
            config,
        }
    }

    /// Currently configured roots
    pub fn roots(&self) -> Arc<Vec<RootConfig>> {
        self.roots.read().clone()
    }

    /// Walk every root and publish the result.
    ///
    /// If a scan is already running this returns at once with the current
    /// count and `started: false`. The scan itself runs on its own task, so
    /// a caller that goes away (client disconnect) does not cancel it.
    pub async fn rescan(self: &Arc<Self>) -> Result<ScanOutcome> {
        let Some(permit) = self.catalog.try_begin_scan() else {
            self.metrics.record_scan_rejected();
            let count = self.catalog.snapshot().len();
            tracing::info!(count, "scan already in progress, request ignored");
            return Ok(ScanOutcome {
                started: false,
                count,
            });
        };

        let state = Arc::clone(self);
        tokio::spawn(async move { state.run_scan(permit).await })
            .await
            .map_err(|e| ShelfError::Io(std::io::Error::other(e)))?
    }

    async fn run_scan(&self, permit: ScanPermit) -> Result<ScanOutcome> {
        let roots = self.roots();
        tracing::info!(roots = roots.len(), "scan started");
        let videos = tokio::task::spawn_blocking(move || scan_roots(&roots))
            .await
            .map_err(|e| ShelfError::Io(std::io::Error::other(e)))?;

        let catalog = Catalog::new(videos, Some(Utc::now()));
        self.identity.reindex(&catalog);
        let catalog = self.catalog.publish(permit, catalog);
        self.metrics.record_scan_completed();
        tracing::info!(count = catalog.len(), dirs = catalog.root_count(), "scan complete");

        if self.config.catalog.persist {
            self.save_snapshot(catalog.clone()).await;
        }

        Ok(ScanOutcome {
            started: true,
            count: catalog.len(),
        })
    }

    async fn save_snapshot(&self, catalog: Arc<Catalog>) {
        let path = self.config.catalog.snapshot_path.clone();
        let result = tokio::task::spawn_blocking(move || snapshot::save(&path, &catalog)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "failed to save catalog snapshot"),
            Err(e) => tracing::warn!(error = %e, "snapshot task failed"),
        }
    }

    /// Install the persisted catalog, if any. Returns the number of videos
    /// loaded; zero means a scan is needed.
    pub async fn load_snapshot(&self) -> usize {
        if !self.config.catalog.persist {
            return 0;
        }
        let path = self.config.catalog.snapshot_path.clone();
        let roots = self.roots();
        let loaded = tokio::task::spawn_blocking(move || snapshot::load(&path, &roots)).await;

        match loaded {
            Ok(Ok(Some(catalog))) => {
                self.identity.reindex(&catalog);
                let count = catalog.len();
                self.catalog.install(catalog);
                tracing::info!(count, "catalog loaded from snapshot");
                count
            }
            Ok(Ok(None)) => {
                tracing::info!("no catalog snapshot found");
                0
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "ignoring unusable catalog snapshot");
                0
            }
            Err(e) => {
                tracing::warn!(error = %e, "snapshot task failed");
                0
            }
        }
    }

    /// Re-read the root list from the configuration file. On any failure the
    /// previous roots stay in effect.
    pub fn reload_roots(&self) -> Result<Arc<Vec<RootConfig>>> {
        let path = self.config_path.as_ref().ok_or_else(|| {
            ShelfError::Configuration("server was started without a configuration file".to_string())
        })?;
        let roots = ConfigFile::from_file(path)?.configured_roots();
        validate_roots(&roots)?;

        let roots = Arc::new(roots);
        *self.roots.write() = roots.clone();
        tracing::info!(roots = roots.len(), "configuration reloaded");
        Ok(roots)
    }
}
