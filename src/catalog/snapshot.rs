//! Catalog snapshot persistence
//!
//! The snapshot lets a restart serve the previous catalog immediately instead
//! of waiting for a cold scan. Root locations are not stored; they are
//! re-attached from the configuration that is current at load time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::config::RootConfig;
use crate::error::{Result, ShelfError};

use super::{Catalog, VideoEntry};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotVideo {
    pub name: String,
    pub relative_path: String,
    pub root_name: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFile {
    pub videos: Vec<SnapshotVideo>,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub saved_at: DateTime<Utc>,
}

impl From<&VideoEntry> for SnapshotVideo {
    fn from(v: &VideoEntry) -> Self {
        Self {
            name: v.name.clone(),
            relative_path: v.relative_path.clone(),
            root_name: v.root_name.clone(),
            size_bytes: v.size_bytes,
            modified_at: v.modified_at,
        }
    }
}

/// Write the catalog next to `path` and rename it into place.
pub fn save(path: &Path, catalog: &Catalog) -> Result<()> {
    let file = SnapshotFile {
        videos: catalog.videos.iter().map(SnapshotVideo::from).collect(),
        last_scan_at: catalog.last_scan_at,
        saved_at: Utc::now(),
    };
    let json = serde_json::to_vec_pretty(&file).map_err(|e| ShelfError::Snapshot(e.to_string()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;

    tracing::debug!(path = ?path, count = catalog.len(), "catalog snapshot saved");
    Ok(())
}

/// Load a snapshot if one exists.
///
/// Entries whose root is no longer configured are dropped.
pub fn load(path: &Path, roots: &[RootConfig]) -> Result<Option<Catalog>> {
    let data = match std::fs::read(path) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ShelfError::unreadable(path, e)),
    };
    let file: SnapshotFile = serde_json::from_slice(&data)
        .map_err(|e| ShelfError::Snapshot(format!("{:?}: {}", path, e)))?;

    let root_paths: HashMap<&str, &Path> = roots
        .iter()
        .map(|r| (r.name.as_str(), r.path.as_path()))
        .collect();

    let total = file.videos.len();
    let videos: Vec<VideoEntry> = file
        .videos
        .into_iter()
        .filter_map(|v| {
            let root_path = root_paths.get(v.root_name.as_str())?;
            Some(VideoEntry {
                name: v.name,
                relative_path: v.relative_path,
                root_name: v.root_name,
                root_path: root_path.to_path_buf(),
                size_bytes: v.size_bytes,
                modified_at: v.modified_at,
            })
        })
        .collect();

    if videos.len() < total {
        tracing::warn!(
            dropped = total - videos.len(),
            "snapshot entries refer to roots that are no longer configured"
        );
    }

    Ok(Some(Catalog::new(videos, file.last_scan_at)))
}
