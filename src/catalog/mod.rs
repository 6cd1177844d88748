//! Video catalog
//!
//! This module owns everything between the configured roots and the list
//! clients browse:
//! - Path safety guard (symlink resolution, ancestor cycle detection)
//! - Directory scanner producing `VideoEntry` records
//! - Catalog store with copy-on-write swaps and a single-scan gate
//! - JSON snapshot persistence

pub mod guard;
pub mod scanner;
pub mod snapshot;
pub mod store;

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::path::PathBuf;

pub use scanner::scan_roots;
pub use store::CatalogStore;

/// One discovered video file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEntry {
    /// Base filename
    pub name: String,
    /// Path below the root, `/`-separated
    pub relative_path: String,
    /// Logical name of the root the file was found under
    pub root_name: String,
    /// Configured root location; server-side only
    pub root_path: PathBuf,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

/// A complete, immutable view of the library.
///
/// Never edited after construction; a scan builds a new one and the store
/// swaps it in.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub videos: Vec<VideoEntry>,
    pub last_scan_at: Option<DateTime<Utc>>,
}

impl Catalog {
    pub fn new(mut videos: Vec<VideoEntry>, last_scan_at: Option<DateTime<Utc>>) -> Self {
        sort_entries(&mut videos);
        Self {
            videos,
            last_scan_at,
        }
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Number of distinct roots that contributed at least one video
    pub fn root_count(&self) -> usize {
        let mut names: Vec<&str> = self.videos.iter().map(|v| v.root_name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names.len()
    }
}

/// Order entries by display name, case-folded first so `apple` and `Banana`
/// interleave the way a reader expects.
pub fn compare_entries(a: &VideoEntry, b: &VideoEntry) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.root_name.cmp(&b.root_name))
        .then_with(|| a.relative_path.cmp(&b.relative_path))
}

pub fn sort_entries(videos: &mut [VideoEntry]) {
    videos.sort_by(compare_entries);
}

/// Human-readable file size, e.g. `1.50 MB`
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    }
}
