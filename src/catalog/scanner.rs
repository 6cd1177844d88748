//! Directory scanner - walks configured roots and collects video files

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::config::RootConfig;
use crate::error::ShelfError;

use super::guard::PathGuard;
use super::{sort_entries, VideoEntry};

/// Extensions (lowercase, without the dot) recognised as video files
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm"];

/// Check a filename against the supported extensions, ignoring case
pub fn is_video_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let ext = e.to_ascii_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Traversal work item.
///
/// `Leave` is pushed underneath a directory's children, so it pops only
/// after the whole subtree is done and the guard's open set always equals
/// the current root-to-frame path.
enum Frame {
    Enter { dir: PathBuf, relative: String },
    Leave(PathBuf),
}

/// Scan every configured root and return the combined, sorted entry list.
///
/// Roots that are missing or not directories are skipped with a warning.
/// Nothing below a root can fail the scan; unreadable entries and cycles are
/// logged and left out.
pub fn scan_roots(roots: &[RootConfig]) -> Vec<VideoEntry> {
    let mut videos = Vec::new();

    for root in roots {
        match std::fs::metadata(&root.path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                tracing::warn!(root = %root.name, path = ?root.path, "root is not a directory, skipping");
                continue;
            }
            Err(e) => {
                tracing::warn!(root = %root.name, path = ?root.path, error = %e, "root does not exist, skipping");
                continue;
            }
        }

        tracing::info!(root = %root.name, "scanning root");
        let found = scan_root(root);
        tracing::info!(root = %root.name, count = found.len(), "finished root");
        videos.extend(found);
    }

    sort_entries(&mut videos);
    videos
}

/// Walk a single root with an explicit stack instead of recursion.
pub fn scan_root(root: &RootConfig) -> Vec<VideoEntry> {
    let mut guard = PathGuard::new();
    let mut videos = Vec::new();
    let mut stack = vec![Frame::Enter {
        dir: root.path.clone(),
        relative: String::new(),
    }];

    while let Some(frame) = stack.pop() {
        let (dir, relative) = match frame {
            Frame::Leave(canonical) => {
                guard.leave(&canonical);
                continue;
            }
            Frame::Enter { dir, relative } => (dir, relative),
        };

        let canonical = match guard.enter(&dir) {
            Ok(c) => c,
            Err(ShelfError::CycleDetected { path }) => {
                tracing::warn!(root = %root.name, dir = ?dir, target = ?path, "directory cycle, not descending");
                continue;
            }
            Err(e) => {
                tracing::warn!(root = %root.name, error = %e, "skipping directory");
                continue;
            }
        };
        stack.push(Frame::Leave(canonical));

        let read_dir = match std::fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) => {
                tracing::warn!(root = %root.name, error = %ShelfError::unreadable(&dir, e), "cannot read directory");
                continue;
            }
        };

        for item in read_dir {
            let item = match item {
                Ok(i) => i,
                Err(e) => {
                    tracing::warn!(root = %root.name, dir = ?dir, error = %e, "cannot read directory entry");
                    continue;
                }
            };

            let file_name = item.file_name();
            let Some(name) = file_name.to_str() else {
                tracing::warn!(root = %root.name, entry = ?item.path(), "skipping non UTF-8 name");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let path = item.path();
            let child_relative = if relative.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", relative, name)
            };

            // Follows symlinks, so linked files and directories are included.
            let meta = match std::fs::metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(root = %root.name, error = %ShelfError::unreadable(&path, e), "skipping entry");
                    continue;
                }
            };

            if meta.is_dir() {
                stack.push(Frame::Enter {
                    dir: path,
                    relative: child_relative,
                });
            } else if meta.is_file() && is_video_file(name) {
                let modified_at = meta
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                tracing::debug!(root = %root.name, path = %child_relative, "found video");
                videos.push(VideoEntry {
                    name: name.to_string(),
                    relative_path: child_relative,
                    root_name: root.name.clone(),
                    root_path: root.path.clone(),
                    size_bytes: meta.len(),
                    modified_at,
                });
            }
        }
    }

    videos
}
