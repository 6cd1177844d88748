//! Range-aware file streaming
//!
//! - Identifier -> on-disk file resolution, confined to the owning root
//! - `Range: bytes=` parsing and validation
//! - Bounded-buffer streaming bodies for inline playback and downloads

pub mod range;
pub mod response;

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::config::RootConfig;
use crate::error::{Result, ShelfError};
use crate::identity::{IdentityIndex, IdentityKey};

pub use range::parse_range;
pub use response::{download, stream, Delivery};

/// Content type used when the extension is unknown
pub const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Map a filename to its video content type
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// A resolved, existing file ready to be streamed
#[derive(Debug, Clone)]
pub struct StreamTarget {
    pub key: IdentityKey,
    pub path: PathBuf,
    pub filename: String,
    pub content_type: &'static str,
}

/// Client-facing description of an identifier
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub root_name: String,
    pub relative_path: String,
    pub filename: String,
    pub content_type: &'static str,
}

impl From<&StreamTarget> for TargetInfo {
    fn from(t: &StreamTarget) -> Self {
        Self {
            root_name: t.key.root_name.clone(),
            relative_path: t.key.relative_path.clone(),
            filename: t.filename.clone(),
            content_type: t.content_type,
        }
    }
}

/// Join a catalog-relative path onto its root, refusing anything that could
/// leave the root (`..`, absolute paths, prefixes). Relative paths come from
/// the scanner, so a rejection means the catalog is corrupt.
pub fn confined_join(root: &Path, relative_path: &str) -> Option<PathBuf> {
    let relative = Path::new(relative_path);
    let mut components = relative.components().peekable();
    components.peek()?;
    if components.all(|c| matches!(c, Component::Normal(_))) {
        Some(root.join(relative))
    } else {
        None
    }
}

/// Resolve an identifier to an existing file.
///
/// `NotFound` covers unknown identifiers and files that disappeared since the
/// last scan; `ConfigMissing` means the owning root was removed from the
/// configuration.
pub async fn prepare(
    identity: &IdentityIndex,
    roots: &[RootConfig],
    identifier: &str,
) -> Result<StreamTarget> {
    let key = identity
        .resolve(identifier)
        .ok_or_else(|| ShelfError::NotFound(format!("video {}", identifier)))?;

    let root = roots
        .iter()
        .find(|r| r.name == key.root_name)
        .ok_or_else(|| ShelfError::ConfigMissing(key.root_name.clone()))?;

    let path = confined_join(&root.path, &key.relative_path).ok_or_else(|| {
        tracing::warn!(id = %identifier, root = %key.root_name, path = %key.relative_path, "relative path escapes its root");
        ShelfError::NotFound(format!("video {}", identifier))
    })?;

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            tracing::debug!(id = %identifier, path = ?path, "file no longer on disk");
            return Err(ShelfError::NotFound(format!("video {}", identifier)));
        }
    }

    let filename = key
        .relative_path
        .rsplit('/')
        .next()
        .unwrap_or(&key.relative_path)
        .to_string();
    let content_type = content_type_for(&filename);

    Ok(StreamTarget {
        key,
        path,
        filename,
        content_type,
    })
}
