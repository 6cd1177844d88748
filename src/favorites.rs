//! Per-user favorites, persisted as a JSON document keyed by user name.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, ShelfError};

/// One bookmarked video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub video_id: String,
    #[serde(default)]
    pub root_name: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    pub added_at: DateTime<Utc>,
}

type FavoriteMap = HashMap<String, Vec<Favorite>>;

/// Favorites for every user.
///
/// Mutations update the in-memory map under a short lock, then write the
/// serialized document outside it. Writers are serialized by `write_lock`
/// so an older document never overwrites a newer one. A failed write undoes
/// the in-memory change, so memory never holds state the file lacks.
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    data: Mutex<FavoriteMap>,
    write_lock: tokio::sync::Mutex<()>,
}

impl FavoritesStore {
    /// Load favorites from `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<FavoriteMap>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "favorites file is corrupt, starting empty");
                    FavoriteMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FavoriteMap::new(),
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "failed to read favorites");
                FavoriteMap::new()
            }
        };

        Self {
            path,
            data: Mutex::new(data),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn list(&self, user: &str) -> Vec<Favorite> {
        self.data.lock().get(user).cloned().unwrap_or_default()
    }

    pub fn is_favorite(&self, user: &str, video_id: &str) -> bool {
        self.data
            .lock()
            .get(user)
            .is_some_and(|list| list.iter().any(|f| f.video_id == video_id))
    }

    /// Add a favorite. Returns `false` when the video was already present.
    pub async fn add(
        &self,
        user: &str,
        video_id: &str,
        root_name: Option<String>,
        filename: Option<String>,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let document = {
            let mut data = self.data.lock();
            let list = data.entry(user.to_string()).or_default();
            if list.iter().any(|f| f.video_id == video_id) {
                return Ok(false);
            }
            list.push(Favorite {
                video_id: video_id.to_string(),
                root_name,
                filename,
                added_at: Utc::now(),
            });
            serialize(&data)
        };

        if let Err(e) = self.write(document).await {
            let mut data = self.data.lock();
            if let Some(list) = data.get_mut(user) {
                list.retain(|f| f.video_id != video_id);
                if list.is_empty() {
                    data.remove(user);
                }
            }
            tracing::warn!(user, id = video_id, error = %e, "favorite not saved, change undone");
            return Err(e);
        }
        Ok(true)
    }

    /// Remove a favorite. Returns whether anything was removed.
    pub async fn remove(&self, user: &str, video_id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let (index, removed, document) = {
            let mut data = self.data.lock();
            let Some(list) = data.get_mut(user) else {
                return Ok(false);
            };
            let Some(index) = list.iter().position(|f| f.video_id == video_id) else {
                return Ok(false);
            };
            let removed = list.remove(index);
            (index, removed, serialize(&data))
        };

        if let Err(e) = self.write(document).await {
            let mut data = self.data.lock();
            let list = data.entry(user.to_string()).or_default();
            list.insert(index.min(list.len()), removed);
            tracing::warn!(user, id = video_id, error = %e, "favorite removal not saved, change undone");
            return Err(e);
        }
        Ok(true)
    }

    async fn write(&self, document: Result<String>) -> Result<()> {
        persist(&self.path, document?).await
    }
}

fn serialize(data: &FavoriteMap) -> Result<String> {
    serde_json::to_string_pretty(data).map_err(|e| ShelfError::Snapshot(e.to_string()))
}

async fn persist(path: &Path, document: String) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, document).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
