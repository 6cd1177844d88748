//! Server configuration

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Result, ShelfError};

/// One configured library root: a logical name and an absolute location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    /// Logical name exposed to clients
    pub name: String,

    /// Absolute filesystem path (never sent to clients)
    pub path: PathBuf,
}

impl RootConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Catalog persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Where the catalog snapshot is written after each scan
    pub snapshot_path: PathBuf,

    /// Persist and reload the catalog snapshot
    pub persist: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("data/video-cache.json"),
            persist: true,
        }
    }
}

/// Streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Read buffer size per response in kilobytes
    pub chunk_size_kb: usize,

    /// `Cache-Control` max-age for inline streams
    pub cache_max_age_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size_kb: 64,
            cache_max_age_secs: 3600,
        }
    }
}

impl StreamConfig {
    /// Get the read buffer size in bytes (never zero)
    pub fn chunk_size_bytes(&self) -> usize {
        self.chunk_size_kb.max(1) * 1024
    }
}

/// A bearer token and the user it authenticates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub token: String,
    pub user: String,
}

/// Authorization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When false every request is authorized as `anonymous`
    pub enabled: bool,

    /// Accepted credentials
    pub tokens: Vec<TokenConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tokens: Vec::new(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Library roots to scan
    pub roots: Vec<RootConfig>,

    /// Catalog persistence
    pub catalog: CatalogConfig,

    /// Streaming configuration
    pub stream: StreamConfig,

    /// Authorization configuration
    pub auth: AuthConfig,

    /// Favorites storage file
    pub favorites_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "::".to_string(),
            port: 18899,
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            roots: Vec::new(),
            catalog: CatalogConfig::default(),
            stream: StreamConfig::default(),
            auth: AuthConfig::default(),
            favorites_path: PathBuf::from("data/favorites.json"),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string. IPv6 hosts are bracketed.
    pub fn socket_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Resolve a configured path against the working directory.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Check the root list before the server starts or a reload is applied.
///
/// Names must be non-empty and unique, and at least one root must currently
/// be a directory. Roots that are merely missing are reported and kept; the
/// scanner skips them.
pub fn validate_roots(roots: &[RootConfig]) -> Result<()> {
    if roots.is_empty() {
        return Err(ShelfError::Configuration(
            "no video roots configured".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for root in roots {
        if root.name.trim().is_empty() {
            return Err(ShelfError::Configuration(format!(
                "root at {:?} has an empty name",
                root.path
            )));
        }
        // Root names are hashed as "<name>:<path>"; a colon would make two
        // different pairs produce the same identifier.
        if root.name.contains(':') {
            return Err(ShelfError::Configuration(format!(
                "root name must not contain ':': {}",
                root.name
            )));
        }
        if !names.insert(root.name.as_str()) {
            return Err(ShelfError::Configuration(format!(
                "duplicate root name: {}",
                root.name
            )));
        }
    }

    let usable = roots.iter().filter(|r| r.path.is_dir()).count();
    for root in roots.iter().filter(|r| !r.path.is_dir()) {
        tracing::warn!(root = %root.name, path = ?root.path, "configured root is not a directory");
    }
    if usable == 0 {
        return Err(ShelfError::Configuration(
            "none of the configured roots is an existing directory".to_string(),
        ));
    }

    Ok(())
}
