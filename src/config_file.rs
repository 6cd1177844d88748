//! Configuration file support
//!
//! Loads server configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{
    absolutize, AuthConfig, CatalogConfig, RootConfig, ServerConfig, StreamConfig, TokenConfig,
};
use crate::error::{Result, ShelfError};

/// Candidate locations tried when no path is given on the command line
pub const DEFAULT_CONFIG_PATHS: &[&str] = &["data/config.toml", "config.toml"];

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: Option<ServerSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
    /// Library roots
    #[serde(default)]
    pub roots: Vec<RootSettings>,
    /// Catalog settings
    pub catalog: Option<CatalogSettings>,
    /// Stream settings
    pub stream: Option<StreamSettings>,
    /// Authorization settings
    pub auth: Option<AuthSettings>,
    /// Favorites settings
    pub favorites: Option<FavoritesSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: Option<String>,
    /// Port to listen on
    pub port: Option<u16>,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootSettings {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    pub snapshot_path: Option<PathBuf>,
    pub persist: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSettings {
    pub chunk_size_kb: Option<usize>,
    pub cache_max_age_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub enabled: Option<bool>,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesSettings {
    pub path: PathBuf,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ShelfError::Configuration(format!("cannot read {:?}: {}", path, e)))?;
        toml::from_str(&content)
            .map_err(|e| ShelfError::Configuration(format!("cannot parse {:?}: {}", path, e)))
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ShelfError::Configuration(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Root list with relative paths resolved against the working directory
    pub fn configured_roots(&self) -> Vec<RootConfig> {
        self.roots
            .iter()
            .map(|r| RootConfig::new(r.name.clone(), absolutize(&r.path)))
            .collect()
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        let roots = self.configured_roots();
        let server = self.server;
        let catalog_defaults = CatalogConfig::default();
        let stream_defaults = StreamConfig::default();

        ServerConfig {
            host: server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(defaults.host),
            port: server.as_ref().and_then(|s| s.port).unwrap_or(defaults.port),
            cors_enabled: server
                .as_ref()
                .and_then(|s| s.cors_enabled)
                .unwrap_or(defaults.cors_enabled),
            log_level: self
                .logging
                .as_ref()
                .map(|l| l.level.clone())
                .unwrap_or(defaults.log_level),
            log_format: self
                .logging
                .and_then(|l| l.format)
                .unwrap_or(defaults.log_format),
            roots,
            catalog: CatalogConfig {
                snapshot_path: self
                    .catalog
                    .as_ref()
                    .and_then(|c| c.snapshot_path.clone())
                    .unwrap_or(catalog_defaults.snapshot_path),
                persist: self
                    .catalog
                    .and_then(|c| c.persist)
                    .unwrap_or(catalog_defaults.persist),
            },
            stream: StreamConfig {
                chunk_size_kb: self
                    .stream
                    .as_ref()
                    .and_then(|s| s.chunk_size_kb)
                    .unwrap_or(stream_defaults.chunk_size_kb),
                cache_max_age_secs: self
                    .stream
                    .and_then(|s| s.cache_max_age_secs)
                    .unwrap_or(stream_defaults.cache_max_age_secs),
            },
            auth: match self.auth {
                Some(a) => AuthConfig {
                    enabled: a.enabled.unwrap_or(true),
                    tokens: a.tokens,
                },
                None => AuthConfig::default(),
            },
            favorites_path: self
                .favorites
                .map(|f| f.path)
                .unwrap_or(defaults.favorites_path),
        }
    }
}

/// Pick the configuration file: an explicit path wins, otherwise the first
/// existing default location.
pub fn locate_config(explicit: Option<String>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(PathBuf::from(path));
    }
    DEFAULT_CONFIG_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| {
            ShelfError::Configuration(format!(
                "no configuration file found (tried {})",
                DEFAULT_CONFIG_PATHS.join(", ")
            ))
        })
}
