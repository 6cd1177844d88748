//! Content identity
//!
//! Every catalog entry gets an opaque identifier derived only from its
//! `(root name, relative path)` pair: the first 16 hex characters of
//! SHA-256 over `"<root>:<relative path>"`. The same pair always yields the
//! same identifier, across scans and restarts, so bookmarks and deep links
//! keep working.
//!
//! The reverse map is a cache that can be rebuilt from any catalog at any
//! time; it is never the source of truth.

use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::catalog::Catalog;

/// Identifier length in hex characters
pub const IDENTIFIER_LEN: usize = 16;

/// The pair an identifier stands for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityKey {
    pub root_name: String,
    pub relative_path: String,
}

impl IdentityKey {
    pub fn new(root_name: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            relative_path: relative_path.into(),
        }
    }
}

/// Derive the identifier for a pair. Pure; no time or randomness involved.
pub fn derive_identifier(root_name: &str, relative_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(root_name.as_bytes());
    hasher.update(b":");
    hasher.update(relative_path.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..IDENTIFIER_LEN].to_string()
}

/// Quick shape check so obviously bogus identifiers skip the map lookup
pub fn is_well_formed(identifier: &str) -> bool {
    identifier.len() == IDENTIFIER_LEN
        && identifier
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Identifier -> pair lookup, safe for concurrent readers and writers
#[derive(Debug, Default)]
pub struct IdentityIndex {
    entries: DashMap<String, IdentityKey>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier for a pair, registering it for reverse lookup.
    ///
    /// Concurrent registrations of the same pair insert the same value, so a
    /// plain insert-if-absent is enough.
    pub fn identity_for(&self, root_name: &str, relative_path: &str) -> String {
        let id = derive_identifier(root_name, relative_path);
        if !self.entries.contains_key(&id) {
            self.entries
                .entry(id.clone())
                .or_insert_with(|| IdentityKey::new(root_name, relative_path));
        }
        id
    }

    /// Pair for an identifier. Unknown identifiers are an ordinary outcome
    /// (stale links, guessing) and are not logged as errors.
    pub fn resolve(&self, identifier: &str) -> Option<IdentityKey> {
        if !is_well_formed(identifier) {
            tracing::debug!(id = %identifier, "malformed identifier");
            return None;
        }
        let found = self.entries.get(identifier).map(|r| r.value().clone());
        if found.is_none() {
            tracing::debug!(id = %identifier, "unknown identifier");
        }
        found
    }

    /// Register every entry of a catalog so `resolve` works before any
    /// client asked for an identifier. Existing registrations are kept.
    pub fn reindex(&self, catalog: &Catalog) -> usize {
        for video in &catalog.videos {
            self.identity_for(&video.root_name, &video.relative_path);
        }
        tracing::debug!(count = catalog.len(), indexed = self.entries.len(), "identity index rebuilt");
        catalog.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
