//! Request authorization
//!
//! The library itself does not issue sessions. A gate turns the credential a
//! request carries (bearer token or `sessionId` cookie) into a principal.

use axum::http::{header, HeaderMap};
use std::collections::HashMap;

use crate::config::AuthConfig;

/// Name used for every request when authorization is disabled
pub const ANONYMOUS: &str = "anonymous";

/// Cookie carrying a session credential
pub const SESSION_COOKIE: &str = "sessionId";

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user: String,
}

impl Principal {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }
}

/// Decides who a request belongs to and whether they may use gated routes.
pub trait AccessGate: Send + Sync + std::fmt::Debug {
    /// Map a credential to a principal, if it is valid.
    fn authorize(&self, credential: Option<&str>) -> Option<Principal>;

    /// Whether an already identified principal may proceed.
    fn is_authorized(&self, principal: &Principal) -> bool;
}

/// Fixed token table from the configuration file
#[derive(Debug, Default)]
pub struct StaticTokenGate {
    tokens: HashMap<String, String>,
}

impl StaticTokenGate {
    pub fn new(tokens: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }
}

impl AccessGate for StaticTokenGate {
    fn authorize(&self, credential: Option<&str>) -> Option<Principal> {
        let user = self.tokens.get(credential?)?;
        Some(Principal::new(user.clone()))
    }

    fn is_authorized(&self, principal: &Principal) -> bool {
        self.tokens.values().any(|u| *u == principal.user)
    }
}

/// Lets everyone in as `anonymous`
#[derive(Debug, Default)]
pub struct OpenGate;

impl AccessGate for OpenGate {
    fn authorize(&self, _credential: Option<&str>) -> Option<Principal> {
        Some(Principal::new(ANONYMOUS))
    }

    fn is_authorized(&self, _principal: &Principal) -> bool {
        true
    }
}

/// Build the gate described by the configuration.
pub fn gate_from_config(config: &AuthConfig) -> Box<dyn AccessGate> {
    if !config.enabled {
        tracing::warn!("authorization disabled, all requests run as {}", ANONYMOUS);
        return Box::new(OpenGate);
    }
    if config.tokens.is_empty() {
        tracing::warn!("authorization enabled but no tokens configured; gated routes will refuse every request");
    }
    Box::new(StaticTokenGate::new(
        config
            .tokens
            .iter()
            .map(|t| (t.token.clone(), t.user.clone())),
    ))
}

/// Pull the credential out of a request: `Authorization: Bearer` first, then
/// the session cookie.
pub fn credential_from(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())
}
