//! Test fixtures for integration tests
//!
//! Builds a small on-disk library in a temporary directory and an
//! `AppState` pointed at it.

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

use crate::config::{AuthConfig, CatalogConfig, RootConfig, ServerConfig, StreamConfig, TokenConfig};
use crate::http::create_router;
use crate::state::AppState;

/// Token accepted by the fixture gate
pub const TOKEN: &str = "test-token";

/// User the fixture token belongs to
pub const USER: &str = "alice";

/// Size of `movies/clip.mp4`
pub const CLIP_SIZE: usize = 1000;

/// Deterministic file contents
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// A library on disk plus the server state that serves it
pub struct Library {
    pub dir: TempDir,
    pub state: Arc<AppState>,
}

impl Library {
    /// Layout:
    ///
    /// ```text
    /// movies/clip.mp4          1000 bytes
    /// movies/nested/Other.MKV  10 bytes
    /// movies/notes.txt         ignored
    /// movies/.hidden.mp4       ignored
    /// shows/假期 video.webm    300 bytes
    /// ```
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let movies = dir.path().join("movies");
        let shows = dir.path().join("shows");
        std::fs::create_dir_all(movies.join("nested")).unwrap();
        std::fs::create_dir_all(&shows).unwrap();

        std::fs::write(movies.join("clip.mp4"), pattern(CLIP_SIZE)).unwrap();
        std::fs::write(movies.join("nested/Other.MKV"), pattern(10)).unwrap();
        std::fs::write(movies.join("notes.txt"), b"not a video").unwrap();
        std::fs::write(movies.join(".hidden.mp4"), b"hidden").unwrap();
        std::fs::write(shows.join("假期 video.webm"), pattern(300)).unwrap();

        let roots = vec![
            RootConfig::new("movies", &movies),
            RootConfig::new("shows", &shows),
        ];
        let state = Arc::new(AppState::new(Self::config(dir.path(), roots), None));
        Self { dir, state }
    }

    pub fn config(base: &Path, roots: Vec<RootConfig>) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            roots,
            catalog: CatalogConfig {
                snapshot_path: base.join("data").join("video-cache.json"),
                persist: true,
            },
            stream: StreamConfig {
                chunk_size_kb: 1,
                ..Default::default()
            },
            auth: AuthConfig {
                enabled: true,
                tokens: vec![TokenConfig {
                    token: TOKEN.to_string(),
                    user: USER.to_string(),
                }],
            },
            favorites_path: base.join("data").join("favorites.json"),
            ..Default::default()
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Scan through the state and return the number of videos found
    pub async fn scan(&self) -> usize {
        self.state.rescan().await.unwrap().count
    }

    pub fn id(&self, root: &str, relative_path: &str) -> String {
        self.state.identity.identity_for(root, relative_path)
    }

    /// Send one request through a fresh router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_range(uri: &str, range: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::RANGE, range)
        .body(Body::empty())
        .unwrap()
}

/// Request carrying the fixture bearer token
pub fn authed(method: Method, uri: &str, json: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN));
    match json {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn header_str<'a>(response: &'a Response<Body>, name: header::HeaderName) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}
