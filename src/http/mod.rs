//! HTTP server module
//!
//! - Axum router and CORS
//! - JSON handlers for catalog, scan status and favorites
//! - Range-aware stream and download endpoints
//! - Request logging and authorization middleware

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod streams;

pub use routes::create_router;
