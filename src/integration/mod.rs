//! Integration testing module
//!
//! End-to-end tests against the full router:
//! - Scanning and catalog listing
//! - Identifier resolution and stability
//! - Range, full and download responses
//! - Access gate and favorites

pub mod e2e;
pub mod fixtures;
