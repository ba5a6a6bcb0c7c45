//! HTTP API server — JSON dashboard endpoints, CSV export surface, and
//! operational probes.

pub mod rest;
pub mod server;

pub use rest::AppState;
pub use server::ApiServer;
