//! HTTP API handlers for iscc-api

pub mod explain;
pub mod health;
pub mod iscc;

pub use explain::explain_routes;
pub use health::health_routes;
pub use iscc::iscc_routes;
