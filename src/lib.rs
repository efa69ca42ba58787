//! Runtime configuration service.
//!
//! Serves the application's configuration over HTTP and applies gated,
//! validated partial updates that are persisted to a settings file.

pub mod api;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::schema::ServiceConfig;
pub use http::ConfigServer;
pub use lifecycle::Shutdown;
pub use store::ConfigStore;
