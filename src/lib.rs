//! KlikJasa verification console
//!
//! Identity-verification review service for the KlikJasa services
//! marketplace: request statistics, search and status filtering, and a
//! console view kept fresh from the backend's change feed.

pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod server;
pub mod verification;

pub use context::AppContext;
pub use error::{KlikError, KlikResult};
