/// API routes and handlers
pub mod health;
pub mod verification;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(verification::routes())
}
