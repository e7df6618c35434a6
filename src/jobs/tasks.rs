/// Background task implementations
use crate::{
    context::AppContext,
    db,
    error::KlikResult,
    verification::RefreshMode,
};

/// Silent console refresh
pub async fn passive_refresh(ctx: &AppContext) -> KlikResult<usize> {
    ctx.console.refresh(RefreshMode::Silent).await
}

/// Health check - verify the database is reachable
pub async fn health_check(ctx: &AppContext) -> KlikResult<()> {
    db::test_connection(&ctx.db).await
}
