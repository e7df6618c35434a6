/// Verification console endpoints
use crate::{
    context::AppContext,
    error::{KlikError, KlikResult},
    verification::{
        ConsoleView, FilterState, MonthlyBucket, RefreshMode, ReviewDecision, VerificationRequest,
    },
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

/// Longest chart range served
const MAX_CHART_MONTHS: u32 = 24;

/// Build verification routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        // Admin console
        .route("/admin/verifications", get(get_console))
        .route("/admin/verifications/filter", put(set_filter))
        .route("/admin/verifications/filter/clear", post(clear_filters))
        .route("/admin/verifications/refresh", post(refresh))
        .route("/admin/verifications/monthly", get(monthly))
        .route("/admin/verifications/:id/review", post(review))
        .route("/admin/verifications/:id", delete(delete_request))
        // Submission flow
        .route("/verifications", post(submit))
        .route("/profiles/:user_id", put(upsert_profile))
}

/// Current console view
async fn get_console(State(ctx): State<AppContext>) -> Json<ConsoleView> {
    Json(ctx.console.view().await)
}

/// Replace the filter state
async fn set_filter(
    State(ctx): State<AppContext>,
    Json(filter): Json<FilterState>,
) -> Json<ConsoleView> {
    let mut console = ctx.console.write().await;
    console.set_filter(filter);
    Json(console.view())
}

/// Reset filters to defaults
async fn clear_filters(State(ctx): State<AppContext>) -> KlikResult<Json<ConsoleView>> {
    let mut console = ctx.console.write().await;
    if !console.clear_filters() {
        return Err(KlikError::Conflict("No active filters".to_string()));
    }
    Ok(Json(console.view()))
}

/// Manual refresh; the view keeps its previous data when the fetch fails
async fn refresh(State(ctx): State<AppContext>) -> KlikResult<Json<ConsoleView>> {
    ctx.console.refresh(RefreshMode::Manual).await?;
    Ok(Json(ctx.console.view().await))
}

#[derive(Debug, Deserialize)]
struct MonthlyQuery {
    months: Option<u32>,
}

/// Submissions per month for the chart
async fn monthly(
    State(ctx): State<AppContext>,
    Query(query): Query<MonthlyQuery>,
) -> KlikResult<Json<Vec<MonthlyBucket>>> {
    let months = query.months.unwrap_or(ctx.config.console.chart_months);
    if months == 0 || months > MAX_CHART_MONTHS {
        return Err(KlikError::Validation(format!(
            "months must be between 1 and {}",
            MAX_CHART_MONTHS
        )));
    }

    Ok(Json(ctx.console.read().await.monthly(months, Utc::now())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewRequest {
    decision: ReviewDecision,
    reviewed_by: String,
}

/// Approve or reject a pending request
async fn review(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> KlikResult<Json<VerificationRequest>> {
    let reviewed = ctx.store.review(&id, req.decision, &req.reviewed_by).await?;
    Ok(Json(reviewed))
}

/// Remove a request
async fn delete_request(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> KlikResult<StatusCode> {
    ctx.store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    user_id: String,
    document_url: String,
}

/// Submit a verification request
async fn submit(
    State(ctx): State<AppContext>,
    Json(req): Json<SubmitRequest>,
) -> KlikResult<(StatusCode, Json<VerificationRequest>)> {
    match ctx.store.submit(&req.user_id, &req.document_url).await? {
        Some(created) => Ok((StatusCode::CREATED, Json(created))),
        None => Err(KlikError::Conflict(format!(
            "User {} already has a pending verification",
            req.user_id.trim()
        ))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRequest {
    full_name: Option<String>,
    phone: Option<String>,
}

/// Insert or replace a user's profile
async fn upsert_profile(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
    Json(req): Json<ProfileRequest>,
) -> KlikResult<StatusCode> {
    ctx.store
        .upsert_profile(&user_id, req.full_name.as_deref(), req.phone.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
