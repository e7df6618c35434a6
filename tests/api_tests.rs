/// HTTP surface tests
///
/// Each test builds the full router over an in-memory database and drives it
/// with `oneshot` requests.
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use klikjasa::{
    config::{ConsoleConfig, LoggingConfig, ServerConfig, ServiceConfig, StorageConfig},
    context::AppContext,
    db, server,
};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app() -> (AppContext, Router) {
    let config = ServerConfig {
        service: ServiceConfig {
            hostname: "127.0.0.1".to_string(),
            port: 0,
            version: "test".to_string(),
        },
        storage: StorageConfig {
            data_directory: "./data".into(),
            database: "./data/test.sqlite".into(),
        },
        console: ConsoleConfig {
            live_updates: false,
            ..ConsoleConfig::default()
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    };

    let pool = db::create_memory_pool().await.unwrap();
    let ctx = AppContext::with_pool(config, pool);
    ctx.console.load().await.unwrap();
    let router = server::build_router(ctx.clone());
    (ctx, router)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

async fn seed(router: &Router) -> String {
    let (status, _) = send(
        router,
        Method::PUT,
        "/profiles/user-1",
        Some(json!({"fullName": "Budi Santoso", "phone": "081234567890"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        router,
        Method::PUT,
        "/profiles/user-2",
        Some(json!({"fullName": "Siti Aminah", "phone": "085711112222"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, created) = send(
        router,
        Method::POST,
        "/verifications",
        Some(json!({"userId": "user-1", "documentUrl": "ktp/user-1.jpg"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");

    let (status, _) = send(
        router,
        Method::POST,
        "/verifications",
        Some(json!({"userId": "user-2", "documentUrl": "ktp/user-2.jpg"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    created["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_console_view_after_refresh() {
    let (_ctx, router) = test_app().await;
    seed(&router).await;

    let (status, view) = send(&router, Method::POST, "/admin/verifications/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"], "ready");
    assert_eq!(view["stats"]["total"], 2);
    assert_eq!(view["stats"]["pending"], 2);
    assert_eq!(view["stats"]["lastWeek"], 2);
    assert_eq!(view["cards"]["pending"]["percentage"], 100);
    assert_eq!(view["requests"].as_array().unwrap().len(), 2);
    assert_eq!(view["hasActiveFilters"], false);
}

#[tokio::test]
async fn test_filter_and_clear() {
    let (_ctx, router) = test_app().await;
    seed(&router).await;
    send(&router, Method::POST, "/admin/verifications/refresh", None).await;

    let (status, view) = send(
        &router,
        Method::PUT,
        "/admin/verifications/filter",
        Some(json!({"searchQuery": "BUDI", "statusFilter": "pending"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let requests = view["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["profile"]["fullName"], "Budi Santoso");
    assert_eq!(view["hasActiveFilters"], true);

    let (status, view) = send(&router, Method::POST, "/admin/verifications/filter/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["requests"].as_array().unwrap().len(), 2);

    let (status, body) = send(&router, Method::POST, "/admin/verifications/filter/clear", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    let (status, _) = send(
        &router,
        Method::PUT,
        "/admin/verifications/filter",
        Some(json!({"statusFilter": "archived"})),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_review_flow() {
    let (_ctx, router) = test_app().await;
    let id = seed(&router).await;

    let uri = format!("/admin/verifications/{}/review", id);
    let (status, reviewed) = send(
        &router,
        Method::POST,
        &uri,
        Some(json!({"decision": "approve", "reviewedBy": "admin-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["status"], "approved");
    assert_eq!(reviewed["reviewedBy"], "admin-1");

    let (status, _) = send(
        &router,
        Method::POST,
        &uri,
        Some(json!({"decision": "reject", "reviewedBy": "admin-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, view) = send(&router, Method::POST, "/admin/verifications/refresh", None).await;
    assert_eq!(view["stats"]["approved"], 1);
    assert_eq!(view["stats"]["pending"], 1);

    let (status, _) = send(
        &router,
        Method::POST,
        "/admin/verifications/missing/review",
        Some(json!({"decision": "approve", "reviewedBy": "admin-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, Method::DELETE, &format!("/admin/verifications/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_duplicate_pending_submission_conflicts() {
    let (_ctx, router) = test_app().await;
    seed(&router).await;

    let (status, _) = send(
        &router,
        Method::POST,
        "/verifications",
        Some(json!({"userId": "user-1", "documentUrl": "ktp/again.jpg"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &router,
        Method::POST,
        "/verifications",
        Some(json!({"userId": "", "documentUrl": "ktp/x.jpg"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");
}

#[tokio::test]
async fn test_monthly_chart() {
    let (_ctx, router) = test_app().await;
    seed(&router).await;
    send(&router, Method::POST, "/admin/verifications/refresh", None).await;

    let (status, buckets) = send(&router, Method::GET, "/admin/verifications/monthly", None).await;
    assert_eq!(status, StatusCode::OK);
    let buckets = buckets.as_array().unwrap();
    assert_eq!(buckets.len(), 6);
    assert_eq!(buckets[5]["count"], 2);

    let (status, _) = send(&router, Method::GET, "/admin/verifications/monthly?months=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_failure_keeps_view() {
    let (ctx, router) = test_app().await;
    seed(&router).await;
    send(&router, Method::POST, "/admin/verifications/refresh", None).await;

    ctx.db.close().await;

    let (status, body) = send(&router, Method::POST, "/admin/verifications/refresh", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "FetchFailed");

    let (status, view) = send(&router, Method::GET, "/admin/verifications", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["stats"]["total"], 2);
    assert_eq!(view["fetchFailed"], true);
}

#[tokio::test]
async fn test_health_metrics_and_fallback() {
    let (_ctx, router) = test_app().await;

    let (status, body) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = send(&router, Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, Method::GET, "/health/detailed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&router, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("verification_source_fetches_total"));

    let (status, body) = send(&router, Method::GET, "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}
