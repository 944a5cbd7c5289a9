//! # HTTP Routes
//!
//! Thin axum handlers: extract, validate ids and dates, call a service,
//! wrap the result. Every failure leaves through [`crate::error::ApiError`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  /health                     health.rs                           │
//! │  /api/fixed-assets/...       fixed_assets.rs ──► services        │
//! │  /api/deferred-revenue/...   deferred_revenue.rs ──► services    │
//! │  /api/ledger                 ledger.rs ──► store                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Query and body rejections are taken as `Result<_, Rejection>` so that
//! malformed input gets the same JSON error envelope as domain failures.

pub mod deferred_revenue;
pub mod fixed_assets;
pub mod health;
pub mod ledger;

use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};

use atlvs_core::dates::parse_instant;

use crate::error::ApiResult;
use crate::state::AppState;

/// Assembles the full route table over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .merge(fixed_assets::routes())
        .merge(deferred_revenue::routes())
        .merge(ledger::routes())
        .with_state(state)
}

/// The caller's as-of instant, or now when the parameter is absent.
///
/// This is the only place a request reads the clock for reporting.
pub(crate) fn resolve_as_of(field: &str, raw: Option<&str>) -> ApiResult<DateTime<Utc>> {
    match raw {
        Some(value) => Ok(parse_instant(field, value)?),
        None => Ok(Utc::now()),
    }
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::test_support::memory_state;

    const MISSING_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    async fn app() -> Router {
        router(memory_state().await)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn asset_body(name: &str) -> Value {
        json!({
            "name": name,
            "category": "equipment",
            "acquisition_date": "2024-01-01",
            "acquisition_cost": 12000,
            "useful_life_years": 5
        })
    }

    fn schedule_body() -> Value {
        json!({
            "client_id": "client-1",
            "total_amount": 12000,
            "start_date": "2024-01-01",
            "end_date": "2024-12-31"
        })
    }

    async fn create_schedule(app: &Router) -> String {
        let (status, body) = send(app, Method::POST, "/api/deferred-revenue", Some(schedule_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        body["schedule"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "serving");
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_create_asset_and_list() {
        let app = app().await;

        let (status, body) = send(&app, Method::POST, "/api/fixed-assets", Some(asset_body("Press"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["asset"]["asset_number"], "FA-000001");
        assert_eq!(body["asset"]["status"], "active");

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/fixed-assets/assets?as_of=2024-07-15",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["assets"].as_array().unwrap().len(), 1);
        assert_eq!(body["assets"][0]["depreciation"]["monthly"], 200.0);
        assert_eq!(body["assets"][0]["depreciation"]["accumulated"], 1200.0);
    }

    #[tokio::test]
    async fn test_create_asset_rejects_bad_input() {
        let app = app().await;

        let mut body = asset_body("Press");
        body["useful_life_years"] = json!(0);
        let (status, err) = send(&app, Method::POST, "/api/fixed-assets", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");

        let (status, err) = send(
            &app,
            Method::POST,
            "/api/fixed-assets",
            Some(json!({ "name": "Press" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_depreciation_run_claims_period_once() {
        let app = app().await;
        send(&app, Method::POST, "/api/fixed-assets", Some(asset_body("Press"))).await;

        let run = json!({ "period": "2024-06" });
        let (status, body) = send(&app, Method::POST, "/api/fixed-assets/depreciation-runs", Some(run.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["period"], "2024-06");
        assert_eq!(body["assets_depreciated"], 1);

        let (status, err) = send(&app, Method::POST, "/api/fixed-assets/depreciation-runs", Some(run)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "DUPLICATE_PERIOD");
    }

    #[tokio::test]
    async fn test_dispose_twice_is_rejected() {
        let app = app().await;
        let (_, created) = send(&app, Method::POST, "/api/fixed-assets", Some(asset_body("Press"))).await;
        let id = created["asset"]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/fixed-assets/{}/dispose", id);
        let disposal = json!({
            "disposal_date": "2024-07-15",
            "disposal_method": "sale",
            "disposal_amount": 11000
        });

        let (status, body) = send(&app, Method::POST, &uri, Some(disposal.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        // Book value 10,800 at six months; sold for 11,000.
        assert_eq!(body["gain_loss"], 200.0);

        let (status, err) = send(&app, Method::POST, &uri, Some(disposal)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["code"], "INVALID_STATUS");

        let (_, report) = send(&app, Method::GET, "/api/fixed-assets/disposals", None).await;
        assert_eq!(report["disposals"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let app = app().await;

        let uri = format!("/api/fixed-assets/{}/depreciation", MISSING_ID);
        let (status, err) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["code"], "NOT_FOUND");

        let (status, _) = send(&app, Method::GET, "/api/fixed-assets/not-a-uuid/depreciation", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/api/deferred-revenue/{}", MISSING_ID);
        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_query_parameters() {
        let app = app().await;

        let (status, err) = send(&app, Method::GET, "/api/deferred-revenue/pending?as_of_date=yesterday", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");

        let (status, _) = send(&app, Method::GET, "/api/fixed-assets/schedule?period=2024-13", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/api/deferred-revenue/forecast?months=61", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/api/deferred-revenue/forecast?months=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recognition_over_remaining_reports_figures() {
        let app = app().await;
        let id = create_schedule(&app).await;
        let uri = format!("/api/deferred-revenue/{}/recognitions", id);

        let (status, body) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "amount": 5000, "recognition_date": "2024-06-30" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["recognition"]["amount"], 5000.0);

        let (status, err) = send(&app, Method::POST, &uri, Some(json!({ "amount": 8000 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "EXCEEDS_REMAINING");
        assert_eq!(err["details"]["remaining"], 7000.0);
        assert_eq!(err["details"]["requested"], 8000.0);

        let detail_uri = format!("/api/deferred-revenue/{}?as_of_date=2024-07-01", id);
        let (status, detail) = send(&app, Method::GET, &detail_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["schedule"]["recognized"], 5000.0);
        assert_eq!(detail["schedule"]["remaining"], 7000.0);
        assert!(detail["schedule"]["milestones"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_schedule_refuses_recognition() {
        let app = app().await;
        let id = create_schedule(&app).await;

        let (status, body) = send(&app, Method::DELETE, &format!("/api/deferred-revenue/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["schedule"]["status"], "cancelled");

        let uri = format!("/api/deferred-revenue/{}/recognitions", id);
        let (status, err) = send(&app, Method::POST, &uri, Some(json!({ "amount": 100 }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["code"], "INVALID_STATUS");

        let (_, summary) = send(&app, Method::GET, "/api/deferred-revenue", None).await;
        assert_eq!(summary["summary"]["schedule_count"], 0);
    }

    #[tokio::test]
    async fn test_auto_recognize_with_and_without_body() {
        let app = app().await;
        create_schedule(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/deferred-revenue/auto-recognize",
            Some(json!({ "as_of_date": "2024-12-31T00:00:00Z" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recognized_count"], 1);

        // No body at all: as-of is now, the schedule has ended and is fully caught up.
        let (status, body) = send(&app, Method::POST, "/api/deferred-revenue/auto-recognize", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["recognized_count"].as_u64().unwrap() <= 1);

        let (_, ledger) = send(
            &app,
            Method::GET,
            "/api/ledger?reference_type=revenue_recognition",
            None,
        )
        .await;
        assert!(!ledger["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revenue_reports_respond() {
        let app = app().await;
        create_schedule(&app).await;

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/deferred-revenue/forecast?months=3&as_of_date=2024-10-01",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["months"], 3);
        assert_eq!(body["forecast"].as_object().unwrap().len(), 3);

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/deferred-revenue/waterfall?months=2&as_of_date=2024-02-15",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["waterfall"].as_array().unwrap().len(), 2);

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/deferred-revenue/schedules?client_id=client-1&as_of_date=2024-06-01",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["schedules"][0]["display_status"], "active");

        let (status, _) = send(
            &app,
            Method::GET,
            "/api/deferred-revenue/recognized?start_date=2024-06-01&end_date=2024-01-01",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
