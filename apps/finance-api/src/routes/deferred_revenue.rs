//! # Deferred Revenue Routes
//!
//! | Method | Path                                                    | Status        |
//! |--------|---------------------------------------------------------|---------------|
//! | GET    | /api/deferred-revenue                                   | 200           |
//! | POST   | /api/deferred-revenue                                   | 201           |
//! | GET    | /api/deferred-revenue/schedules?client_id&project_id... | 200           |
//! | GET    | /api/deferred-revenue/pending?as_of_date                | 200           |
//! | GET    | /api/deferred-revenue/recognized?start_date&end_date    | 200           |
//! | GET    | /api/deferred-revenue/forecast?months&as_of_date        | 200           |
//! | GET    | /api/deferred-revenue/waterfall?months&as_of_date       | 200           |
//! | POST   | /api/deferred-revenue/auto-recognize                    | 200           |
//! | GET    | /api/deferred-revenue/{id}?as_of_date                   | 200 / 404     |
//! | DELETE | /api/deferred-revenue/{id}                              | 200 / 400/422 |
//! | POST   | /api/deferred-revenue/{id}/recognitions                 | 201 / 400/422 |

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use atlvs_core::dates::parse_instant;
use atlvs_core::reporting::RevenueSummary;
use atlvs_core::validation::{validate_report_months, validate_uuid};
use atlvs_core::{
    DeferredRevenueSchedule, NewDeferredRevenueSchedule, RecognitionEvent, RecognitionRequest,
    ScheduleStatus,
};
use atlvs_db::{ScheduleDetail, ScheduleFilter};

use crate::error::ApiResult;
use crate::routes::resolve_as_of;
use crate::services::deferred_revenue::{
    self, AutoRecognitionReport, ForecastReport, PendingReport, RecognizedReport,
    ScheduleDetailView, ScheduleView, WaterfallReport,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/deferred-revenue", get(summary).post(create_schedule))
        .route("/api/deferred-revenue/schedules", get(schedules))
        .route("/api/deferred-revenue/pending", get(pending))
        .route("/api/deferred-revenue/recognized", get(recognized))
        .route("/api/deferred-revenue/forecast", get(forecast))
        .route("/api/deferred-revenue/waterfall", get(waterfall))
        .route("/api/deferred-revenue/auto-recognize", post(auto_recognize))
        .route(
            "/api/deferred-revenue/{id}",
            get(schedule_detail).delete(cancel_schedule),
        )
        .route("/api/deferred-revenue/{id}/recognitions", post(recognize))
}

// =============================================================================
// Request / Response Shapes
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AsOfDateQuery {
    pub as_of_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SchedulesQuery {
    pub client_id: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<ScheduleStatus>,
    pub as_of_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecognizedQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub as_of_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub months: Option<u32>,
    pub as_of_date: Option<String>,
}

/// Body of `POST /auto-recognize`; the whole body may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct AutoRecognizeRequest {
    pub as_of_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: RevenueSummary,
}

#[derive(Debug, Serialize)]
pub struct SchedulesResponse {
    pub schedules: Vec<ScheduleView>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse<T> {
    pub schedule: T,
}

#[derive(Debug, Serialize)]
pub struct RecognitionResponse {
    pub recognition: RecognitionEvent,
}

// =============================================================================
// Handlers
// =============================================================================

async fn summary(State(state): State<AppState>) -> ApiResult<Json<SummaryResponse>> {
    let summary = deferred_revenue::summary(state.store.as_ref()).await?;
    Ok(Json(SummaryResponse { summary }))
}

async fn create_schedule(
    State(state): State<AppState>,
    payload: Result<Json<NewDeferredRevenueSchedule>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ScheduleResponse<ScheduleDetail>>)> {
    let Json(input) = payload?;
    let schedule = deferred_revenue::create_schedule(state.store.as_ref(), &input).await?;
    Ok((StatusCode::CREATED, Json(ScheduleResponse { schedule })))
}

async fn schedules(
    State(state): State<AppState>,
    query: Result<Query<SchedulesQuery>, QueryRejection>,
) -> ApiResult<Json<SchedulesResponse>> {
    let Query(query) = query?;
    let as_of = resolve_as_of("as_of_date", query.as_of_date.as_deref())?;
    let filter = ScheduleFilter {
        client_id: query.client_id,
        project_id: query.project_id,
        status: query.status,
    };
    let schedules = deferred_revenue::schedules(state.store.as_ref(), &filter, as_of).await?;
    Ok(Json(SchedulesResponse { schedules }))
}

async fn pending(
    State(state): State<AppState>,
    query: Result<Query<AsOfDateQuery>, QueryRejection>,
) -> ApiResult<Json<PendingReport>> {
    let Query(query) = query?;
    let as_of = resolve_as_of("as_of_date", query.as_of_date.as_deref())?;
    Ok(Json(deferred_revenue::pending(state.store.as_ref(), as_of).await?))
}

async fn recognized(
    State(state): State<AppState>,
    query: Result<Query<RecognizedQuery>, QueryRejection>,
) -> ApiResult<Json<RecognizedReport>> {
    let Query(query) = query?;
    let as_of = resolve_as_of("as_of_date", query.as_of_date.as_deref())?;
    let start = query
        .start_date
        .as_deref()
        .map(|v| parse_instant("start_date", v))
        .transpose()?;
    let end = query
        .end_date
        .as_deref()
        .map(|v| parse_instant("end_date", v))
        .transpose()?;
    let report = deferred_revenue::recognized(state.store.as_ref(), start, end, as_of).await?;
    Ok(Json(report))
}

async fn forecast(
    State(state): State<AppState>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> ApiResult<Json<ForecastReport>> {
    let Query(query) = query?;
    let as_of = resolve_as_of("as_of_date", query.as_of_date.as_deref())?;
    let months = query.months.unwrap_or_else(|| state.default_report_months());
    validate_report_months(months)?;
    Ok(Json(
        deferred_revenue::forecast(state.store.as_ref(), months, as_of).await?,
    ))
}

async fn waterfall(
    State(state): State<AppState>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> ApiResult<Json<WaterfallReport>> {
    let Query(query) = query?;
    let as_of = resolve_as_of("as_of_date", query.as_of_date.as_deref())?;
    let months = query.months.unwrap_or_else(|| state.default_report_months());
    validate_report_months(months)?;
    Ok(Json(
        deferred_revenue::waterfall(state.store.as_ref(), months, as_of).await?,
    ))
}

async fn auto_recognize(
    State(state): State<AppState>,
    payload: Result<Json<AutoRecognizeRequest>, JsonRejection>,
) -> ApiResult<Json<AutoRecognitionReport>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => AutoRecognizeRequest::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    let as_of = resolve_as_of("as_of_date", request.as_of_date.as_deref())?;
    Ok(Json(
        deferred_revenue::auto_recognize(state.store.as_ref(), as_of).await?,
    ))
}

async fn schedule_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<AsOfDateQuery>, QueryRejection>,
) -> ApiResult<Json<ScheduleResponse<ScheduleDetailView>>> {
    validate_uuid(&id)?;
    let Query(query) = query?;
    let as_of = resolve_as_of("as_of_date", query.as_of_date.as_deref())?;
    let schedule = deferred_revenue::schedule_detail(state.store.as_ref(), &id, as_of).await?;
    Ok(Json(ScheduleResponse { schedule }))
}

async fn cancel_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ScheduleResponse<DeferredRevenueSchedule>>> {
    validate_uuid(&id)?;
    let schedule = deferred_revenue::cancel_schedule(state.store.as_ref(), &id).await?;
    Ok(Json(ScheduleResponse { schedule }))
}

async fn recognize(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RecognitionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RecognitionResponse>)> {
    validate_uuid(&id)?;
    let Json(request) = payload?;
    let recognition =
        deferred_revenue::recognize(state.store.as_ref(), &id, &request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(RecognitionResponse { recognition })))
}
