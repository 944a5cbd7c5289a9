//! # Fixed Asset Routes
//!
//! | Method | Path                                        | Status        |
//! |--------|---------------------------------------------|---------------|
//! | GET    | /api/fixed-assets                           | 200           |
//! | POST   | /api/fixed-assets                           | 201           |
//! | GET    | /api/fixed-assets/assets?category&as_of     | 200           |
//! | GET    | /api/fixed-assets/{id}/depreciation?as_of   | 200 / 404     |
//! | GET    | /api/fixed-assets/schedule?period&category  | 200           |
//! | GET    | /api/fixed-assets/register?as_of            | 200           |
//! | GET    | /api/fixed-assets/disposals                 | 200           |
//! | POST   | /api/fixed-assets/depreciation-runs         | 201 / 409     |
//! | POST   | /api/fixed-assets/{id}/dispose              | 201 / 404/422 |

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use atlvs_core::reporting::{DepreciationScheduleReport, FixedAssetSummary};
use atlvs_core::validation::validate_uuid;
use atlvs_core::{AccountingPeriod, AssetCategory, DisposalRequest, FixedAsset, NewFixedAsset};

use crate::error::ApiResult;
use crate::routes::resolve_as_of;
use crate::services::fixed_assets::{
    self, AssetDepreciation, AssetOverview, DisposalOutcome, DisposalReport, RegisterLine,
    RunReport,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/fixed-assets", get(summary).post(create_asset))
        .route("/api/fixed-assets/assets", get(assets))
        .route("/api/fixed-assets/schedule", get(schedule))
        .route("/api/fixed-assets/register", get(register))
        .route("/api/fixed-assets/disposals", get(disposals))
        .route("/api/fixed-assets/depreciation-runs", post(record_depreciation))
        .route("/api/fixed-assets/{id}/depreciation", get(asset_depreciation))
        .route("/api/fixed-assets/{id}/dispose", post(dispose))
}

// =============================================================================
// Request / Response Shapes
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssetsQuery {
    pub category: Option<AssetCategory>,
    pub as_of: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    /// `YYYY-MM`; the current month when absent.
    pub period: Option<String>,
    pub category: Option<AssetCategory>,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub period: AccountingPeriod,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: FixedAssetSummary,
}

#[derive(Debug, Serialize)]
pub struct AssetResponse {
    pub asset: FixedAsset,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub register: Vec<RegisterLine>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn summary(State(state): State<AppState>) -> ApiResult<Json<SummaryResponse>> {
    let summary = fixed_assets::summary(state.store.as_ref()).await?;
    Ok(Json(SummaryResponse { summary }))
}

async fn create_asset(
    State(state): State<AppState>,
    payload: Result<Json<NewFixedAsset>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AssetResponse>)> {
    let Json(input) = payload?;
    let asset = fixed_assets::create_asset(state.store.as_ref(), &input).await?;
    Ok((StatusCode::CREATED, Json(AssetResponse { asset })))
}

async fn assets(
    State(state): State<AppState>,
    query: Result<Query<AssetsQuery>, QueryRejection>,
) -> ApiResult<Json<AssetOverview>> {
    let Query(query) = query?;
    let as_of = resolve_as_of("as_of", query.as_of.as_deref())?;
    debug!(category = ?query.category, as_of = %as_of, "Listing assets");
    let overview = fixed_assets::overview(state.store.as_ref(), query.category, as_of).await?;
    Ok(Json(overview))
}

async fn asset_depreciation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<AsOfQuery>, QueryRejection>,
) -> ApiResult<Json<AssetDepreciation>> {
    validate_uuid(&id)?;
    let Query(query) = query?;
    let as_of = resolve_as_of("as_of", query.as_of.as_deref())?;
    let history = fixed_assets::asset_depreciation(state.store.as_ref(), &id, as_of).await?;
    Ok(Json(history))
}

async fn schedule(
    State(state): State<AppState>,
    query: Result<Query<ScheduleQuery>, QueryRejection>,
) -> ApiResult<Json<DepreciationScheduleReport>> {
    let Query(query) = query?;
    let period = match query.period.as_deref() {
        Some(raw) => raw.parse::<AccountingPeriod>()?,
        None => AccountingPeriod::of(Utc::now()),
    };
    let report = fixed_assets::period_schedule(state.store.as_ref(), period, query.category).await?;
    Ok(Json(report))
}

async fn register(
    State(state): State<AppState>,
    query: Result<Query<AsOfQuery>, QueryRejection>,
) -> ApiResult<Json<RegisterResponse>> {
    let Query(query) = query?;
    let as_of = resolve_as_of("as_of", query.as_of.as_deref())?;
    let register = fixed_assets::register(state.store.as_ref(), as_of).await?;
    Ok(Json(RegisterResponse { register }))
}

async fn disposals(State(state): State<AppState>) -> ApiResult<Json<DisposalReport>> {
    Ok(Json(fixed_assets::disposals(state.store.as_ref()).await?))
}

async fn record_depreciation(
    State(state): State<AppState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RunReport>)> {
    let Json(request) = payload?;
    let report = fixed_assets::record_depreciation(state.store.as_ref(), request.period).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn dispose(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<DisposalRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DisposalOutcome>)> {
    validate_uuid(&id)?;
    let Json(request) = payload?;
    let outcome = fixed_assets::dispose(state.store.as_ref(), &id, &request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
