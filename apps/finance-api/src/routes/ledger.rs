//! Read-only view of posted ledger lines.
//!
//! `GET /api/ledger?reference_type&reference_id`

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use atlvs_core::{LedgerEntry, ReferenceType};
use atlvs_db::LedgerFilter;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/ledger", get(entries))
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub entries: Vec<LedgerEntry>,
}

async fn entries(
    State(state): State<AppState>,
    query: Result<Query<LedgerQuery>, QueryRejection>,
) -> ApiResult<Json<LedgerResponse>> {
    let Query(query) = query?;
    let filter = LedgerFilter {
        reference_type: query.reference_type,
        reference_id: query.reference_id,
    };
    let entries = state.store.ledger_entries(&filter).await?;
    Ok(Json(LedgerResponse { entries }))
}
