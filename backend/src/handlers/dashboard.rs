//! Dashboard handlers for listings, analytics and data export

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use sniffer_shared::{ValidationError, ZoneWeights};

use crate::error::AppResult;
use crate::services::dashboard::{DashboardKind, DashboardService};
use crate::AppState;

#[derive(Deserialize)]
pub struct DashboardQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub format: Option<String>, // "json" or "csv"
}

fn service(state: &AppState) -> DashboardService {
    DashboardService::new(
        state.scans.clone(),
        state.feedback.clone(),
        state.config.scoring.dashboard_limit,
    )
}

/// Get a dashboard listing or the analytics document
pub async fn get_dashboard(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(query) = query?;
    let kind: DashboardKind = query
        .kind
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ValidationError::new("type", "Type parameter required"))?
        .parse()?;

    let data = service(&state).fetch(kind).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = DashboardService::export_to_csv(&data)?;
        let disposition = format!("attachment; filename=\"{}.csv\"", kind.name());
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(data).into_response())
    }
}

/// Get the learned weights of one zone
pub async fn get_zone_weights(
    State(state): State<AppState>,
    Path(zone_hash): Path<String>,
) -> AppResult<Json<ZoneWeights>> {
    let weights = service(&state).zone_weights(&zone_hash).await?;
    Ok(Json(weights))
}
