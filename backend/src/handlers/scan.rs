//! HTTP handlers for scan analysis

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use sniffer_shared::{validate_scan_input, ScanInput, ScanResult};

use crate::error::AppResult;
use crate::services::scan::{EnvironmentInput, EnvironmentReport, ScanService};
use crate::AppState;

/// Score a scan
pub async fn analyze_scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanInput>, JsonRejection>,
) -> AppResult<Json<ScanResult>> {
    let Json(input) = payload?;
    let request = validate_scan_input(input)?;
    let result = ScanService::new(&state).analyze(request).await?;
    Ok(Json(result))
}

/// Elevation and weather for a location
pub async fn get_environment(
    State(state): State<AppState>,
    payload: Result<Json<EnvironmentInput>, JsonRejection>,
) -> AppResult<Json<EnvironmentReport>> {
    let Json(input) = payload?;
    let report = ScanService::new(&state).environment(input).await?;
    Ok(Json(report))
}
