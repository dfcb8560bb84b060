//! HTTP handler for field feedback

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use sniffer_shared::{validate_feedback_input, FeedbackInput};

use crate::error::AppResult;
use crate::services::feedback::{FeedbackResponse, FeedbackService};
use crate::AppState;

/// Record whether the target was found; a storage failure still answers 200
pub async fn submit_feedback(
    State(state): State<AppState>,
    payload: Result<Json<FeedbackInput>, JsonRejection>,
) -> AppResult<Json<FeedbackResponse>> {
    let Json(input) = payload?;
    let feedback = validate_feedback_input(input)?;
    let response = FeedbackService::new(state.feedback.clone())
        .record(feedback)
        .await;
    Ok(Json(response))
}
