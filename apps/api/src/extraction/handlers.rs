//! Axum route handlers for the extraction API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::info;

use crate::errors::AppError;
use crate::models::request::{ParseRequest, ParseResponse};
use crate::state::AppState;

/// POST /api/parse
///
/// Extracts a confidence-scored record from raw resume text. Degraded
/// retry/standardize stages still return `success: true`.
pub async fn handle_parse(
    State(state): State<AppState>,
    payload: Result<Json<ParseRequest>, JsonRejection>,
) -> Result<Json<ParseResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let outcome = state
        .extractor
        .extract(&request.resume_text, &request.options)
        .await?;

    info!(
        request_id = %outcome.request_id,
        degraded = outcome.is_degraded(),
        "Parse request completed"
    );

    Ok(Json(ParseResponse::ok(outcome.record)))
}
