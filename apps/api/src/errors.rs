use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::{ExtractionError, UnavailableReason};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request body could not be read as a parse request.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
            AppError::Extraction(e) => {
                let status = match e {
                    ExtractionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    ExtractionError::OracleUnavailable { reason, .. } => match reason {
                        UnavailableReason::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                        UnavailableReason::Timeout => StatusCode::GATEWAY_TIMEOUT,
                        UnavailableReason::Unauthorized | UnavailableReason::Transport => {
                            StatusCode::SERVICE_UNAVAILABLE
                        }
                    },
                    ExtractionError::OracleEmptyResponse
                    | ExtractionError::OracleMalformedResponse(_) => StatusCode::BAD_GATEWAY,
                    ExtractionError::AggregationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(code = e.code(), "Extraction error: {e}");
                }
                (status, e.code(), e.user_message())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let mut error = json!({
            "message": message,
            "code": code,
        });
        if let AppError::Validation(detail) = &self {
            error["details"] = json!({ "body": detail });
        }

        let body = Json(json!({
            "success": false,
            "error": error
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                ExtractionError::InvalidInput("short".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ExtractionError::from(LlmError::RateLimited { retries: 3 }).into(),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                ExtractionError::from(LlmError::Api { status: 401, message: "k".into() }).into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ExtractionError::from(LlmError::Timeout(std::time::Duration::from_secs(1))).into(),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (ExtractionError::OracleEmptyResponse.into(), StatusCode::BAD_GATEWAY),
            (
                ExtractionError::AggregationFailure(
                    crate::extraction::aggregation::AggregationError::NonFiniteConfidence,
                )
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_failure_envelope_shape() {
        let response = AppError::Extraction(ExtractionError::OracleEmptyResponse).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "ORACLE_EMPTY_RESPONSE");
        assert!(body["error"]["message"].is_string());
        assert!(body["error"].get("details").is_none());
    }
}
