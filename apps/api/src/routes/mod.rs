pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::extraction::handlers;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/parse", post(handlers::handle_parse))
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::extraction::orchestrator::ResumeExtractor;
    use crate::extraction::prompts::PromptSet;
    use crate::extraction::resume_schema::oracle_schema;
    use crate::llm_client::mock::{Scripted, ScriptedOracle};
    use crate::llm_client::LlmError;

    const RESUME: &str = "Jane Roe\njane@x.com\nSoftware Engineer at Acme 2019-01 to 2022-01\n\
        Built billing services in Rust.";

    fn app(replies: Vec<Scripted>) -> Router {
        let oracle = Arc::new(ScriptedOracle::new(replies));
        let extractor = ResumeExtractor::new(
            oracle,
            PromptSet::default(),
            oracle_schema(),
            Duration::from_secs(5),
        );
        build_router(AppState {
            extractor: Arc::new(extractor),
        })
    }

    fn extraction() -> Value {
        let cf = |v: Value, c: f64| json!({ "value": v, "confidence": c, "standardization": null });
        json!({
            "personalInfo": {
                "name": cf(json!("Jane Roe"), 0.95),
                "email": cf(json!("jane@x.com"), 0.95)
            },
            "skills": [{ "name": cf(json!("Rust"), 0.9) }],
            "workExperience": [{
                "company": cf(json!("Acme"), 0.9),
                "title": cf(json!("Software Engineer"), 0.9),
                "dates": {
                    "startDate": cf(json!("2019-01"), 0.9),
                    "endDate": cf(json!("2022-01"), 0.9)
                }
            }],
            "overallConfidence": 0.9
        })
    }

    fn parse_request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/parse")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(vec![]), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "resume-parser-api");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_parse_success_envelope() {
        let body = json!({ "resumeText": RESUME, "options": {} }).to_string();
        let (status, body) = send(
            app(vec![Scripted::Json(extraction()), Scripted::Json(extraction())]),
            parse_request(body),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["personalInfo"]["name"]["value"], "Jane Roe");
        assert_eq!(
            body["data"]["workExperience"][0]["dates"]["durationInMonths"]["value"],
            36
        );
    }

    #[tokio::test]
    async fn test_parse_survives_standardize_failure() {
        let body = json!({ "resumeText": RESUME }).to_string();
        let (status, body) = send(
            app(vec![
                Scripted::Json(extraction()),
                Scripted::Fail(LlmError::Api {
                    status: 503,
                    message: "overloaded".into(),
                }),
            ]),
            parse_request(body),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_parse_short_text_is_invalid_input() {
        let body = json!({ "resumeText": "too short" }).to_string();
        let (status, body) = send(app(vec![]), parse_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_parse_malformed_json_is_invalid_input() {
        let (status, body) = send(app(vec![]), parse_request("{not json".to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert!(body["error"]["details"].is_object());
    }

    #[tokio::test]
    async fn test_parse_rate_limited_initial_call() {
        let body = json!({ "resumeText": RESUME }).to_string();
        let (status, body) = send(
            app(vec![Scripted::Fail(LlmError::RateLimited { retries: 3 })]),
            parse_request(body),
        )
        .await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "ORACLE_RATE_LIMITED");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found_envelope() {
        let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
        let (status, body) = send(app(vec![]), request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
