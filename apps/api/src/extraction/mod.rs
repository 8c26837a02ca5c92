// Resume extraction pipeline.
// Implements: schema shaping, oracle orchestration, normalization, aggregation.
// All LLM calls go through llm_client; no direct Anthropic calls here.

pub mod aggregation;
pub mod dates;
pub mod handlers;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;
pub mod resume_schema;
pub mod schema;

use std::fmt;

use thiserror::Error;

use crate::extraction::aggregation::AggregationError;
use crate::extraction::normalizer::NormalizeError;
use crate::llm_client::LlmError;

/// Why the oracle could not be reached or refused to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    RateLimited,
    Unauthorized,
    Timeout,
    Transport,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnavailableReason::RateLimited => "rate limited",
            UnavailableReason::Unauthorized => "unauthorized",
            UnavailableReason::Timeout => "timed out",
            UnavailableReason::Transport => "transport failure",
        };
        f.write_str(s)
    }
}

/// Pipeline-level failure. Only the initial extraction and input validation
/// surface these to the caller; later stages degrade instead.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Extraction oracle unavailable ({reason}): {detail}")]
    OracleUnavailable {
        reason: UnavailableReason,
        detail: String,
    },

    #[error("Extraction oracle returned no content")]
    OracleEmptyResponse,

    #[error("Extraction oracle returned malformed data: {0}")]
    OracleMalformedResponse(String),

    #[error("Aggregation failed: {0}")]
    AggregationFailure(#[from] AggregationError),
}

impl ExtractionError {
    /// Stable machine-readable code for the failure envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ExtractionError::InvalidInput(_) => "INVALID_INPUT",
            ExtractionError::OracleUnavailable { reason, .. } => match reason {
                UnavailableReason::RateLimited => "ORACLE_RATE_LIMITED",
                UnavailableReason::Unauthorized => "ORACLE_AUTH_FAILED",
                UnavailableReason::Timeout => "ORACLE_TIMEOUT",
                UnavailableReason::Transport => "ORACLE_UNAVAILABLE",
            },
            ExtractionError::OracleEmptyResponse => "ORACLE_EMPTY_RESPONSE",
            ExtractionError::OracleMalformedResponse(_) => "ORACLE_MALFORMED_RESPONSE",
            ExtractionError::AggregationFailure(_) => "AGGREGATION_FAILED",
        }
    }

    /// Message safe to show an end user. Upstream details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            ExtractionError::InvalidInput(msg) => msg.clone(),
            ExtractionError::OracleUnavailable { reason, .. } => match reason {
                UnavailableReason::RateLimited => {
                    "The extraction service is rate limited. Please try again shortly.".to_string()
                }
                UnavailableReason::Unauthorized => {
                    "The extraction service rejected our credentials.".to_string()
                }
                UnavailableReason::Timeout => {
                    "The extraction service did not respond in time.".to_string()
                }
                UnavailableReason::Transport => {
                    "The extraction service is currently unavailable.".to_string()
                }
            },
            ExtractionError::OracleEmptyResponse => {
                "The extraction service returned an empty result.".to_string()
            }
            ExtractionError::OracleMalformedResponse(_) => {
                "The extraction service returned data that could not be read.".to_string()
            }
            ExtractionError::AggregationFailure(_) => {
                "Failed to post-process the extracted resume.".to_string()
            }
        }
    }
}

impl From<LlmError> for ExtractionError {
    fn from(e: LlmError) -> Self {
        let unavailable = |reason| ExtractionError::OracleUnavailable {
            reason,
            detail: e.to_string(),
        };
        match &e {
            LlmError::Http(inner) if inner.is_timeout() => unavailable(UnavailableReason::Timeout),
            LlmError::Http(_) => unavailable(UnavailableReason::Transport),
            LlmError::Api { status: 429, .. } | LlmError::RateLimited { .. } => {
                unavailable(UnavailableReason::RateLimited)
            }
            LlmError::Api {
                status: 401 | 403, ..
            } => unavailable(UnavailableReason::Unauthorized),
            LlmError::Api { .. } => unavailable(UnavailableReason::Transport),
            LlmError::Timeout(_) => unavailable(UnavailableReason::Timeout),
            LlmError::EmptyContent => ExtractionError::OracleEmptyResponse,
            LlmError::Parse(inner) => ExtractionError::OracleMalformedResponse(inner.to_string()),
        }
    }
}

impl From<NormalizeError> for ExtractionError {
    fn from(e: NormalizeError) -> Self {
        ExtractionError::OracleMalformedResponse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_llm_errors_map_to_distinct_codes() {
        let cases = [
            (LlmError::RateLimited { retries: 3 }, "ORACLE_RATE_LIMITED"),
            (
                LlmError::Api { status: 429, message: "slow down".into() },
                "ORACLE_RATE_LIMITED",
            ),
            (
                LlmError::Api { status: 401, message: "bad key".into() },
                "ORACLE_AUTH_FAILED",
            ),
            (
                LlmError::Api { status: 403, message: "forbidden".into() },
                "ORACLE_AUTH_FAILED",
            ),
            (
                LlmError::Api { status: 500, message: "boom".into() },
                "ORACLE_UNAVAILABLE",
            ),
            (LlmError::Timeout(Duration::from_secs(60)), "ORACLE_TIMEOUT"),
            (LlmError::EmptyContent, "ORACLE_EMPTY_RESPONSE"),
        ];
        for (llm, code) in cases {
            assert_eq!(ExtractionError::from(llm).code(), code);
        }
    }

    #[test]
    fn test_parse_error_is_malformed() {
        let parse = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = ExtractionError::from(LlmError::Parse(parse));
        assert_eq!(err.code(), "ORACLE_MALFORMED_RESPONSE");
    }

    #[test]
    fn test_user_message_hides_upstream_detail() {
        let err = ExtractionError::from(LlmError::Api {
            status: 401,
            message: "invalid x-api-key sk-secret".into(),
        });
        assert!(!err.user_message().contains("sk-secret"));
        assert!(err.to_string().contains("unauthorized"));
    }
}
