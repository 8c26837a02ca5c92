/// LLM Client: the single point of entry for all Claude API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// The extraction pipeline only sees the `ExtractionOracle` trait; `LlmClient`
/// is its production implementation.
///
/// Model: claude-sonnet-4-5 (hardcoded, do not make configurable)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(test)]
pub mod mock;
pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 8192;
const MAX_RETRIES: u32 = 3;
/// Low temperature keeps repeated extractions of the same resume stable.
const TEMPERATURE: f32 = 0.1;
/// Name of the forced tool whose input carries the structured result.
const RESULT_TOOL: &str = "record_resume";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),
}

// ────────────────────────────────────────────────────────────────────────────
// Oracle seam
// ────────────────────────────────────────────────────────────────────────────

/// The three kinds of oracle call the pipeline makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Extract,
    Validate,
    Confidence,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Extract => "extract",
            Operation::Validate => "validate",
            Operation::Confidence => "confidence",
        }
    }
}

/// Everything one oracle call needs.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub operation: Operation,
    pub system: String,
    pub prompt: String,
    /// Oracle-safe JSON Schema the result must follow.
    pub schema: std::sync::Arc<Value>,
}

/// Turns a prompt plus schema into one JSON object, or fails.
///
/// Implementations are not trusted to honour the schema; callers validate.
#[async_trait]
pub trait ExtractionOracle: Send + Sync {
    async fn complete_json(&self, request: &OracleRequest) -> Result<Value, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Anthropic wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    tools: Vec<AnthropicTool<'a>>,
    tool_choice: ToolChoice<'a>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    choice_type: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
    pub input: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }

    /// Input of the first tool call, if the model made one.
    pub fn tool_input(&self) -> Option<&Value> {
        self.content
            .iter()
            .find(|b| b.block_type == "tool_use")
            .and_then(|b| b.input.as_ref())
    }

    /// The structured result: the tool input, or else JSON in a text block.
    pub fn into_json(self) -> Result<Value, LlmError> {
        if let Some(input) = self.tool_input() {
            return Ok(input.clone());
        }
        let text = self.text().map(strip_json_fences).unwrap_or_default();
        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single LLM client. Wraps the Anthropic Messages API with retry logic
/// and schema-forced structured output.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()?,
            api_key,
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, request: &OracleRequest) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system: &request.system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
            tools: vec![AnthropicTool {
                name: RESULT_TOOL,
                description: "Record the structured resume data.",
                input_schema: &request.schema,
            }],
            tool_choice: ToolChoice {
                choice_type: "tool",
                name: RESULT_TOOL,
            },
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    operation = request.operation.as_str(),
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(if status.as_u16() == 429 {
                    LlmError::RateLimited { retries: attempt + 1 }
                } else {
                    LlmError::Api {
                        status: status.as_u16(),
                        message: body,
                    }
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                operation = request.operation.as_str(),
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens,
                llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ExtractionOracle for LlmClient {
    async fn complete_json(&self, request: &OracleRequest) -> Result<Value, LlmError> {
        self.call(request).await?.into_json()
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(content: Value) -> LlmResponse {
        serde_json::from_value(json!({
            "content": content,
            "usage": { "input_tokens": 10, "output_tokens": 20 }
        }))
        .unwrap()
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_tool_input_is_preferred() {
        let resp = response(json!([
            { "type": "text", "text": "Here you go" },
            { "type": "tool_use", "id": "t1", "name": RESULT_TOOL, "input": { "skills": [] } }
        ]));
        assert_eq!(resp.into_json().unwrap(), json!({ "skills": [] }));
    }

    #[test]
    fn test_fenced_text_is_fallback() {
        let resp = response(json!([{ "type": "text", "text": "```json\n{\"skills\": []}\n```" }]));
        assert_eq!(resp.into_json().unwrap(), json!({ "skills": [] }));
    }

    #[test]
    fn test_no_content_is_empty() {
        assert!(matches!(response(json!([])).into_json(), Err(LlmError::EmptyContent)));
        assert!(matches!(
            response(json!([{ "type": "text", "text": "  " }])).into_json(),
            Err(LlmError::EmptyContent)
        ));
    }

    #[test]
    fn test_unparseable_text_is_parse_error() {
        let resp = response(json!([{ "type": "text", "text": "I could not read that resume." }]));
        assert!(matches!(resp.into_json(), Err(LlmError::Parse(_))));
    }

    #[test]
    fn test_request_forces_the_result_tool() {
        let schema = json!({ "type": "object" });
        let body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system: "sys",
            messages: vec![AnthropicMessage { role: "user", content: "hi" }],
            tools: vec![AnthropicTool {
                name: RESULT_TOOL,
                description: "d",
                input_schema: &schema,
            }],
            tool_choice: ToolChoice { choice_type: "tool", name: RESULT_TOOL },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["tool_choice"], json!({ "type": "tool", "name": RESULT_TOOL }));
        assert_eq!(json["tools"][0]["input_schema"], schema);
        assert!((json["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }
}
