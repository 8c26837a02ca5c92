use serde::{Deserialize, Serialize};

use crate::models::resume::ParsedRecord;

/// Default `confidenceThreshold` for missing-field detection.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    pub resume_text: String,
    #[serde(default)]
    pub options: ParseOptions,
}

/// Caller-tunable extraction options. Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    pub confidence_threshold: f64,
    pub standardization_enabled: bool,
    pub extract_summary: bool,
    pub extract_languages: bool,
    pub section_priorities: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            standardization_enabled: true,
            extract_summary: true,
            extract_languages: true,
            section_priorities: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub success: bool,
    pub data: ParsedRecord,
}

impl ParseResponse {
    pub fn ok(data: ParsedRecord) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_options_use_defaults() {
        let request: ParseRequest =
            serde_json::from_str(r#"{"resumeText": "Jane Roe", "options": {}}"#).unwrap();
        assert_eq!(request.options, ParseOptions::default());
        assert_eq!(request.options.confidence_threshold, 0.3);
        assert!(request.options.standardization_enabled);
    }

    #[test]
    fn test_missing_options_use_defaults() {
        let request: ParseRequest = serde_json::from_str(r#"{"resumeText": "Jane Roe"}"#).unwrap();
        assert!(request.options.extract_summary);
        assert!(request.options.extract_languages);
        assert!(request.options.section_priorities.is_empty());
    }

    #[test]
    fn test_partial_options_override_only_given_fields() {
        let request: ParseRequest = serde_json::from_str(
            r#"{"resumeText": "x", "options": {"standardizationEnabled": false, "sectionPriorities": ["skills"]}}"#,
        )
        .unwrap();
        assert!(!request.options.standardization_enabled);
        assert_eq!(request.options.section_priorities, vec!["skills".to_string()]);
        assert_eq!(request.options.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
    }
}
