// Cross-cutting prompt fragments shared by every oracle operation.
// Operation-specific prompts live in extraction/prompts.rs.

/// Appended to every system prompt. The schema itself travels as a tool
/// definition, so this only pins down the output discipline.
pub const STRUCTURED_OUTPUT_SYSTEM: &str = "\
    Always answer by calling the provided tool with an object that matches its schema exactly. \
    Every property must be present: use null with a confidence of 0 when the resume has no value. \
    Do NOT add properties that are not in the schema.";

/// Confidence bands used by both the extraction and the scoring prompts.
pub const CONFIDENCE_BANDS: &str = "\
- 0.9-1.0: Very high confidence (clear, unambiguous data)
- 0.7-0.9: High confidence (likely correct, but could have minor issues)
- 0.5-0.7: Medium confidence (possibly correct, but some uncertainty)
- 0.3-0.5: Low confidence (significant uncertainty)
- 0.0-0.3: Very low confidence (likely incorrect or missing data)";

/// Guard against invented data, repeated in every prompt that edits a record.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    DO NOT fabricate or assume information not present in the resume. \
    If information is missing, use null with a confidence score of 0.";

/// Joins a system prompt with the shared structured-output rules.
pub fn with_output_rules(system: &str) -> String {
    format!("{}\n\n{}", system.trim_end(), STRUCTURED_OUTPUT_SYSTEM)
}
