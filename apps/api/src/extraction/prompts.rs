//! Prompt templates for the three oracle operations.
//!
//! A `PromptSet` is built once at startup (built-in defaults, optionally
//! overridden from `PROMPTS_DIR`) and handed to the extractor. Templates use
//! `{placeholder}` markers that are replaced before sending.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::llm_client::prompts::{with_output_rules, CONFIDENCE_BANDS, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::Operation;
use crate::models::request::ParseOptions;

// ────────────────────────────────────────────────────────────────────────────
// Built-in defaults
// ────────────────────────────────────────────────────────────────────────────

const EXTRACT_SYSTEM: &str = "You are a precise resume parser that extracts structured data from resumes. \
    Always return confidence scores for each field. \
    If you're unsure about a field, provide a lower confidence score rather than making assumptions. \
    Standardize terminology where possible and indicate when standardization occurs.";

const EXTRACT_INSTRUCTIONS: &str = r#"Extract structured data from the following resume with HIGH PRECISION.

IMPORTANT GUIDELINES:
1. Confidence scores range from 0 to 1, where:
{confidence_bands}

2. Standardization notes should be provided whenever you transform or normalize the data, such as:
   - Converting abbreviations to full forms (e.g., "BS" → "Bachelor of Science")
   - Normalizing job titles (e.g., "Dev" → "Developer")
   - Standardizing technology names (e.g., "JS" → "JavaScript")
   - Date format standardization
   - If no standardization was performed, use null

3. For missing or unavailable data:
   - Use null for string fields that are missing
   - Use empty array [] for array fields that are missing
   - Use 0 as the confidence score for missing fields
   - Add the field path to missingFields (e.g., "personalInfo.website")

4. For dates:
   - Use YYYY-MM whenever possible
   - Mark current positions with current: true and a null endDate
   - Calculate durationInMonths when possible

5. For skills:
   - Infer categories when possible (e.g., "Programming Languages", "Tools", "Frameworks")
   - Infer proficiency when mentioned ("Beginner", "Intermediate", "Advanced", "Expert")
   - Detect years of experience when mentioned

6. For work experience:
   - Extract technologies used in each role when mentioned
   - Separate responsibilities from achievements when possible
   - Standardize job titles to industry norms

7. {no_fabrication}

8. overallConfidence is a weighted average of all fields, giving more weight to name, contact info, work experience and education.

9. detectedSections lists every major section found (e.g., personal_information, skills, experience, education)."#;

const VALIDATE_SYSTEM: &str = "You are a precise resume data validator. \
    You check for inconsistencies, standardize terminology, and ensure data quality. \
    Always return the full record with updated confidence scores.";

const VALIDATE_INSTRUCTIONS: &str = r#"Validate the following resume data for consistency, accuracy, and standardization.

For each field in the data:
1. Check for inconsistencies and validate format
2. Standardize terminology where appropriate:
   - Degree names (e.g., "BS" → "Bachelor of Science", "MS" → "Master of Science")
   - Job titles (e.g., "SWE" → "Software Engineer", "PM" → "Product Manager")
   - Technology names (e.g., "JS" → "JavaScript", "TS" → "TypeScript")
   - Institution names (e.g., "NYU" → "New York University")
3. Validate dates:
   - Ensure date ranges are logical (start before end)
   - Verify that duration calculations are accurate
   - Check for overlapping or inconsistent date ranges
4. Look for contradictions:
   - Skills mentioned in work experience but not in skills section
   - Technologies that don't match the responsibilities
   - Date inconsistencies between sections
5. Update confidence scores:
   - Increase confidence for validated fields
   - Decrease confidence for fields with detected issues
   - Add standardization notes when changes are made

Return the validated and standardized data in the exact same format. If you detect serious inconsistencies or potential fabrications, lower those fields' confidence and explain why in the standardization note."#;

const CONFIDENCE_SYSTEM: &str = "You are a precise confidence scoring system for resume data. \
    You analyze each field and assign confidence scores between 0 and 1.";

const CONFIDENCE_INSTRUCTIONS: &str = r#"Confidence scoring criteria by field type:

1. Personal Information:
   - Name: full name vs. partial, common formats
   - Email: valid format, standard patterns
   - Phone: valid format, country code presence
   - Location: specificity (city/state/country)
   - Social/Web: URL format and completeness

2. Skills:
   - Compare against known technology/skill names
   - Specific vs. general skills
   - Proficiency indicators and consistency with work experience

3. Work Experience:
   - Company names against known entities
   - Job title standardization
   - Date formats and calculations
   - Specific vs. vague responsibilities, quantifiable achievements
   - Technology mentions that match skills

4. Education:
   - Institution names, degree nomenclature, field of study specificity
   - Date formats and ranges, GPA format and range

5. Projects & Certifications:
   - Description specificity, URL validity
   - Technology consistency with skills, certification issuers, dates

Rate each field from 0 to 1:
{confidence_bands}

For any field with confidence below 0.7, give the specific reason in the standardization note."#;

// ────────────────────────────────────────────────────────────────────────────
// Request templates
// ────────────────────────────────────────────────────────────────────────────

const EXTRACT_TEMPLATE: &str = "{instructions}\n{directives}\nResume:\n{resume_text}";

const RETRY_TEMPLATE: &str = r#"{instructions}
{directives}
A previous extraction of this resume was incomplete. Fill these gaps if the resume supports them:
{gaps}

Keep every value from the previous attempt that is already correct, including its confidence and standardization notes.

Previous attempt:
{previous}

Resume:
{resume_text}"#;

const STANDARDIZE_TEMPLATE: &str = r#"{instructions}

{no_fabrication}

Re-score every field while you validate it.
{confidence_instructions}

Data:
{record}"#;

/// System prompt plus instruction body for one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    pub system: String,
    pub instructions: String,
}

impl PromptTemplate {
    fn builtin(system: &str, instructions: &str) -> Self {
        Self {
            system: system.to_string(),
            instructions: instructions
                .replace("{confidence_bands}", CONFIDENCE_BANDS)
                .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION),
        }
    }
}

/// Immutable prompt configuration, keyed by operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSet {
    extract: PromptTemplate,
    validate: PromptTemplate,
    confidence: PromptTemplate,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            extract: PromptTemplate::builtin(EXTRACT_SYSTEM, EXTRACT_INSTRUCTIONS),
            validate: PromptTemplate::builtin(VALIDATE_SYSTEM, VALIDATE_INSTRUCTIONS),
            confidence: PromptTemplate::builtin(CONFIDENCE_SYSTEM, CONFIDENCE_INSTRUCTIONS),
        }
    }
}

impl PromptSet {
    /// Built-in prompts, with instructions replaced by `<dir>/<operation>.txt`
    /// for every such file that exists.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut set = Self::default();
        let Some(dir) = dir else {
            return Ok(set);
        };

        for op in [Operation::Extract, Operation::Validate, Operation::Confidence] {
            let path = dir.join(format!("{}.txt", op.as_str()));
            if !path.exists() {
                continue;
            }
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prompt override {}", path.display()))?;
            if text.trim().is_empty() {
                anyhow::bail!("Prompt override {} is empty", path.display());
            }
            tracing::info!(operation = op.as_str(), path = %path.display(), "Loaded prompt override");
            set.template_mut(op).instructions = text;
        }

        Ok(set)
    }

    pub fn template(&self, op: Operation) -> &PromptTemplate {
        match op {
            Operation::Extract => &self.extract,
            Operation::Validate => &self.validate,
            Operation::Confidence => &self.confidence,
        }
    }

    fn template_mut(&mut self, op: Operation) -> &mut PromptTemplate {
        match op {
            Operation::Extract => &mut self.extract,
            Operation::Validate => &mut self.validate,
            Operation::Confidence => &mut self.confidence,
        }
    }

    /// System prompt for `op`, including the shared output rules.
    pub fn system(&self, op: Operation) -> String {
        with_output_rules(&self.template(op).system)
    }

    pub fn extract_prompt(&self, resume_text: &str, options: &ParseOptions) -> String {
        fill(
            EXTRACT_TEMPLATE,
            &[
                ("instructions", &self.extract.instructions),
                ("directives", &option_directives(options)),
                ("resume_text", resume_text),
            ],
        )
    }

    pub fn retry_prompt(
        &self,
        resume_text: &str,
        options: &ParseOptions,
        gaps: &[String],
        previous: &Value,
    ) -> String {
        let gaps = gaps
            .iter()
            .map(|g| format!("- {g}"))
            .collect::<Vec<_>>()
            .join("\n");
        let previous = serde_json::to_string_pretty(previous).unwrap_or_else(|_| previous.to_string());

        fill(
            RETRY_TEMPLATE,
            &[
                ("instructions", &self.extract.instructions),
                ("directives", &option_directives(options)),
                ("gaps", &gaps),
                ("previous", &previous),
                ("resume_text", resume_text),
            ],
        )
    }

    /// Validation and re-scoring in one pass over the current record.
    pub fn standardize_prompt(&self, record: &Value) -> String {
        fill(
            STANDARDIZE_TEMPLATE,
            &[
                ("instructions", &self.validate.instructions),
                ("no_fabrication", NO_FABRICATION_INSTRUCTION),
                ("confidence_instructions", &self.confidence.instructions),
                ("record", &record.to_string()),
            ],
        )
    }

    /// The standardization call runs under the validator's system prompt
    /// with the scorer's role appended.
    pub fn standardize_system(&self) -> String {
        with_output_rules(&format!(
            "{}\n{}",
            self.validate.system, self.confidence.system
        ))
    }
}

/// Replaces `{key}` markers in one pass. Substituted text is never rescanned,
/// so resume text or caller options that contain markers stay literal.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let marker = &rest[open + 1..];
        let hit = values
            .iter()
            .find(|(key, _)| marker.starts_with(key) && marker[key.len()..].starts_with('}'));
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &marker[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = marker;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Extra lines steering the oracle according to the caller's options.
fn option_directives(options: &ParseOptions) -> String {
    let mut lines = Vec::new();
    if !options.extract_summary {
        lines.push("- Do not extract a summary: set personalInfo.summary to null with confidence 0.".to_string());
    }
    if !options.extract_languages {
        lines.push("- Do not extract spoken languages: return an empty languages array.".to_string());
    }
    if !options.section_priorities.is_empty() {
        lines.push(format!(
            "- Prioritise accuracy in these sections: {}.",
            options.section_priorities.join(", ")
        ));
    }

    if lines.is_empty() {
        String::new()
    } else {
        format!("\nCaller preferences:\n{}\n", lines.join("\n"))
    }
}
