//! Drives one resume through the extraction pipeline.
//!
//! INITIAL_EXTRACT → QUALITY_CHECK → (RETRY)? → (STANDARDIZE)? → POST_PROCESS
//!
//! Only the initial extraction may fail the request. Every later stage yields a
//! `StageOutcome`; a degraded stage hands back the last good record and the
//! pipeline carries on.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::extraction::aggregation::try_aggregate;
use crate::extraction::normalizer::normalize;
use crate::extraction::prompts::PromptSet;
use crate::extraction::ExtractionError;
use crate::llm_client::{ExtractionOracle, LlmError, Operation, OracleRequest};
use crate::models::confidence::ConfidenceField;
use crate::models::request::ParseOptions;
use crate::models::resume::ParsedRecord;

/// Shorter texts are rejected before any oracle call.
pub const MIN_RESUME_LENGTH: usize = 50;
/// Below this overall confidence the initial extraction is retried.
pub const QUALITY_FLOOR: f64 = 0.5;

// ────────────────────────────────────────────────────────────────────────────
// Stage bookkeeping
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    InitialExtract,
    Retry,
    Standardize,
    PostProcess,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Skipped,
    Degraded(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    #[serde(flatten)]
    pub status: StageStatus,
}

/// Result of one best-effort stage.
#[derive(Debug)]
pub enum StageOutcome {
    Ok(ParsedRecord),
    /// The stage failed; the record is the one the stage started from.
    Degraded(ParsedRecord, ExtractionError),
}

/// What `extract` returns on success.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub request_id: Uuid,
    pub record: ParsedRecord,
    pub stages: Vec<StageReport>,
}

impl ExtractionOutcome {
    pub fn is_degraded(&self) -> bool {
        self.stages
            .iter()
            .any(|s| matches!(s.status, StageStatus::Degraded(_)))
    }
}

/// Folds one stage result into the trace and returns the record to continue with.
fn settle(stages: &mut Vec<StageReport>, stage: Stage, outcome: StageOutcome) -> ParsedRecord {
    match outcome {
        StageOutcome::Ok(record) => {
            stages.push(StageReport {
                stage,
                status: StageStatus::Completed,
            });
            record
        }
        StageOutcome::Degraded(record, reason) => {
            warn!(
                stage = ?stage,
                code = reason.code(),
                error = %reason,
                "Stage degraded, continuing with last good record"
            );
            stages.push(StageReport {
                stage,
                status: StageStatus::Degraded(reason.to_string()),
            });
            record
        }
    }
}

fn skipped(stages: &mut Vec<StageReport>, stage: Stage) {
    stages.push(StageReport {
        stage,
        status: StageStatus::Skipped,
    });
}

// ────────────────────────────────────────────────────────────────────────────
// Extractor
// ────────────────────────────────────────────────────────────────────────────

/// Stateless across requests; safe to share behind an `Arc`.
pub struct ResumeExtractor {
    oracle: Arc<dyn ExtractionOracle>,
    prompts: PromptSet,
    schema: Arc<Value>,
    call_timeout: Duration,
}

impl ResumeExtractor {
    pub fn new(
        oracle: Arc<dyn ExtractionOracle>,
        prompts: PromptSet,
        schema: Value,
        call_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            prompts,
            schema: Arc::new(schema),
            call_timeout,
        }
    }

    pub async fn extract(
        &self,
        resume_text: &str,
        options: &ParseOptions,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        validate_input(resume_text, options)?;

        let request_id = Uuid::new_v4();
        let span = info_span!("extract_resume", %request_id);
        self.run(resume_text.trim(), options, request_id)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        resume_text: &str,
        options: &ParseOptions,
        request_id: Uuid,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        info!(chars = resume_text.len(), "Starting resume extraction");
        let mut stages = Vec::with_capacity(4);

        let prompt = self.prompts.extract_prompt(resume_text, options);
        let record = self
            .call_and_normalize(
                Operation::Extract,
                self.prompts.system(Operation::Extract),
                prompt,
                options,
            )
            .await?;
        stages.push(StageReport {
            stage: Stage::InitialExtract,
            status: StageStatus::Completed,
        });

        let gaps = quality_gaps(&record);
        let record = if gaps.is_empty() {
            skipped(&mut stages, Stage::Retry);
            record
        } else {
            info!(gaps = ?gaps, "Initial extraction below quality gate, retrying");
            let outcome = self.retry(resume_text, options, &gaps, record).await;
            settle(&mut stages, Stage::Retry, outcome)
        };

        let record = if options.standardization_enabled {
            let outcome = self.standardize(options, record).await;
            settle(&mut stages, Stage::Standardize, outcome)
        } else {
            skipped(&mut stages, Stage::Standardize);
            record
        };

        let outcome = post_process(record, options.confidence_threshold);
        let record = settle(&mut stages, Stage::PostProcess, outcome);

        info!(
            overall_confidence = record.overall_confidence,
            missing = record.missing_fields.len(),
            stages = ?stages,
            "Resume extraction finished"
        );

        Ok(ExtractionOutcome {
            request_id,
            record,
            stages,
        })
    }

    async fn retry(
        &self,
        resume_text: &str,
        options: &ParseOptions,
        gaps: &[String],
        previous: ParsedRecord,
    ) -> StageOutcome {
        let previous_json = serde_json::to_value(&previous).unwrap_or(Value::Null);
        let prompt = self
            .prompts
            .retry_prompt(resume_text, options, gaps, &previous_json);

        match self
            .call_and_normalize(
                Operation::Extract,
                self.prompts.system(Operation::Extract),
                prompt,
                options,
            )
            .await
        {
            Ok(record) => StageOutcome::Ok(record),
            Err(e) => StageOutcome::Degraded(previous, e),
        }
    }

    async fn standardize(&self, options: &ParseOptions, current: ParsedRecord) -> StageOutcome {
        let current_json = serde_json::to_value(&current).unwrap_or(Value::Null);
        let prompt = self.prompts.standardize_prompt(&current_json);

        match self
            .call_and_normalize(
                Operation::Validate,
                self.prompts.standardize_system(),
                prompt,
                options,
            )
            .await
        {
            Ok(record) => StageOutcome::Ok(record),
            Err(e) => StageOutcome::Degraded(current, e),
        }
    }

    /// One timed oracle call, normalized and with the caller's options enforced.
    async fn call_and_normalize(
        &self,
        operation: Operation,
        system: String,
        prompt: String,
        options: &ParseOptions,
    ) -> Result<ParsedRecord, ExtractionError> {
        let request = OracleRequest {
            operation,
            system,
            prompt,
            schema: Arc::clone(&self.schema),
        };

        let raw = tokio::time::timeout(self.call_timeout, self.oracle.complete_json(&request))
            .await
            .map_err(|_| LlmError::Timeout(self.call_timeout))??;

        let mut record = normalize(&raw)?;
        apply_options(&mut record, options);
        Ok(record)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pure steps
// ────────────────────────────────────────────────────────────────────────────

fn validate_input(resume_text: &str, options: &ParseOptions) -> Result<(), ExtractionError> {
    let text = resume_text.trim();
    if text.is_empty() {
        return Err(ExtractionError::InvalidInput(
            "Resume text is required".to_string(),
        ));
    }
    if text.chars().count() < MIN_RESUME_LENGTH {
        return Err(ExtractionError::InvalidInput(format!(
            "Resume text must be at least {MIN_RESUME_LENGTH} characters"
        )));
    }

    let threshold = options.confidence_threshold;
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(ExtractionError::InvalidInput(
            "confidenceThreshold must be between 0 and 1".to_string(),
        ));
    }
    Ok(())
}

/// Reasons to retry the initial extraction. Empty means the record passes.
pub fn quality_gaps(record: &ParsedRecord) -> Vec<String> {
    let info = &record.personal_info;
    let mut gaps = Vec::new();

    if info.name.is_empty() {
        gaps.push("personalInfo.name is empty".to_string());
    }
    if info.email.is_empty() {
        gaps.push("personalInfo.email is empty".to_string());
    }
    if record.skills.is_empty() {
        gaps.push("skills is empty".to_string());
    }
    if record.work_experience.is_empty() {
        gaps.push("workExperience is empty".to_string());
    }
    if record.overall_confidence < QUALITY_FLOOR {
        gaps.push(format!(
            "overallConfidence {:.2} is below {QUALITY_FLOOR}",
            record.overall_confidence
        ));
    }
    gaps
}

/// Deterministically enforces options the oracle may have ignored.
fn apply_options(record: &mut ParsedRecord, options: &ParseOptions) {
    if !options.extract_summary {
        record.personal_info.summary = ConfidenceField::missing();
    }
    if !options.extract_languages {
        record.languages.clear();
    }
}

/// Aggregation as a total step: on failure the record comes back unchanged.
fn post_process(record: ParsedRecord, threshold: f64) -> StageOutcome {
    match try_aggregate(record.clone(), threshold, Local::now().date_naive()) {
        Ok(aggregated) => StageOutcome::Ok(aggregated),
        Err(e) => StageOutcome::Degraded(record, e.into()),
    }
}
