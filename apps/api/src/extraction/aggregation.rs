//! Deterministic post-processing: derived durations, overall confidence and
//! missing-field detection. No oracle calls happen here.

use chrono::NaiveDate;
use thiserror::Error;

use crate::extraction::dates::{months_between, parse_year_month, YearMonth};
use crate::models::confidence::ConfidenceField;
use crate::models::resume::{DateRange, ParsedRecord};

// Tunable policy, not calibrated priors.
pub const PERSONAL_INFO_WEIGHT: f64 = 1.0;
pub const SKILL_WEIGHT: f64 = 1.0;
/// Company/title and institution/degree identify an entry, so they count more.
pub const IDENTITY_FIELD_WEIGHT: f64 = 1.5;
/// Computed durations are trusted less than extracted ones.
pub const DERIVED_DURATION_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Error, PartialEq)]
pub enum AggregationError {
    #[error("confidence threshold must be a finite number in [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("overall confidence is not a finite number")]
    NonFiniteConfidence,
}

/// Runs every post-processing step. The orchestrator treats an error here as
/// a degraded stage and keeps the input record.
pub fn try_aggregate(
    mut record: ParsedRecord,
    threshold: f64,
    today: NaiveDate,
) -> Result<ParsedRecord, AggregationError> {
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(AggregationError::InvalidThreshold(threshold));
    }

    backfill_durations(&mut record, today);

    let overall = overall_confidence(&record);
    if !overall.is_finite() {
        return Err(AggregationError::NonFiniteConfidence);
    }
    record.overall_confidence = overall;
    record.missing_fields = missing_fields(&record, threshold);

    Ok(record)
}

// ────────────────────────────────────────────────────────────────────────────
// Durations
// ────────────────────────────────────────────────────────────────────────────

/// Fills `durationInMonths` on work and education entries that lack it.
pub fn backfill_durations(record: &mut ParsedRecord, today: NaiveDate) {
    let now = YearMonth::from_date(today);
    let ranges = record
        .work_experience
        .iter_mut()
        .map(|w| &mut w.dates)
        .chain(record.education.iter_mut().map(|e| &mut e.dates));

    for range in ranges {
        if range.duration_in_months.value.is_some() {
            continue;
        }
        if let Some(months) = derived_duration(range, now) {
            range.duration_in_months = ConfidenceField::new(Some(months), DERIVED_DURATION_CONFIDENCE)
                .with_standardization("Calculated from start and end dates");
        }
    }
}

fn derived_duration(range: &DateRange, now: YearMonth) -> Option<u32> {
    let start = parse_year_month(range.start_date.value.as_deref()?)?;
    let end = match range.end_date.value.as_deref() {
        // An end date we cannot read is not the same as no end date.
        Some(raw) if !range.current.value => parse_year_month(raw)?,
        _ => now,
    };
    Some(months_between(start, end))
}

// ────────────────────────────────────────────────────────────────────────────
// Confidence
// ────────────────────────────────────────────────────────────────────────────

/// Weighted mean of the scoring leaves, rounded to two decimals. Zero when the
/// record has nothing to score.
pub fn overall_confidence(record: &ParsedRecord) -> f64 {
    let mut scored: Vec<(f64, f64)> = record
        .personal_info
        .confidences()
        .into_iter()
        .map(|c| (c, PERSONAL_INFO_WEIGHT))
        .collect();

    scored.extend(record.skills.iter().map(|s| (s.name.confidence, SKILL_WEIGHT)));
    for work in &record.work_experience {
        scored.push((work.company.confidence, IDENTITY_FIELD_WEIGHT));
        scored.push((work.title.confidence, IDENTITY_FIELD_WEIGHT));
    }
    for edu in &record.education {
        scored.push((edu.institution.confidence, IDENTITY_FIELD_WEIGHT));
        scored.push((edu.degree.confidence, IDENTITY_FIELD_WEIGHT));
    }

    let total_weight: f64 = scored.iter().map(|(_, w)| w).sum();
    if total_weight == 0.0 {
        return 0.0;
    }
    let weighted: f64 = scored.iter().map(|(c, w)| c * w).sum();
    ((weighted / total_weight) * 100.0).round() / 100.0
}

// ────────────────────────────────────────────────────────────────────────────
// Missing fields
// ────────────────────────────────────────────────────────────────────────────

/// Recomputes the missing-field list from scratch. Any previous list on the
/// record is ignored.
pub fn missing_fields(record: &ParsedRecord, threshold: f64) -> Vec<String> {
    let info = &record.personal_info;
    let mut missing = Vec::new();

    for (path, field) in [
        ("personalInfo.name", &info.name),
        ("personalInfo.email", &info.email),
        ("personalInfo.phone", &info.phone),
    ] {
        if field.is_empty() || field.is_below(threshold) {
            missing.push(path.to_string());
        }
    }

    for (section, empty) in [
        ("skills", record.skills.is_empty()),
        ("workExperience", record.work_experience.is_empty()),
        ("education", record.education.is_empty()),
    ] {
        if empty {
            missing.push(section.to_string());
        }
    }

    missing
}
