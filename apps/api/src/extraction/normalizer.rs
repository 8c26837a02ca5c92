//! Oracle output → `ParsedRecord`.
//!
//! The oracle returns JSON that only claims to follow the schema. Each leaf may
//! be a bare value or a `{value, confidence, standardization}` wrapper, and any
//! part may be missing. Everything is checked here field by field; no untyped
//! JSON leaves this module.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::extraction::aggregation::overall_confidence;
use crate::extraction::dates::is_ongoing_marker;
use crate::models::confidence::{clamp_confidence, ConfidenceField};
use crate::models::resume::{
    Certification, DateRange, Education, Language, ParsedRecord, PersonalInfo, Project, Skill,
    WorkExperience,
};

/// Confidence assigned to a value the oracle returned without its own score.
/// A neutral prior, tunable policy rather than a calibrated figure.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Error, PartialEq)]
#[error("{path}: {reason}")]
pub struct NormalizeError {
    pub path: String,
    pub reason: String,
}

impl NormalizeError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

type Result<T> = std::result::Result<T, NormalizeError>;
type Object = Map<String, Value>;

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

pub fn normalize(raw: &Value) -> Result<ParsedRecord> {
    let root = raw
        .as_object()
        .ok_or_else(|| NormalizeError::new("$", "expected a JSON object"))?;

    let personal_info = match root.get("personalInfo") {
        None | Some(Value::Null) => PersonalInfo::default(),
        Some(Value::Object(obj)) => personal_info(obj)?,
        Some(_) => return Err(NormalizeError::new("personalInfo", "expected an object")),
    };

    let mut record = ParsedRecord {
        personal_info,
        skills: entries(root, "skills", skill)?,
        work_experience: entries(root, "workExperience", work_experience)?,
        education: entries(root, "education", education)?,
        projects: entries(root, "projects", project)?,
        certifications: entries(root, "certifications", certification)?,
        languages: entries(root, "languages", language)?,
        overall_confidence: 0.0,
        missing_fields: string_array(root.get("missingFields")),
        detected_sections: string_array(root.get("detectedSections")),
    };

    if record.detected_sections.is_empty() {
        record.detected_sections = record.derive_sections();
    }
    record.overall_confidence = match root.get("overallConfidence").and_then(number) {
        Some(reported) => clamp_confidence(reported),
        None => overall_confidence(&record),
    };

    Ok(record)
}

/// Maps every element of an optional array section through `f`.
fn entries<T>(root: &Object, key: &str, f: fn(&Object, &str) -> Result<T>) -> Result<Vec<T>> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let path = format!("{key}[{i}]");
                match item {
                    Value::Object(obj) => f(obj, &path),
                    _ => Err(NormalizeError::new(&path, "expected an object")),
                }
            })
            .collect(),
        Some(_) => Err(NormalizeError::new(key, "expected an array")),
    }
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

// ────────────────────────────────────────────────────────────────────────────
// Leaf readers
// ────────────────────────────────────────────────────────────────────────────

/// A leaf split into its bare value and whatever metadata the oracle attached.
struct RawLeaf<'a> {
    value: &'a Value,
    confidence: Option<f64>,
    standardization: Option<String>,
}

fn raw_leaf<'a>(obj: &'a Object, key: &str) -> RawLeaf<'a> {
    match obj.get(key) {
        Some(Value::Object(wrapper)) if wrapper.contains_key("value") => RawLeaf {
            value: &wrapper["value"],
            confidence: wrapper.get("confidence").and_then(number),
            standardization: wrapper
                .get("standardization")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        },
        Some(value) => RawLeaf {
            value,
            confidence: None,
            standardization: None,
        },
        None => RawLeaf {
            value: &Value::Null,
            confidence: None,
            standardization: None,
        },
    }
}

/// Wraps a converted value, defaulting confidence by presence.
fn wrap<T>(value: T, present: bool, leaf: &RawLeaf<'_>) -> ConfidenceField<T> {
    let default = if present { NEUTRAL_CONFIDENCE } else { 0.0 };
    ConfidenceField {
        value,
        confidence: clamp_confidence(leaf.confidence.unwrap_or(default)),
        standardization: leaf.standardization.clone(),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_string(value: &Value, path: &str) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(NormalizeError::new(path, "expected a string")),
    }
}

fn to_string_list(value: &Value, path: &str) -> Result<Option<Vec<String>>> {
    match value {
        Value::Null => Ok(None),
        Value::String(_) | Value::Number(_) => Ok(to_string(value, path)?.map(|s| vec![s])),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                if let Some(s) = to_string(item, &format!("{path}[{i}]"))? {
                    out.push(s);
                }
            }
            Ok(Some(out))
        }
        _ => Err(NormalizeError::new(path, "expected a list of strings")),
    }
}

fn text(obj: &Object, key: &str, path: &str) -> Result<ConfidenceField<String>> {
    let leaf = raw_leaf(obj, key);
    let value = to_string(leaf.value, &format!("{path}.{key}"))?;
    let present = value.is_some();
    Ok(wrap(value.unwrap_or_default(), present, &leaf))
}

fn optional_text(obj: &Object, key: &str, path: &str) -> Result<ConfidenceField<Option<String>>> {
    let leaf = raw_leaf(obj, key);
    let value = to_string(leaf.value, &format!("{path}.{key}"))?;
    let present = value.is_some();
    Ok(wrap(value, present, &leaf))
}

fn optional_number(obj: &Object, key: &str, path: &str) -> Result<ConfidenceField<Option<f64>>> {
    let leaf = raw_leaf(obj, key);
    let value = match leaf.value {
        Value::Null => None,
        Value::Number(_) | Value::String(_) => number(leaf.value),
        _ => return Err(NormalizeError::new(&format!("{path}.{key}"), "expected a number")),
    };
    let present = value.is_some();
    Ok(wrap(value, present, &leaf))
}

fn list(obj: &Object, key: &str, path: &str) -> Result<ConfidenceField<Vec<String>>> {
    let leaf = raw_leaf(obj, key);
    let value = to_string_list(leaf.value, &format!("{path}.{key}"))?;
    let present = value.as_ref().is_some_and(|v| !v.is_empty());
    Ok(wrap(value.unwrap_or_default(), present, &leaf))
}

fn optional_list(
    obj: &Object,
    key: &str,
    path: &str,
) -> Result<ConfidenceField<Option<Vec<String>>>> {
    let leaf = raw_leaf(obj, key);
    let value = to_string_list(leaf.value, &format!("{path}.{key}"))?;
    let present = value.as_ref().is_some_and(|v| !v.is_empty());
    Ok(wrap(value, present, &leaf))
}

// ────────────────────────────────────────────────────────────────────────────
// Entities
// ────────────────────────────────────────────────────────────────────────────

fn personal_info(obj: &Object) -> Result<PersonalInfo> {
    let p = "personalInfo";
    Ok(PersonalInfo {
        name: text(obj, "name", p)?,
        email: text(obj, "email", p)?,
        phone: text(obj, "phone", p)?,
        location: optional_text(obj, "location", p)?,
        linkedin: optional_text(obj, "linkedin", p)?,
        github: optional_text(obj, "github", p)?,
        website: optional_text(obj, "website", p)?,
        summary: optional_text(obj, "summary", p)?,
    })
}

fn skill(obj: &Object, p: &str) -> Result<Skill> {
    Ok(Skill {
        name: text(obj, "name", p)?,
        category: optional_text(obj, "category", p)?,
        proficiency: optional_text(obj, "proficiency", p)?,
        years_of_experience: optional_number(obj, "yearsOfExperience", p)?,
    })
}

fn date_range(value: Option<&Value>, path: &str) -> Result<DateRange> {
    let obj = match value {
        None | Some(Value::Null) => return Ok(DateRange::unknown()),
        Some(Value::Object(obj)) => obj,
        Some(_) => return Err(NormalizeError::new(path, "expected a date range object")),
    };

    let duration = optional_number(obj, "durationInMonths", path)?;
    let duration_in_months = ConfidenceField {
        value: duration
            .value
            .filter(|m| m.is_finite() && *m >= 0.0)
            .map(|m| m.round() as u32),
        confidence: duration.confidence,
        standardization: duration.standardization,
    };

    let current_leaf = raw_leaf(obj, "current");
    let current_value = match current_leaf.value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().to_lowercase().parse::<bool>().ok(),
        Value::Null => None,
        _ => return Err(NormalizeError::new(&format!("{path}.current"), "expected a boolean")),
    };
    let mut current = wrap(current_value.unwrap_or(false), current_value.is_some(), &current_leaf);

    let mut end_date = optional_text(obj, "endDate", path)?;
    if let Some(marker) = end_date.value.clone().filter(|v| is_ongoing_marker(v)) {
        end_date.value = None;
        end_date.standardization = Some(format!("Normalized ongoing marker \"{marker}\" to null"));
        if current_value.is_none() {
            current = ConfidenceField::new(true, end_date.confidence);
        }
    }
    // An ongoing range has no end date.
    if current.value {
        if let Some(stated) = end_date.value.take() {
            end_date.standardization = Some(format!("Dropped end date \"{stated}\" of ongoing range"));
        }
    }

    Ok(DateRange {
        start_date: optional_text(obj, "startDate", path)?,
        end_date,
        duration_in_months,
        current,
    })
}

fn work_experience(obj: &Object, p: &str) -> Result<WorkExperience> {
    Ok(WorkExperience {
        company: text(obj, "company", p)?,
        title: text(obj, "title", p)?,
        location: optional_text(obj, "location", p)?,
        dates: date_range(obj.get("dates"), &format!("{p}.dates"))?,
        responsibilities: list(obj, "responsibilities", p)?,
        technologies: list(obj, "technologies", p)?,
        achievements: list(obj, "achievements", p)?,
    })
}

fn education(obj: &Object, p: &str) -> Result<Education> {
    Ok(Education {
        institution: text(obj, "institution", p)?,
        degree: text(obj, "degree", p)?,
        field: text(obj, "field", p)?,
        dates: date_range(obj.get("dates"), &format!("{p}.dates"))?,
        gpa: optional_text(obj, "gpa", p)?,
        coursework: optional_list(obj, "coursework", p)?,
        achievements: optional_list(obj, "achievements", p)?,
    })
}

fn project(obj: &Object, p: &str) -> Result<Project> {
    // `dates` is a wrapped DateRange: the wrapper scores presence, the range
    // scores each date.
    let leaf = raw_leaf(obj, "dates");
    let range = match leaf.value {
        Value::Null => None,
        inner => Some(date_range(Some(inner), &format!("{p}.dates"))?),
    };
    let present = range.is_some();

    Ok(Project {
        name: text(obj, "name", p)?,
        description: text(obj, "description", p)?,
        technologies: list(obj, "technologies", p)?,
        urls: optional_list(obj, "urls", p)?,
        dates: wrap(range, present, &leaf),
        role: optional_text(obj, "role", p)?,
    })
}

fn certification(obj: &Object, p: &str) -> Result<Certification> {
    Ok(Certification {
        name: text(obj, "name", p)?,
        issuer: optional_text(obj, "issuer", p)?,
        date: optional_text(obj, "date", p)?,
        expiry_date: optional_text(obj, "expiryDate", p)?,
        id: optional_text(obj, "id", p)?,
    })
}

fn language(obj: &Object, p: &str) -> Result<Language> {
    Ok(Language {
        name: text(obj, "name", p)?,
        proficiency: optional_text(obj, "proficiency", p)?,
    })
}
