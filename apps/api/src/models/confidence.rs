//! Confidence-scored value wrapper, the leaf primitive of every parsed record.
//!
//! A `ConfidenceField` can wrap another `ConfidenceField` (or any struct made of
//! them) when a value needs both an intrinsic score and a presence score, e.g.
//! a project's `dates` field wraps a whole `DateRange`.

use serde::{Deserialize, Serialize};

/// A value paired with a correctness score in `[0, 1]` and an optional note
/// describing how the value was standardized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceField<T> {
    pub value: T,
    pub confidence: f64,
    pub standardization: Option<String>,
}

impl<T> ConfidenceField<T> {
    /// Builds a field, clamping `confidence` into `[0, 1]` (NaN becomes 0).
    pub fn new(value: T, confidence: f64) -> Self {
        Self {
            value,
            confidence: clamp_confidence(confidence),
            standardization: None,
        }
    }

    pub fn with_standardization(mut self, note: impl Into<String>) -> Self {
        self.standardization = Some(note.into());
        self
    }

    pub fn is_below(&self, threshold: f64) -> bool {
        self.confidence < threshold
    }
}

impl<T> ConfidenceField<Option<T>> {
    /// A field the extractor found nothing for: null value, zero confidence.
    pub fn missing() -> Self {
        Self::new(None, 0.0)
    }
}

impl ConfidenceField<String> {
    /// An empty string with zero confidence, used for required text fields
    /// the oracle left blank.
    pub fn blank() -> Self {
        Self::new(String::new(), 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Clamps a raw score into `[0, 1]`. Non-finite scores collapse to 0.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        return 0.0;
    }
    confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped_on_construction() {
        assert_eq!(ConfidenceField::new("a", 1.7).confidence, 1.0);
        assert_eq!(ConfidenceField::new("a", -0.3).confidence, 0.0);
        assert_eq!(ConfidenceField::new("a", f64::NAN).confidence, 0.0);
        assert_eq!(ConfidenceField::new("a", f64::INFINITY).confidence, 1.0);
    }

    #[test]
    fn test_missing_field_is_null_with_zero_confidence() {
        let field: ConfidenceField<Option<String>> = ConfidenceField::missing();
        assert!(field.value.is_none());
        assert_eq!(field.confidence, 0.0);
        assert!(field.standardization.is_none());
    }

    #[test]
    fn test_blank_string_is_empty() {
        assert!(ConfidenceField::blank().is_empty());
        assert!(ConfidenceField::new("   ".to_string(), 0.9).is_empty());
        assert!(!ConfidenceField::new("Jane".to_string(), 0.9).is_empty());
    }

    #[test]
    fn test_nested_field_serializes_both_scores() {
        let inner = ConfidenceField::new(Some("2020-01".to_string()), 0.9);
        let outer = ConfidenceField::new(inner, 0.6).with_standardization("Inferred from project list");
        let json = serde_json::to_value(&outer).unwrap();
        assert_eq!(json["confidence"], 0.6);
        assert_eq!(json["value"]["confidence"], 0.9);
        assert_eq!(json["value"]["value"], "2020-01");
        assert_eq!(json["standardization"], "Inferred from project list");
    }

    #[test]
    fn test_is_below_is_strict() {
        let field = ConfidenceField::new("x", 0.3);
        assert!(!field.is_below(0.3));
        assert!(field.is_below(0.31));
    }
}
