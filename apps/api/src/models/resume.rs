use serde::{Deserialize, Serialize};

use crate::models::confidence::ConfidenceField;

type Text = ConfidenceField<String>;
type OptText = ConfidenceField<Option<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: Text,
    pub email: Text,
    pub phone: Text,
    pub location: OptText,
    pub linkedin: OptText,
    pub github: OptText,
    pub website: OptText,
    pub summary: OptText,
}

impl Default for PersonalInfo {
    fn default() -> Self {
        Self {
            name: ConfidenceField::blank(),
            email: ConfidenceField::blank(),
            phone: ConfidenceField::blank(),
            location: ConfidenceField::missing(),
            linkedin: ConfidenceField::missing(),
            github: ConfidenceField::missing(),
            website: ConfidenceField::missing(),
            summary: ConfidenceField::missing(),
        }
    }
}

impl PersonalInfo {
    /// Every personal-info confidence, in declaration order.
    pub fn confidences(&self) -> [f64; 8] {
        [
            self.name.confidence,
            self.email.confidence,
            self.phone.confidence,
            self.location.confidence,
            self.linkedin.confidence,
            self.github.confidence,
            self.website.confidence,
            self.summary.confidence,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub name: Text,
    pub category: OptText,
    pub proficiency: OptText,
    pub years_of_experience: ConfidenceField<Option<f64>>,
}

/// Start/end of a role or course of study.
///
/// When `current.value` is true, `end_date.value` is `None` and duration is
/// measured against the present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: OptText,
    pub end_date: OptText,
    pub duration_in_months: ConfidenceField<Option<u32>>,
    pub current: ConfidenceField<bool>,
}

impl DateRange {
    /// All-null range used when the oracle returned no dates at all.
    pub fn unknown() -> Self {
        Self {
            start_date: ConfidenceField::missing(),
            end_date: ConfidenceField::missing(),
            duration_in_months: ConfidenceField::missing(),
            current: ConfidenceField::new(false, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    pub company: Text,
    pub title: Text,
    pub location: OptText,
    pub dates: DateRange,
    pub responsibilities: ConfidenceField<Vec<String>>,
    pub technologies: ConfidenceField<Vec<String>>,
    pub achievements: ConfidenceField<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub institution: Text,
    pub degree: Text,
    pub field: Text,
    pub dates: DateRange,
    pub gpa: OptText,
    pub coursework: ConfidenceField<Option<Vec<String>>>,
    pub achievements: ConfidenceField<Option<Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: Text,
    pub description: Text,
    pub technologies: ConfidenceField<Vec<String>>,
    pub urls: ConfidenceField<Option<Vec<String>>>,
    pub dates: ConfidenceField<Option<DateRange>>,
    pub role: OptText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub name: Text,
    pub issuer: OptText,
    pub date: OptText,
    pub expiry_date: OptText,
    pub id: OptText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub name: Text,
    pub proficiency: OptText,
}

/// The structured result of one extraction request.
///
/// Every leaf scalar is a `ConfidenceField`. `overall_confidence` and
/// `missing_fields` are recomputed by aggregation; nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRecord {
    pub personal_info: PersonalInfo,
    pub skills: Vec<Skill>,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub projects: Vec<Project>,
    pub certifications: Vec<Certification>,
    pub languages: Vec<Language>,
    pub overall_confidence: f64,
    pub missing_fields: Vec<String>,
    pub detected_sections: Vec<String>,
}

impl ParsedRecord {
    /// Section names for every non-empty part of the record, used when the
    /// oracle does not report `detectedSections` itself.
    pub fn derive_sections(&self) -> Vec<String> {
        let info = &self.personal_info;
        let has_personal = !info.name.is_empty() || !info.email.is_empty() || !info.phone.is_empty();

        [
            ("personal_information", has_personal),
            ("skills", !self.skills.is_empty()),
            ("experience", !self.work_experience.is_empty()),
            ("education", !self.education.is_empty()),
            ("projects", !self.projects.is_empty()),
            ("certifications", !self.certifications.is_empty()),
            ("languages", !self.languages.is_empty()),
        ]
        .into_iter()
        .filter(|(_, present)| *present)
        .map(|(section, _)| section.to_string())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_camel_case() {
        let json = serde_json::to_value(ParsedRecord::default()).unwrap();
        assert!(json.get("personalInfo").is_some());
        assert!(json.get("workExperience").is_some());
        assert!(json.get("overallConfidence").is_some());
        assert!(json.get("missingFields").is_some());
        assert!(json["personalInfo"]["name"].get("standardization").is_some());
    }

    #[test]
    fn test_unknown_date_range_has_zero_confidence() {
        let range = DateRange::unknown();
        assert!(range.start_date.value.is_none());
        assert!(range.duration_in_months.value.is_none());
        assert!(!range.current.value);
        assert_eq!(range.current.confidence, 0.0);

        let json = serde_json::to_value(&range).unwrap();
        assert!(json.get("durationInMonths").is_some());
    }

    #[test]
    fn test_derive_sections_only_lists_present_parts() {
        let mut record = ParsedRecord::default();
        assert!(record.derive_sections().is_empty());

        record.personal_info.name = ConfidenceField::new("Jane Roe".to_string(), 0.9);
        record.languages.push(Language {
            name: ConfidenceField::new("English".to_string(), 0.9),
            proficiency: ConfidenceField::missing(),
        });
        assert_eq!(
            record.derive_sections(),
            vec!["personal_information".to_string(), "languages".to_string()]
        );
    }
}
