//! The rich parsed-resume schema and its oracle-safe JSON rendering.
//!
//! `parsed_record_schema()` is the full contract (ranges, formats, enums,
//! optional aggregate fields). The oracle only ever sees `oracle_schema()`,
//! which is computed once at startup and shared by every oracle call.

use serde_json::{json, Value};

use crate::extraction::schema::{to_oracle_safe, SchemaNode};

fn confidence_field(value: SchemaNode) -> SchemaNode {
    SchemaNode::object([
        ("value", value),
        (
            "confidence",
            SchemaNode::number()
                .range(0.0, 1.0)
                .describe("Confidence score between 0 and 1")
                .example(json!(0.95)),
        ),
        (
            "standardization",
            SchemaNode::string()
                .nullable()
                .describe("Notes about any standardization applied")
                .example(json!("Standardized from \"JS\" to \"JavaScript\"")),
        ),
    ])
}

fn text() -> SchemaNode {
    confidence_field(SchemaNode::string())
}

fn optional_text() -> SchemaNode {
    confidence_field(SchemaNode::string().nullable())
}

fn string_list() -> SchemaNode {
    SchemaNode::array(SchemaNode::string())
}

fn year_month() -> SchemaNode {
    SchemaNode::string()
        .pattern(r"^\d{4}(-\d{2})?$")
        .nullable()
        .describe("Date as YYYY-MM (or YYYY when the month is unknown)")
        .example(json!("2019-01"))
}

fn date_range() -> SchemaNode {
    SchemaNode::object([
        ("startDate", confidence_field(year_month())),
        (
            "endDate",
            confidence_field(year_month().describe("Null when the position is current")),
        ),
        (
            "durationInMonths",
            confidence_field(SchemaNode::integer().nullable()),
        ),
        ("current", confidence_field(SchemaNode::boolean())),
    ])
}

fn personal_info() -> SchemaNode {
    SchemaNode::object([
        ("name", confidence_field(SchemaNode::string().min_length(1))),
        ("email", confidence_field(SchemaNode::string().format("email"))),
        ("phone", text()),
        ("location", optional_text()),
        (
            "linkedin",
            confidence_field(SchemaNode::string().format("uri").nullable()),
        ),
        (
            "github",
            confidence_field(SchemaNode::string().format("uri").nullable()),
        ),
        (
            "website",
            confidence_field(SchemaNode::string().format("uri").nullable()),
        ),
        ("summary", optional_text()),
    ])
}

fn skill() -> SchemaNode {
    SchemaNode::object([
        ("name", text()),
        (
            "category",
            confidence_field(
                SchemaNode::string()
                    .nullable()
                    .example(json!("Programming Languages")),
            ),
        ),
        (
            "proficiency",
            confidence_field(
                SchemaNode::enumeration(["Beginner", "Intermediate", "Advanced", "Expert"])
                    .nullable(),
            ),
        ),
        (
            "yearsOfExperience",
            confidence_field(
                SchemaNode::union(vec![SchemaNode::number(), SchemaNode::string()]).nullable(),
            ),
        ),
    ])
}

fn work_experience() -> SchemaNode {
    SchemaNode::object([
        ("company", text()),
        ("title", text()),
        ("location", optional_text()),
        ("dates", date_range()),
        ("responsibilities", confidence_field(string_list())),
        ("technologies", confidence_field(string_list().unique())),
        ("achievements", confidence_field(string_list())),
    ])
}

fn education() -> SchemaNode {
    SchemaNode::object([
        ("institution", text()),
        ("degree", text()),
        ("field", text()),
        ("dates", date_range()),
        ("gpa", optional_text()),
        ("coursework", confidence_field(string_list().nullable())),
        ("achievements", confidence_field(string_list().nullable())),
    ])
}

fn project() -> SchemaNode {
    SchemaNode::object([
        ("name", text()),
        ("description", text()),
        ("technologies", confidence_field(string_list().unique())),
        (
            "urls",
            confidence_field(SchemaNode::array(SchemaNode::string().format("uri")).nullable()),
        ),
        ("dates", confidence_field(date_range().nullable())),
        ("role", optional_text()),
    ])
}

fn certification() -> SchemaNode {
    SchemaNode::object([
        ("name", text()),
        ("issuer", optional_text()),
        ("date", confidence_field(year_month())),
        ("expiryDate", confidence_field(year_month())),
        ("id", optional_text()),
    ])
}

fn language() -> SchemaNode {
    SchemaNode::object([
        ("name", text()),
        (
            "proficiency",
            confidence_field(
                SchemaNode::enumeration(["Native", "Fluent", "Professional", "Intermediate", "Basic"])
                    .nullable(),
            ),
        ),
    ])
}

/// The full parsed-resume contract.
pub fn parsed_record_schema() -> SchemaNode {
    SchemaNode::object([
        ("personalInfo", personal_info()),
        ("skills", SchemaNode::array(skill())),
        ("workExperience", SchemaNode::array(work_experience())),
        ("education", SchemaNode::array(education())),
        ("projects", SchemaNode::array(project())),
        ("certifications", SchemaNode::array(certification())),
        ("languages", SchemaNode::array(language()).max_items(20)),
        (
            "overallConfidence",
            SchemaNode::number()
                .range(0.0, 1.0)
                .describe("Weighted average of field confidences")
                .optional(),
        ),
        ("missingFields", string_list().optional()),
        (
            "detectedSections",
            string_list()
                .describe("Major sections found, e.g. personal_information, skills, experience")
                .optional(),
        ),
    ])
}

/// Oracle-safe JSON Schema for the parsed-resume contract.
pub fn oracle_schema() -> Value {
    to_oracle_safe(&parsed_record_schema()).to_json_schema()
}
