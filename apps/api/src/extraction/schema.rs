//! Declarative schema tree and the oracle-safe transform.
//!
//! `SchemaNode` describes the rich output shape (constraints, optional fields,
//! enums, unions). Structured-output mode on the oracle side cannot enforce most
//! of that, so `to_oracle_safe` strips it down:
//!
//! - objects are closed and every property is required
//! - string/number/array constraints are dropped; description and example stay
//! - nullability is kept
//! - optional becomes required (absent data is `null` + zero confidence)
//! - enums collapse to plain strings, unions to their first alternative
//!
//! The enum/union collapse is lossy on purpose. It only works because the
//! prompt text still tells the oracle which values are expected; enum values are
//! copied into the description for that reason.

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMeta {
    pub description: Option<String>,
    pub example: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringConstraints {
    pub min_length: Option<usize>,
    pub pattern: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub schema: SchemaNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Object {
        properties: Vec<Property>,
        closed: bool,
        meta: SchemaMeta,
    },
    Array {
        items: Box<SchemaNode>,
        max_items: Option<usize>,
        unique_items: bool,
        meta: SchemaMeta,
    },
    String {
        constraints: StringConstraints,
        meta: SchemaMeta,
    },
    Number {
        integer: bool,
        minimum: Option<f64>,
        maximum: Option<f64>,
        meta: SchemaMeta,
    },
    Boolean {
        meta: SchemaMeta,
    },
    Nullable(Box<SchemaNode>),
    Optional(Box<SchemaNode>),
    Enum {
        values: Vec<String>,
        meta: SchemaMeta,
    },
    Literal {
        value: Value,
        meta: SchemaMeta,
    },
    Union {
        variants: Vec<SchemaNode>,
        meta: SchemaMeta,
    },
    #[allow(dead_code)] // collapsed like `Union`; no resume field is tagged
    DiscriminatedUnion {
        discriminator: String,
        variants: Vec<SchemaNode>,
        meta: SchemaMeta,
    },
    /// A raw JSON Schema fragment of a kind this tree does not model.
    /// Passed through untouched by the transform.
    Opaque(Value),
}

// ────────────────────────────────────────────────────────────────────────────
// Builders
// ────────────────────────────────────────────────────────────────────────────

impl SchemaNode {
    pub fn object<N: Into<String>>(properties: impl IntoIterator<Item = (N, SchemaNode)>) -> Self {
        SchemaNode::Object {
            properties: properties
                .into_iter()
                .map(|(name, schema)| Property {
                    name: name.into(),
                    schema,
                })
                .collect(),
            closed: false,
            meta: SchemaMeta::default(),
        }
    }

    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array {
            items: Box::new(items),
            max_items: None,
            unique_items: false,
            meta: SchemaMeta::default(),
        }
    }

    pub fn string() -> Self {
        SchemaNode::String {
            constraints: StringConstraints::default(),
            meta: SchemaMeta::default(),
        }
    }

    pub fn number() -> Self {
        SchemaNode::Number {
            integer: false,
            minimum: None,
            maximum: None,
            meta: SchemaMeta::default(),
        }
    }

    pub fn integer() -> Self {
        SchemaNode::Number {
            integer: true,
            minimum: None,
            maximum: None,
            meta: SchemaMeta::default(),
        }
    }

    pub fn boolean() -> Self {
        SchemaNode::Boolean {
            meta: SchemaMeta::default(),
        }
    }

    pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        SchemaNode::Enum {
            values: values.into_iter().map(Into::into).collect(),
            meta: SchemaMeta::default(),
        }
    }

    #[allow(dead_code)] // the resume schema pins no constants
    pub fn literal(value: Value) -> Self {
        SchemaNode::Literal {
            value,
            meta: SchemaMeta::default(),
        }
    }

    pub fn union(variants: Vec<SchemaNode>) -> Self {
        SchemaNode::Union {
            variants,
            meta: SchemaMeta::default(),
        }
    }

    pub fn nullable(self) -> Self {
        SchemaNode::Nullable(Box::new(self))
    }

    pub fn optional(self) -> Self {
        SchemaNode::Optional(Box::new(self))
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        if let SchemaNode::Number {
            minimum, maximum, ..
        } = &mut self
        {
            *minimum = Some(min);
            *maximum = Some(max);
        }
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        if let SchemaNode::String { constraints, .. } = &mut self {
            constraints.min_length = Some(len);
        }
        self
    }

    pub fn pattern(mut self, regex: &str) -> Self {
        if let SchemaNode::String { constraints, .. } = &mut self {
            constraints.pattern = Some(regex.to_string());
        }
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        if let SchemaNode::String { constraints, .. } = &mut self {
            constraints.format = Some(format.to_string());
        }
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        if let SchemaNode::Array { max_items, .. } = &mut self {
            *max_items = Some(max);
        }
        self
    }

    pub fn unique(mut self) -> Self {
        if let SchemaNode::Array { unique_items, .. } = &mut self {
            *unique_items = true;
        }
        self
    }

    pub fn describe(mut self, text: &str) -> Self {
        if let Some(meta) = self.meta_mut() {
            meta.description = Some(text.to_string());
        }
        self
    }

    pub fn example(mut self, value: Value) -> Self {
        if let Some(meta) = self.meta_mut() {
            meta.example = Some(value);
        }
        self
    }

    /// Metadata slot for the node, or the wrapped node for nullable/optional.
    fn meta_mut(&mut self) -> Option<&mut SchemaMeta> {
        match self {
            SchemaNode::Object { meta, .. }
            | SchemaNode::Array { meta, .. }
            | SchemaNode::String { meta, .. }
            | SchemaNode::Number { meta, .. }
            | SchemaNode::Boolean { meta }
            | SchemaNode::Enum { meta, .. }
            | SchemaNode::Literal { meta, .. }
            | SchemaNode::Union { meta, .. }
            | SchemaNode::DiscriminatedUnion { meta, .. } => Some(meta),
            SchemaNode::Nullable(inner) | SchemaNode::Optional(inner) => inner.meta_mut(),
            SchemaNode::Opaque(_) => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Oracle-safe transform
// ────────────────────────────────────────────────────────────────────────────

/// Maps a schema tree to its oracle-safe equivalent. Pure and idempotent.
pub fn to_oracle_safe(node: &SchemaNode) -> SchemaNode {
    match node {
        SchemaNode::Object {
            properties, meta, ..
        } => SchemaNode::Object {
            properties: properties
                .iter()
                .map(|p| Property {
                    name: p.name.clone(),
                    schema: to_oracle_safe(&p.schema),
                })
                .collect(),
            closed: true,
            meta: meta.clone(),
        },
        SchemaNode::Array { items, meta, .. } => SchemaNode::Array {
            items: Box::new(to_oracle_safe(items)),
            max_items: None,
            unique_items: false,
            meta: meta.clone(),
        },
        SchemaNode::String { meta, .. } => SchemaNode::String {
            constraints: StringConstraints::default(),
            meta: meta.clone(),
        },
        SchemaNode::Number { integer, meta, .. } => SchemaNode::Number {
            integer: *integer,
            minimum: None,
            maximum: None,
            meta: meta.clone(),
        },
        SchemaNode::Boolean { .. } => node.clone(),
        SchemaNode::Nullable(inner) => SchemaNode::Nullable(Box::new(to_oracle_safe(inner))),
        SchemaNode::Optional(inner) => to_oracle_safe(inner),
        SchemaNode::Enum { values, meta } => SchemaNode::String {
            constraints: StringConstraints::default(),
            meta: SchemaMeta {
                description: Some(describe_allowed_values(meta.description.as_deref(), values)),
                example: meta.example.clone(),
            },
        },
        SchemaNode::Literal { value, meta } => literal_to_plain(value, meta),
        SchemaNode::Union { variants, meta }
        | SchemaNode::DiscriminatedUnion { variants, meta, .. } => match variants.first() {
            Some(first) => {
                let mut collapsed = to_oracle_safe(first);
                inherit_meta(&mut collapsed, meta);
                collapsed
            }
            None => SchemaNode::String {
                constraints: StringConstraints::default(),
                meta: meta.clone(),
            },
        },
        SchemaNode::Opaque(_) => node.clone(),
    }
}

fn describe_allowed_values(description: Option<&str>, values: &[String]) -> String {
    let hint = format!("Expected one of: {}.", values.join(", "));
    match description {
        Some(text) if text.contains(&hint) => text.to_string(),
        Some(text) => format!("{text} {hint}"),
        None => hint,
    }
}

fn literal_to_plain(value: &Value, meta: &SchemaMeta) -> SchemaNode {
    let meta = meta.clone();
    match value {
        Value::String(_) => SchemaNode::String {
            constraints: StringConstraints::default(),
            meta,
        },
        Value::Number(n) => SchemaNode::Number {
            integer: n.is_i64() || n.is_u64(),
            minimum: None,
            maximum: None,
            meta,
        },
        Value::Bool(_) => SchemaNode::Boolean { meta },
        other => SchemaNode::Opaque(json!({ "const": other })),
    }
}

/// Copies union-level metadata onto the surviving alternative where it has none.
fn inherit_meta(node: &mut SchemaNode, parent: &SchemaMeta) {
    if let Some(meta) = node.meta_mut() {
        if meta.description.is_none() {
            meta.description = parent.description.clone();
        }
        if meta.example.is_none() {
            meta.example = parent.example.clone();
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// JSON Schema rendering
// ────────────────────────────────────────────────────────────────────────────

impl SchemaNode {
    /// Renders the tree as a JSON Schema document.
    pub fn to_json_schema(&self) -> Value {
        match self {
            SchemaNode::Object {
                properties,
                closed,
                meta,
            } => {
                let mut props = Map::new();
                let mut required = Vec::new();
                for p in properties {
                    if !matches!(p.schema, SchemaNode::Optional(_)) {
                        required.push(Value::String(p.name.clone()));
                    }
                    props.insert(p.name.clone(), p.schema.to_json_schema());
                }
                let mut out = json!({
                    "type": "object",
                    "properties": props,
                    "required": required,
                });
                if *closed {
                    out["additionalProperties"] = Value::Bool(false);
                }
                with_meta(out, meta)
            }
            SchemaNode::Array {
                items,
                max_items,
                unique_items,
                meta,
            } => {
                let mut out = json!({ "type": "array", "items": items.to_json_schema() });
                if let Some(n) = max_items {
                    out["maxItems"] = json!(n);
                }
                if *unique_items {
                    out["uniqueItems"] = Value::Bool(true);
                }
                with_meta(out, meta)
            }
            SchemaNode::String { constraints, meta } => {
                let mut out = json!({ "type": "string" });
                if let Some(n) = constraints.min_length {
                    out["minLength"] = json!(n);
                }
                if let Some(p) = &constraints.pattern {
                    out["pattern"] = json!(p);
                }
                if let Some(f) = &constraints.format {
                    out["format"] = json!(f);
                }
                with_meta(out, meta)
            }
            SchemaNode::Number {
                integer,
                minimum,
                maximum,
                meta,
            } => {
                let ty = if *integer { "integer" } else { "number" };
                let mut out = json!({ "type": ty });
                if let Some(n) = minimum {
                    out["minimum"] = json!(n);
                }
                if let Some(n) = maximum {
                    out["maximum"] = json!(n);
                }
                with_meta(out, meta)
            }
            SchemaNode::Boolean { meta } => with_meta(json!({ "type": "boolean" }), meta),
            SchemaNode::Nullable(inner) => {
                let mut out = inner.to_json_schema();
                match out.get("type").and_then(Value::as_str).map(str::to_string) {
                    Some(ty) => {
                        out["type"] = json!([ty, "null"]);
                        out
                    }
                    None => json!({ "anyOf": [out, { "type": "null" }] }),
                }
            }
            SchemaNode::Optional(inner) => inner.to_json_schema(),
            SchemaNode::Enum { values, meta } => {
                with_meta(json!({ "type": "string", "enum": values }), meta)
            }
            SchemaNode::Literal { value, meta } => with_meta(json!({ "const": value }), meta),
            SchemaNode::Union { variants, meta } => {
                let any_of: Vec<Value> = variants.iter().map(SchemaNode::to_json_schema).collect();
                with_meta(json!({ "anyOf": any_of }), meta)
            }
            SchemaNode::DiscriminatedUnion {
                discriminator,
                variants,
                meta,
            } => {
                let one_of: Vec<Value> = variants.iter().map(SchemaNode::to_json_schema).collect();
                with_meta(
                    json!({
                        "oneOf": one_of,
                        "discriminator": { "propertyName": discriminator },
                    }),
                    meta,
                )
            }
            SchemaNode::Opaque(raw) => raw.clone(),
        }
    }
}

fn with_meta(mut out: Value, meta: &SchemaMeta) -> Value {
    if let Some(d) = &meta.description {
        out["description"] = json!(d);
    }
    if let Some(e) = &meta.example {
        out["examples"] = json!([e]);
    }
    out
}
