//! Declarative input schemas for capability dispatch.
//!
//! Every capability describes its input as a constraint tree built from the
//! closed subset used across the tool contracts: primitive type checks,
//! required fields, enum membership, numeric bounds, string length bounds,
//! and closed objects. Validation is total and side-effect-free: it walks
//! the whole value in one pass and collects *every* violation, in an order
//! that depends only on the schema declaration and the value, so identical
//! `(schema, value)` pairs always produce identical issue lists.
//!
//! Schemas also serialize to a JSON-Schema-shaped value for the capability
//! listing; the handler side never sees that form.

use serde::Serialize;
use serde_json::{json, Map, Value};

/// Primitive type a property is constrained to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
}

impl SchemaType {
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
        }
    }
}

/// Name of the JSON type actually present in a value, for error messages.
fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A single schema violation, anchored at a `/`-prefixed property path
/// (empty path means the root value).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

/// Outcome of validating one value against one schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

/// Constraints on a single property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertySchema {
    schema_type: SchemaType,
    description: Option<&'static str>,
    enum_values: Vec<&'static str>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    default: Option<Value>,
}

impl PropertySchema {
    fn typed(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            description: None,
            enum_values: Vec::new(),
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            default: None,
        }
    }

    pub fn string() -> Self {
        Self::typed(SchemaType::String)
    }

    pub fn number() -> Self {
        Self::typed(SchemaType::Number)
    }

    pub fn integer() -> Self {
        Self::typed(SchemaType::Integer)
    }

    pub fn boolean() -> Self {
        Self::typed(SchemaType::Boolean)
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Restrict the value to a fixed set of string literals.
    pub fn one_of(mut self, values: &[&'static str]) -> Self {
        self.enum_values = values.to_vec();
        self
    }

    pub fn minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Default recorded for the capability listing; applied by the typed
    /// input structs at deserialization, not by the validator.
    pub fn default_value(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    fn check(&self, path: &str, value: &Value, issues: &mut Vec<ValidationIssue>) {
        if !self.schema_type.matches(value) {
            issues.push(ValidationIssue::new(
                path,
                format!("expected {}, got {}", self.schema_type.name(), type_of(value)),
            ));
            return;
        }

        if !self.enum_values.is_empty() {
            let matches_enum = value
                .as_str()
                .is_some_and(|s| self.enum_values.iter().any(|candidate| *candidate == s));
            if !matches_enum {
                issues.push(ValidationIssue::new(
                    path,
                    format!("must be one of: {}", self.enum_values.join(", ")),
                ));
            }
        }

        if let Some(number) = value.as_f64() {
            if let Some(minimum) = self.minimum {
                if number < minimum {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("must be >= {minimum}"),
                    ));
                }
            }
            if let Some(maximum) = self.maximum {
                if number > maximum {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("must be <= {maximum}"),
                    ));
                }
            }
        }

        if let Some(text) = value.as_str() {
            let length = text.chars().count();
            if let Some(min_length) = self.min_length {
                if length < min_length {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("must be at least {min_length} characters"),
                    ));
                }
            }
            if let Some(max_length) = self.max_length {
                if length > max_length {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("must be at most {max_length} characters"),
                    ));
                }
            }
        }
    }

    fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".to_owned(), json!(self.schema_type.name()));
        if let Some(description) = self.description {
            out.insert("description".to_owned(), json!(description));
        }
        if !self.enum_values.is_empty() {
            out.insert("enum".to_owned(), json!(self.enum_values));
        }
        if let Some(minimum) = self.minimum {
            out.insert("minimum".to_owned(), json!(minimum));
        }
        if let Some(maximum) = self.maximum {
            out.insert("maximum".to_owned(), json!(maximum));
        }
        if let Some(min_length) = self.min_length {
            out.insert("minLength".to_owned(), json!(min_length));
        }
        if let Some(max_length) = self.max_length {
            out.insert("maxLength".to_owned(), json!(max_length));
        }
        if let Some(default) = &self.default {
            out.insert("default".to_owned(), default.clone());
        }
        Value::Object(out)
    }
}

/// Object schema: declared properties, required names, and whether unknown
/// keys are rejected. Property declaration order drives issue ordering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectSchema {
    properties: Vec<(String, PropertySchema)>,
    required: Vec<String>,
    deny_unknown: bool,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: &str, schema: PropertySchema) -> Self {
        self.properties.push((name.to_owned(), schema));
        self
    }

    pub fn required(mut self, names: &[&str]) -> Self {
        self.required = names.iter().map(|name| (*name).to_owned()).collect();
        self
    }

    /// Reject keys that are not declared properties
    /// (`additionalProperties: false`).
    pub fn deny_unknown(mut self) -> Self {
        self.deny_unknown = true;
        self
    }

    fn is_declared(&self, name: &str) -> bool {
        self.properties.iter().any(|(declared, _)| declared == name)
    }

    /// True when every required name is also a declared property. The
    /// registry enforces this at registration time.
    pub fn required_is_declared(&self) -> bool {
        self.required.iter().all(|name| self.is_declared(name))
    }

    /// Validate `value`, collecting every violation in one pass.
    ///
    /// Ordering: root type, then missing required fields in declaration
    /// order, then per-property constraints in declaration order, then
    /// unknown keys in the value's key order.
    pub fn validate(&self, value: &Value) -> ValidationReport {
        let mut issues = Vec::new();

        let Some(object) = value.as_object() else {
            issues.push(ValidationIssue::new(
                "",
                format!("expected object, got {}", type_of(value)),
            ));
            return ValidationReport { issues };
        };

        for name in &self.required {
            if !object.contains_key(name) {
                issues.push(ValidationIssue::new(
                    format!("/{name}"),
                    format!("missing required property `{name}`"),
                ));
            }
        }

        for (name, property) in &self.properties {
            if let Some(present) = object.get(name) {
                property.check(&format!("/{name}"), present, &mut issues);
            }
        }

        if self.deny_unknown {
            for key in object.keys() {
                if !self.is_declared(key) {
                    issues.push(ValidationIssue::new(
                        format!("/{key}"),
                        format!("unknown property `{key}`"),
                    ));
                }
            }
        }

        ValidationReport { issues }
    }

    /// JSON-Schema-shaped value for the capability listing.
    pub fn to_value(&self) -> Value {
        let mut properties = Map::new();
        for (name, property) in &self.properties {
            properties.insert(name.clone(), property.to_value());
        }

        let mut out = Map::new();
        out.insert("type".to_owned(), json!("object"));
        out.insert("properties".to_owned(), Value::Object(properties));
        if !self.required.is_empty() {
            out.insert("required".to_owned(), json!(self.required));
        }
        if self.deny_unknown {
            out.insert("additionalProperties".to_owned(), json!(false));
        }
        Value::Object(out)
    }
}
