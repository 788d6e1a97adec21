//! Declarative shape checks for path variables and JSON bodies.
//!
//! A [`Schema`] describes an object: for each declared field whether it is
//! required, which JSON type it must have and which format constraints it
//! carries. [`Schema::validate`] is total: every input yields a
//! [`ValidationResult`], malformed input is reported as errors.
//!
//! ```rust
//! use margin::schema::{FieldType, Format, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::object()
//!     .required("text", FieldType::String)
//!     .with_format("text", Format::NonEmpty);
//!
//! assert!(schema.validate(&json!({ "text": "hello" })).is_ok());
//! assert!(!schema.validate(&json!({ "text": "" })).is_ok());
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// JSON type a field must have.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldType {
    Array,
    Boolean,
    Integer,
    Number,
    Object,
    String,
}

impl FieldType {
    fn name(self) -> &'static str {
        match self {
            Self::Array   => "array",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number  => "number",
            Self::Object  => "object",
            Self::String  => "string",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Array   => value.is_array(),
            Self::Boolean => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number  => value.is_number(),
            Self::Object  => value.is_object(),
            Self::String  => value.is_string(),
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "array"   => Some(Self::Array),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number"  => Some(Self::Number),
            "object"  => Some(Self::Object),
            "string"  => Some(Self::String),
            _         => None,
        }
    }
}

/// Extra constraint on a string field. Ignored for other types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    NonEmpty,
    Uuid,
    MinLength(usize),
    MaxLength(usize),
}

impl Format {
    fn check(self, s: &str) -> Option<String> {
        match self {
            Self::NonEmpty if s.is_empty() => Some("must not be empty".to_owned()),
            Self::Uuid if Uuid::parse_str(s).is_err() => Some("must be a uuid".to_owned()),
            Self::MinLength(n) if s.chars().count() < n => {
                Some(format!("must be at least {n} characters"))
            }
            Self::MaxLength(n) if s.chars().count() > n => {
                Some(format!("must be at most {n} characters"))
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
struct FieldRule {
    name: String,
    required: bool,
    kind: FieldType,
    formats: Vec<Format>,
}

/// Declared shape of a JSON object.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    fields: Vec<FieldRule>,
    deny_additional: bool,
}

impl Schema {
    /// An object schema with no declared fields.
    pub fn object() -> Self {
        Self::default()
    }

    pub fn required(self, name: &str, kind: FieldType) -> Self {
        self.field(name, kind, true)
    }

    pub fn optional(self, name: &str, kind: FieldType) -> Self {
        self.field(name, kind, false)
    }

    /// Adds a format constraint to an already declared field.
    pub fn with_format(mut self, name: &str, format: Format) -> Self {
        if let Some(rule) = self.fields.iter_mut().find(|r| r.name == name) {
            rule.formats.push(format);
        }
        self
    }

    /// Whether undeclared fields are accepted. Defaults to `true`.
    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.deny_additional = !allowed;
        self
    }

    fn field(mut self, name: &str, kind: FieldType, required: bool) -> Self {
        self.fields.retain(|r| r.name != name);
        self.fields.push(FieldRule { name: name.to_owned(), required, kind, formats: Vec::new() });
        self
    }

    /// Builds a schema from a JSON-Schema document.
    ///
    /// Understands `properties.*.type`, `required`, `minLength`, `maxLength`,
    /// `format: "uuid"` and `additionalProperties: false`. Other keywords are
    /// ignored; a property without a known `type` is treated as a string.
    pub fn from_json_schema(doc: &Value) -> Self {
        let required: Vec<&str> = doc.get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut schema = Self::object();
        if let Some(properties) = doc.get("properties").and_then(Value::as_object) {
            for (name, prop) in properties {
                let kind = prop.get("type")
                    .and_then(Value::as_str)
                    .and_then(FieldType::from_keyword)
                    .unwrap_or(FieldType::String);
                schema = schema.field(name, kind, required.contains(&name.as_str()));

                if prop.get("format").and_then(Value::as_str) == Some("uuid") {
                    schema = schema.with_format(name, Format::Uuid);
                }
                if let Some(n) = prop.get("minLength").and_then(Value::as_u64) {
                    schema = schema.with_format(name, Format::MinLength(n as usize));
                }
                if let Some(n) = prop.get("maxLength").and_then(Value::as_u64) {
                    schema = schema.with_format(name, Format::MaxLength(n as usize));
                }
            }
        }
        // A name listed as required but never described still has to be present.
        for name in required {
            if !schema.fields.iter().any(|r| r.name == name) {
                schema = schema.field(name, FieldType::String, true);
            }
        }
        if doc.get("additionalProperties") == Some(&Value::Bool(false)) {
            schema = schema.additional_properties(false);
        }
        schema
    }

    /// Checks `value` against this schema, collecting every failure in
    /// declaration order.
    pub fn validate(&self, value: &Value) -> ValidationResult {
        let Some(object) = value.as_object() else {
            return ValidationResult {
                errors: vec![FieldError::new("", "must be an object")],
            };
        };
        ValidationResult { errors: self.check_object(object) }
    }

    fn check_object(&self, object: &Map<String, Value>) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for rule in &self.fields {
            match object.get(&rule.name) {
                None | Some(Value::Null) if rule.required => {
                    errors.push(FieldError::new(&rule.name, "is required"));
                }
                None | Some(Value::Null) => {}
                Some(v) if !rule.kind.accepts(v) => {
                    errors.push(FieldError::new(
                        &rule.name,
                        format!("must be of type {}", rule.kind.name()),
                    ));
                }
                Some(Value::String(s)) => {
                    if let Some(reason) = rule.formats.iter().find_map(|f| f.check(s)) {
                        errors.push(FieldError::new(&rule.name, reason));
                    }
                }
                Some(_) => {}
            }
        }
        if self.deny_additional {
            for key in object.keys() {
                if !self.fields.iter().any(|r| &r.name == key) {
                    errors.push(FieldError::new(key, "is not allowed"));
                }
            }
        }
        errors
    }
}

/// One failed check.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { field: field.into(), reason: reason.into() }
    }
}

/// Outcome of [`Schema::validate`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ValidationResult {
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
