//! Request schema validation.
//!
//! A [`Schema`] is plain data: an ordered list of [`FieldRule`]s. [`validate`]
//! interprets it against a JSON candidate (path params merged with the body)
//! and returns either the normalized object or a [`SchemaError`] naming the
//! first failing field together with every collected field error.
//!
//! Format rules (`username`, `phone`) are predicate + normalizer pairs living
//! in their own modules; the interpreter only dispatches to them.

pub mod phone;
pub mod username;

use mongodb::bson::oid::ObjectId;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

/// Outcome of a failed format rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatViolation {
    pub code: &'static str,
    /// Rendered after the quoted field label
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// 24 hex characters
    ObjectId,
    UuidV4,
    Username,
    PhoneNumber { mobile_only: bool },
}

impl Format {
    fn apply(self, value: &str) -> Result<String, FormatViolation> {
        match self {
            Format::ObjectId => ObjectId::parse_str(value)
                .map(|_| value.to_string())
                .map_err(|_| FormatViolation {
                    code: "string.objectId",
                    message: "must be a valid id",
                }),
            Format::UuidV4 => match Uuid::parse_str(value) {
                Ok(uuid) if uuid.get_version_num() == 4 => Ok(value.to_string()),
                _ => Err(FormatViolation {
                    code: "string.guid",
                    message: "must be a valid GUID",
                }),
            },
            Format::Username => username::normalize(value),
            Format::PhoneNumber { mobile_only } => phone::normalize(value, mobile_only),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    String {
        min: Option<usize>,
        max: Option<usize>,
        trim: bool,
        format: Option<Format>,
    },
    Integer {
        min: Option<i64>,
        max: Option<i64>,
        allowed: Option<&'static [i64]>,
    },
}

/// Constraints for a single field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: Kind,
    pub required: bool,
    pub nullable: bool,
}

impl FieldRule {
    pub fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: Kind::String {
                min: None,
                max: None,
                trim: false,
                format: None,
            },
            required: false,
            nullable: false,
        }
    }

    pub fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: Kind::Integer {
                min: None,
                max: None,
                allowed: None,
            },
            required: false,
            nullable: false,
        }
    }

    pub fn object_id(name: &'static str) -> Self {
        Self::string(name).format(Format::ObjectId)
    }

    pub fn uuid_v4(name: &'static str) -> Self {
        Self::string(name).format(Format::UuidV4)
    }

    pub fn username(name: &'static str) -> Self {
        Self::string(name).format(Format::Username)
    }

    pub fn mobile_number(name: &'static str) -> Self {
        Self::string(name).format(Format::PhoneNumber { mobile_only: true })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Inclusive character-length bounds for strings
    pub fn length(mut self, range: (usize, usize)) -> Self {
        if let Kind::String { min, max, .. } = &mut self.kind {
            *min = Some(range.0);
            *max = Some(range.1);
        }
        self
    }

    pub fn max_length(mut self, limit: usize) -> Self {
        if let Kind::String { max, .. } = &mut self.kind {
            *max = Some(limit);
        }
        self
    }

    pub fn trim(mut self) -> Self {
        if let Kind::String { trim, .. } = &mut self.kind {
            *trim = true;
        }
        self
    }

    pub fn format(mut self, rule: Format) -> Self {
        if let Kind::String { format, .. } = &mut self.kind {
            *format = Some(rule);
        }
        self
    }

    /// Inclusive numeric bounds for integers
    pub fn range(mut self, range: (i64, i64)) -> Self {
        if let Kind::Integer { min, max, .. } = &mut self.kind {
            *min = Some(range.0);
            *max = Some(range.1);
        }
        self
    }

    pub fn one_of(mut self, values: &'static [i64]) -> Self {
        if let Kind::Integer { allowed, .. } = &mut self.kind {
            *allowed = Some(values);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<FieldRule>,
}

impl Schema {
    pub fn new(fields: Vec<FieldRule>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    fn knows(&self, key: &str) -> bool {
        self.fields.iter().any(|rule| rule.name == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Stop at the first failing field instead of collecting all of them
    pub abort_early: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self { abort_early: true }
    }
}

/// A request that failed its schema
#[derive(Debug, Clone)]
pub struct SchemaError {
    /// First failing field, in schema order
    pub field: String,
    pub code: Cow<'static, str>,
    pub message: String,
    pub errors: ValidationErrors,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SchemaError {}

struct Collector {
    first: Option<(String, Cow<'static, str>, String)>,
    errors: ValidationErrors,
}

impl Collector {
    fn new() -> Self {
        Self {
            first: None,
            errors: ValidationErrors::new(),
        }
    }

    fn push(&mut self, field: &'static str, label: &str, code: &'static str, message: String) {
        let mut error = ValidationError::new(code);
        error.message = Some(Cow::Owned(message.clone()));
        if field != label {
            error.add_param(Cow::Borrowed("key"), &label);
        }
        self.errors.add(field, error);

        if self.first.is_none() {
            self.first = Some((label.to_string(), Cow::Borrowed(code), message));
        }
    }

    fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    fn finish(self) -> Option<SchemaError> {
        let errors = self.errors;
        self.first.map(|(field, code, message)| SchemaError {
            field,
            code,
            message,
            errors,
        })
    }
}

fn label(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Check one present, non-null value. Returns the normalized value.
fn check_value(rule: &FieldRule, value: &Value) -> Result<Value, (&'static str, String)> {
    let name = label(rule.name);

    match &rule.kind {
        Kind::String {
            min,
            max,
            trim,
            format,
        } => {
            let raw = value
                .as_str()
                .ok_or_else(|| ("string.base", format!("{} must be a string", name)))?;
            let text = if *trim { raw.trim() } else { raw };
            let length = text.chars().count();

            if length == 0 && min.map_or(true, |m| m > 0) {
                return Err(("string.empty", format!("{} is not allowed to be empty", name)));
            }
            if let Some(min) = min {
                if length < *min {
                    return Err((
                        "string.min",
                        format!("{} length must be at least {} characters long", name, min),
                    ));
                }
            }
            if let Some(max) = max {
                if length > *max {
                    return Err((
                        "string.max",
                        format!(
                            "{} length must be less than or equal to {} characters long",
                            name, max
                        ),
                    ));
                }
            }

            let normalized = match format {
                Some(format) => format
                    .apply(text)
                    .map_err(|v| (v.code, format!("{} {}", name, v.message)))?,
                None => text.to_string(),
            };

            Ok(Value::String(normalized))
        }
        Kind::Integer { min, max, allowed } => {
            // Path segments arrive as strings; accept their numeric spelling
            let number = match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(|| ("number.base", format!("{} must be an integer", name)))?;

            if let Some(allowed) = allowed {
                if !allowed.contains(&number) {
                    return Err((
                        "any.only",
                        format!("{} must be one of {:?}", name, allowed),
                    ));
                }
            }
            if let Some(min) = min {
                if number < *min {
                    return Err((
                        "number.min",
                        format!("{} must be greater than or equal to {}", name, min),
                    ));
                }
            }
            if let Some(max) = max {
                if number > *max {
                    return Err((
                        "number.max",
                        format!("{} must be less than or equal to {}", name, max),
                    ));
                }
            }

            Ok(Value::from(number))
        }
    }
}

/// Validate `candidate` against `schema`.
///
/// Unknown keys are rejected. Optional fields that are absent stay absent;
/// nullable fields keep an explicit `null`.
pub fn validate(
    schema: &Schema,
    candidate: &Value,
    options: ValidateOptions,
) -> Result<Map<String, Value>, SchemaError> {
    let mut collector = Collector::new();
    let mut output = Map::new();

    let Some(object) = candidate.as_object() else {
        let message = "\"value\" must be of type object".to_string();
        let mut error = ValidationError::new("object.base");
        error.message = Some(Cow::Owned(message.clone()));
        let mut errors = ValidationErrors::new();
        errors.add("value", error);
        return Err(SchemaError {
            field: "value".to_string(),
            code: Cow::Borrowed("object.base"),
            message,
            errors,
        });
    };

    for rule in schema.fields() {
        match object.get(rule.name) {
            None => {
                if rule.required {
                    collector.push(
                        rule.name,
                        rule.name,
                        "any.required",
                        format!("{} is required", label(rule.name)),
                    );
                }
            }
            Some(Value::Null) if rule.nullable => {
                output.insert(rule.name.to_string(), Value::Null);
            }
            Some(value) => match check_value(rule, value) {
                Ok(normalized) => {
                    output.insert(rule.name.to_string(), normalized);
                }
                Err((code, message)) => collector.push(rule.name, rule.name, code, message),
            },
        }

        if options.abort_early && !collector.is_empty() {
            break;
        }
    }

    if collector.is_empty() || !options.abort_early {
        for key in object.keys() {
            if !schema.knows(key) {
                collector.push(
                    "unknown",
                    key,
                    "object.unknown",
                    format!("{} is not allowed", label(key)),
                );
                if options.abort_early {
                    break;
                }
            }
        }
    }

    match collector.finish() {
        Some(err) => Err(err),
        None => Ok(output),
    }
}

/// Validate and deserialize into the route's request type
pub fn validate_into<T: DeserializeOwned>(
    schema: &Schema,
    candidate: &Value,
    options: ValidateOptions,
) -> crate::error::Result<T> {
    let normalized = validate(schema, candidate, options)?;
    Ok(serde_json::from_value(Value::Object(normalized))?)
}
