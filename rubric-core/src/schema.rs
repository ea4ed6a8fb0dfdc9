//! Declarative payload schemas and the shared validation routine.
//!
//! Each handler describes the required shape of its answer key and its
//! submission with one [`Schema`] value; [`validate`] checks an incoming
//! JSON payload against it and reports every violated rule at once, so a
//! caller can fix a malformed request in a single round trip.

use std::fmt;

use serde_json::Value;

/// A named shape description for one payload kind.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Human-readable name used in error messages, e.g. "numeric answer key".
    pub title: &'static str,
    pub kind: Kind,
}

/// The shape a JSON value must have.
#[derive(Debug, Clone)]
pub enum Kind {
    Object(ObjectSchema),
    Array(ArraySchema),
    String,
    /// A string with one accepted value (type tags).
    StringConst(&'static str),
    Number,
    Boolean,
    /// Any primitive: string, number, or boolean.
    Scalar,
    /// At least one of the alternatives must accept the value.
    AnyOf(Vec<Kind>),
    Any,
}

/// Shape of a JSON object: required keys, known properties, and the policy
/// for properties not listed.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub required: Vec<&'static str>,
    pub properties: Vec<(&'static str, Kind)>,
    pub additional: Additional,
}

/// Policy for object properties not named in `properties`.
#[derive(Debug, Clone, Default)]
pub enum Additional {
    /// Unknown properties are ignored.
    #[default]
    Allow,
    /// Unknown properties are violations.
    Deny,
    /// Unknown properties must match this shape (keyed collections).
    Schema(Box<Kind>),
}

/// Shape of a JSON array.
#[derive(Debug, Clone)]
pub struct ArraySchema {
    pub items: Box<Kind>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

/// One violated rule, by JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A payload that failed its schema, with the full violated-rule list.
#[derive(Debug)]
pub struct ValidationError {
    pub target: String,
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed schema validation", self.target)?;
        for violation in &self.violations {
            write!(f, "; {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Validate `value` against `schema`, collecting every violation.
pub fn validate(value: &Value, schema: &Schema) -> Result<(), ValidationError> {
    let mut violations = Vec::new();
    check(value, &schema.kind, "$", &mut violations);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            target: schema.title.to_string(),
            violations,
        })
    }
}

fn check(value: &Value, kind: &Kind, path: &str, violations: &mut Vec<Violation>) {
    match kind {
        Kind::Any => {}
        Kind::String => {
            if !value.is_string() {
                push(violations, path, "expected a string");
            }
        }
        Kind::StringConst(expected) => match value.as_str() {
            Some(s) if s == *expected => {}
            _ => push(violations, path, &format!("expected the string '{expected}'")),
        },
        Kind::Number => {
            if !value.is_number() {
                push(violations, path, "expected a number");
            }
        }
        Kind::Boolean => {
            if !value.is_boolean() {
                push(violations, path, "expected a boolean");
            }
        }
        Kind::Scalar => {
            if !(value.is_string() || value.is_number() || value.is_boolean()) {
                push(violations, path, "expected a string, number, or boolean");
            }
        }
        Kind::AnyOf(alternatives) => {
            let accepted = alternatives.iter().any(|alternative| {
                let mut scratch = Vec::new();
                check(value, alternative, path, &mut scratch);
                scratch.is_empty()
            });
            if !accepted {
                push(violations, path, "matched none of the accepted shapes");
            }
        }
        Kind::Array(array) => {
            let Some(items) = value.as_array() else {
                push(violations, path, "expected an array");
                return;
            };
            if let Some(min) = array.min_items {
                if items.len() < min {
                    push(violations, path, &format!("expected at least {min} items"));
                }
            }
            if let Some(max) = array.max_items {
                if items.len() > max {
                    push(violations, path, &format!("expected at most {max} items"));
                }
            }
            for (index, item) in items.iter().enumerate() {
                check(item, &array.items, &format!("{path}[{index}]"), violations);
            }
        }
        Kind::Object(object) => {
            let Some(map) = value.as_object() else {
                push(violations, path, "expected an object");
                return;
            };
            for required in &object.required {
                if !map.contains_key(*required) {
                    push(
                        violations,
                        &format!("{path}.{required}"),
                        "required property is missing",
                    );
                }
            }
            for (key, entry) in map {
                let entry_path = format!("{path}.{key}");
                match object.properties.iter().find(|(name, _)| name == key) {
                    Some((_, property_kind)) => check(entry, property_kind, &entry_path, violations),
                    None => match &object.additional {
                        Additional::Allow => {}
                        Additional::Deny => push(violations, &entry_path, "unexpected property"),
                        Additional::Schema(extra_kind) => {
                            check(entry, extra_kind, &entry_path, violations);
                        }
                    },
                }
            }
        }
    }
}

fn push(violations: &mut Vec<Violation>, path: &str, message: &str) {
    violations.push(Violation {
        path: path.to_string(),
        message: message.to_string(),
    });
}
