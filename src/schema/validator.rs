//! Schema validation.
//!
//! Validation is all-or-nothing: every issue in the record is collected,
//! and a validated copy is returned only when there are none.

use crate::schema::error::{Issue, IssueCode, ValidationError};
use crate::schema::types::{Coercion, ObjectSchema, Refinement, Schema, StringSchema, UnknownKeys};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};

/// Validate `data` against `schema`.
///
/// Returns a fresh validated copy (undeclared keys stripped and coercions
/// applied according to the schema) or every issue found.
///
/// # Example
///
/// ```
/// use mvnomap::schema::{validate, ObjectSchema, Schema};
/// use serde_json::json;
///
/// let schema = Schema::Object(ObjectSchema::new().required("msisdn", Schema::string()));
///
/// assert!(validate(&schema, &json!({"msisdn": "+46701234567"})).is_ok());
/// let err = validate(&schema, &json!({})).unwrap_err();
/// assert_eq!(err.issues[0].dotted_path(), "msisdn");
/// ```
pub fn validate(schema: &Schema, data: &Value) -> Result<Value, ValidationError> {
    let mut issues = Vec::new();
    let mut path = Vec::new();
    let validated = check(schema, data, &mut path, &mut issues);

    if issues.is_empty() {
        Ok(validated)
    } else {
        Err(ValidationError::new(issues))
    }
}

fn check(schema: &Schema, value: &Value, path: &mut Vec<String>, issues: &mut Vec<Issue>) -> Value {
    match (schema, value) {
        (Schema::Any, _) => value.clone(),
        (Schema::String(string), Value::String(s)) => check_string(string, s, path, issues),
        (Schema::Number, Value::Number(_)) => value.clone(),
        (Schema::Integer, Value::Number(n)) => {
            if !is_integer(n) {
                issues.push(Issue::new(
                    path,
                    invalid_type("integer", "float"),
                    "Expected integer, received float",
                ));
            }
            value.clone()
        }
        (Schema::Boolean, Value::Bool(_)) => value.clone(),
        (Schema::Object(object), Value::Object(map)) => check_object(object, map, path, issues),
        (Schema::Array(items), Value::Array(values)) => {
            let mut out = Vec::with_capacity(values.len());
            for (index, item) in values.iter().enumerate() {
                path.push(index.to_string());
                out.push(check(items, item, path, issues));
                path.pop();
            }
            Value::Array(out)
        }
        (schema, value) => {
            let received = received_name(value);
            issues.push(Issue::new(
                path,
                invalid_type(schema.type_name(), received),
                format!("Expected {}, received {}", schema.type_name(), received),
            ));
            Value::Null
        }
    }
}

fn check_object(
    schema: &ObjectSchema,
    map: &Map<String, Value>,
    path: &mut Vec<String>,
    issues: &mut Vec<Issue>,
) -> Value {
    let mut out = Map::new();

    for (name, field) in &schema.fields {
        path.push(name.clone());
        match map.get(name) {
            Some(value) => {
                out.insert(name.clone(), check(&field.schema, value, path, issues));
            }
            None if field.required => issues.push(Issue::new(
                path,
                invalid_type(field.schema.type_name(), "undefined"),
                "Required",
            )),
            None => {}
        }
        path.pop();
    }

    let unknown: Vec<&String> = map.keys().filter(|k| !schema.fields.contains_key(*k)).collect();
    match schema.unknown_keys {
        UnknownKeys::Strip => {}
        UnknownKeys::Passthrough => {
            for key in unknown {
                out.insert(key.clone(), map[key].clone());
            }
        }
        UnknownKeys::Strict if !unknown.is_empty() => {
            let keys: Vec<String> = unknown.into_iter().cloned().collect();
            let message = format!("Unrecognized key(s) in object: {}", keys.join(", "));
            issues.push(Issue::new(path, IssueCode::UnrecognizedKeys { keys }, message));
        }
        UnknownKeys::Strict => {}
    }

    Value::Object(out)
}

fn check_string(
    schema: &StringSchema,
    s: &str,
    path: &[String],
    issues: &mut Vec<Issue>,
) -> Value {
    for refinement in &schema.refinements {
        match refinement {
            Refinement::Date { message } => {
                if !is_parseable_date(s) {
                    let message = message
                        .clone()
                        .unwrap_or_else(|| format!("Invalid date: '{}'", s));
                    issues.push(Issue::new(path, IssueCode::InvalidDate, message));
                }
            }
            Refinement::Pattern(regex) => {
                if !regex.is_match(s) {
                    issues.push(Issue::new(
                        path,
                        IssueCode::InvalidString {
                            validation: "regex".to_string(),
                        },
                        format!("Does not match pattern {}", regex.as_str()),
                    ));
                }
            }
            Refinement::NonEmpty => {
                if s.is_empty() {
                    issues.push(Issue::new(
                        path,
                        IssueCode::InvalidString {
                            validation: "non_empty".to_string(),
                        },
                        "String must contain at least 1 character",
                    ));
                }
            }
        }
    }

    match schema.coerce {
        None => Value::String(s.to_string()),
        Some(Coercion::Number) => match s.trim().parse::<f64>().ok().and_then(Number::from_f64) {
            Some(n) => Value::Number(n),
            None => {
                issues.push(Issue::new(
                    path,
                    IssueCode::InvalidString {
                        validation: "numeric".to_string(),
                    },
                    format!("Expected a numeric string, received '{}'", s),
                ));
                Value::Null
            }
        },
    }
}

fn invalid_type(expected: &str, received: &str) -> IssueCode {
    IssueCode::InvalidType {
        expected: expected.to_string(),
        received: received.to_string(),
    }
}

fn received_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_integer(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%d %b %Y", "%b %d, %Y"];

/// True when `s` is a date or date-time in one of the accepted notations:
/// RFC 3339, RFC 2822, ISO 8601 local date-times and plain calendar dates.
pub fn is_parseable_date(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() {
        return false;
    }

    DateTime::parse_from_rfc3339(s).is_ok()
        || DateTime::parse_from_rfc2822(s).is_ok()
        || DATE_TIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(s, format).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|format| NaiveDate::parse_from_str(s, format).is_ok())
}
