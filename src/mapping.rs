//! Declarative field mapping engine.
//!
//! Projects a source record into a fresh target record according to an
//! ordered list of [`FieldMapping`] rules.

use crate::path::{FieldPath, PathError};
use crate::transform_registry::{Transform, TransformError};
use serde_json::{Map, Value};
use std::fmt;

/// Where a mapping reads its value from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceField {
    /// A single dotted path
    Path(FieldPath),
    /// Candidate paths tried left to right; the first defined value wins
    Fallback(Vec<FieldPath>),
}

impl SourceField {
    /// Resolve the source value, short-circuiting on the first defined
    /// candidate.
    pub fn resolve<'a>(&self, source: &'a Value) -> Option<&'a Value> {
        match self {
            SourceField::Path(path) => path.read(source),
            SourceField::Fallback(paths) => paths.iter().find_map(|path| path.read(source)),
        }
    }

    /// Every candidate path, in resolution order
    pub fn paths(&self) -> &[FieldPath] {
        match self {
            SourceField::Path(path) => std::slice::from_ref(path),
            SourceField::Fallback(paths) => paths,
        }
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceField::Path(path) => write!(f, "{}", path),
            SourceField::Fallback(paths) => {
                let raw: Vec<&str> = paths.iter().map(|p| p.raw.as_str()).collect();
                write!(f, "[{}]", raw.join(", "))
            }
        }
    }
}

impl From<&str> for SourceField {
    fn from(path: &str) -> Self {
        SourceField::Path(FieldPath::from_dotted(path))
    }
}

impl From<Vec<&str>> for SourceField {
    fn from(paths: Vec<&str>) -> Self {
        SourceField::Fallback(paths.into_iter().map(FieldPath::from_dotted).collect())
    }
}

/// A rule copying one (possibly transformed) source value to a target path.
///
/// Mapping tables are static configuration: built once per provider
/// operation and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub source: SourceField,
    pub target: FieldPath,
    pub transform: Option<Transform>,
}

impl FieldMapping {
    pub fn new(source: impl Into<SourceField>, target: &str) -> Self {
        Self {
            source: source.into(),
            target: FieldPath::from_dotted(target),
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Resolve and transform this rule's value, `None` when nothing resolves.
    fn evaluate(&self, source: &Value) -> Result<Option<Value>, MappingError> {
        let Some(value) = self.source.resolve(source) else {
            return Ok(None);
        };

        match &self.transform {
            Some(transform) => transform
                .apply(value)
                .map(Some)
                .map_err(|source_err| MappingError::Transform {
                    target: self.target.raw.clone(),
                    source: source_err,
                }),
            None => Ok(Some(value.clone())),
        }
    }
}

/// Error type for mapping operations
#[derive(Debug, Clone, PartialEq)]
pub enum MappingError {
    Transform { target: String, source: TransformError },
    Write(PathError),
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::Transform { target, source } => {
                write!(f, "Failed to map '{}': {}", target, source)
            }
            MappingError::Write(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for MappingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MappingError::Transform { source, .. } => Some(source),
            MappingError::Write(err) => Some(err),
        }
    }
}

impl From<PathError> for MappingError {
    fn from(err: PathError) -> Self {
        MappingError::Write(err)
    }
}

/// Map `source` into a new record according to `mappings`.
///
/// Rules run in list order; a later rule writing the same target
/// overwrites an earlier one. A rule whose source does not resolve leaves
/// its target key absent, and its transform is never called.
///
/// # Example
///
/// ```
/// use mvnomap::{map_with_config, FieldMapping};
/// use serde_json::json;
///
/// let source = json!({"profile": {"userId": "123"}});
/// let config = vec![FieldMapping::new(vec!["user.id", "profile.userId"], "id")];
///
/// let result = map_with_config(&source, &config).unwrap();
/// assert_eq!(result, json!({"id": "123"}));
/// ```
pub fn map_with_config(source: &Value, mappings: &[FieldMapping]) -> Result<Value, MappingError> {
    let mut result = Value::Object(Map::new());

    for mapping in mappings {
        if let Some(value) = mapping.evaluate(source)? {
            mapping.target.write(&mut result, value)?;
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform_registry::{TransformRegistry, ValueKind};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_map_simple_fields() {
        let source = json!({"name": "John", "age": 30});
        let config = vec![
            FieldMapping::new("name", "userName"),
            FieldMapping::new("age", "userAge"),
        ];

        let result = map_with_config(&source, &config).unwrap();

        assert_eq!(result, json!({"userName": "John", "userAge": 30}));
    }

    #[test]
    fn test_map_nested_fields() {
        let source = json!({
            "user": {
                "id": "123",
                "profile": {"name": "Jane", "email": "jane@example.com"}
            }
        });
        let config = vec![
            FieldMapping::new("user.id", "userId"),
            FieldMapping::new("user.profile.name", "userName"),
            FieldMapping::new("user.profile.email", "userEmail"),
        ];

        let result = map_with_config(&source, &config).unwrap();

        assert_eq!(
            result,
            json!({"userId": "123", "userName": "Jane", "userEmail": "jane@example.com"})
        );
    }

    #[test]
    fn test_creates_nested_target_structure() {
        let source = json!({"firstName": "John", "lastName": "Doe", "email": "john@example.com"});
        let config = vec![
            FieldMapping::new("firstName", "user.name.first"),
            FieldMapping::new("lastName", "user.name.last"),
            FieldMapping::new("email", "user.contact.email"),
        ];

        let result = map_with_config(&source, &config).unwrap();

        assert_eq!(
            result,
            json!({
                "user": {
                    "name": {"first": "John", "last": "Doe"},
                    "contact": {"email": "john@example.com"}
                }
            })
        );
    }

    #[test]
    fn test_fallback_takes_first_defined() {
        let source = json!({"primaryPhone": "555-1234", "contactPhone": "555-5678"});
        let config = vec![FieldMapping::new(
            vec!["secondaryPhone", "primaryPhone", "contactPhone"],
            "phone",
        )];

        let result = map_with_config(&source, &config).unwrap();

        assert_eq!(result, json!({"phone": "555-1234"}));
    }

    #[test]
    fn test_undefined_values_are_absent() {
        let source = json!({"name": "John"});
        let config = vec![
            FieldMapping::new("name", "userName"),
            FieldMapping::new("age", "userAge"),
        ];

        let result = map_with_config(&source, &config).unwrap();

        assert_eq!(result, json!({"userName": "John"}));
        assert!(result.get("userAge").is_none());
    }

    #[test]
    fn test_transform_not_called_for_undefined() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let counting = Transform::new(
            "counting",
            ValueKind::Any,
            ValueKind::Any,
            move |v: &Value| -> Result<Value, TransformError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(v.clone())
            },
        );
        let config = vec![
            FieldMapping::new("missing", "a").with_transform(counting.clone()),
            FieldMapping::new("present", "b").with_transform(counting),
        ];

        let result = map_with_config(&json!({"present": 1}), &config).unwrap();

        assert_eq!(result, json!({"b": 1}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transform_applied_before_write() {
        let registry = TransformRegistry::with_builtins();
        let config = vec![FieldMapping::new("amount", "charge.amount")
            .with_transform(registry.get("to_number").unwrap().clone())];

        let result = map_with_config(&json!({"amount": "0.05"}), &config).unwrap();

        assert_eq!(result, json!({"charge": {"amount": 0.05}}));
    }

    #[test]
    fn test_transform_kind_mismatch_names_target() {
        let registry = TransformRegistry::with_builtins();
        let config = vec![FieldMapping::new("amount", "charge.amount")
            .with_transform(registry.get("to_number").unwrap().clone())];

        let err = map_with_config(&json!({"amount": 5}), &config).unwrap_err();

        assert!(matches!(err, MappingError::Transform { ref target, .. } if target == "charge.amount"));
    }

    #[test]
    fn test_colliding_targets_overwrite_in_order() {
        let source = json!({"a": 1, "b": 2});
        let config = vec![FieldMapping::new("a", "x"), FieldMapping::new("b", "x")];

        let result = map_with_config(&source, &config).unwrap();

        assert_eq!(result, json!({"x": 2}));
    }

    #[test]
    fn test_writing_below_a_scalar_target_fails() {
        let source = json!({"a": 1, "b": 2});
        let config = vec![FieldMapping::new("a", "x"), FieldMapping::new("b", "x.y")];

        let err = map_with_config(&source, &config).unwrap_err();

        assert!(matches!(err, MappingError::Write(PathError::NotAContainer { .. })));
    }

    #[test]
    fn test_source_is_not_mutated() {
        let source = json!({"user": {"id": "1"}});
        let before = source.clone();
        let config = vec![FieldMapping::new("user", "copy")];

        let result = map_with_config(&source, &config).unwrap();

        assert_eq!(source, before);
        assert_eq!(result, json!({"copy": {"id": "1"}}));
    }

    #[test]
    fn test_source_field_display() {
        assert_eq!(SourceField::from("a.b").to_string(), "a.b");
        assert_eq!(SourceField::from(vec!["a", "b.c"]).to_string(), "[a, b.c]");
    }
}
