//! Transform registry for named, typed value transforms.
//!
//! A field mapping never stores an anonymous closure. It stores a
//! [`Transform`]: a registered name, the kind of value it accepts, the kind
//! of value it produces, and the function itself. Mapping tables loaded from
//! YAML refer to transforms by name and are resolved against a
//! [`TransformRegistry`] at load time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shape of a JSON value, used to declare transform inputs and outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Bool,
    Object,
    Array,
    Null,
    /// Accepts every kind
    Any,
}

impl ValueKind {
    /// Kind of a concrete value (never `Any`)
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Bool,
            Value::Object(_) => ValueKind::Object,
            Value::Array(_) => ValueKind::Array,
            Value::Null => ValueKind::Null,
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        self == ValueKind::Any || self == ValueKind::of(value)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Bool => "boolean",
            ValueKind::Object => "object",
            ValueKind::Array => "array",
            ValueKind::Null => "null",
            ValueKind::Any => "any",
        };
        write!(f, "{}", name)
    }
}

/// Error type for transform operations
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    NotFound(String),
    InputKind {
        transform: String,
        expected: ValueKind,
        actual: ValueKind,
    },
    OutputKind {
        transform: String,
        expected: ValueKind,
        actual: ValueKind,
    },
    ExecutionError(String),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::NotFound(name) => write!(f, "Transform not found: {}", name),
            TransformError::InputKind { transform, expected, actual } => write!(
                f,
                "Transform '{}' expects {} input, received {}",
                transform, expected, actual
            ),
            TransformError::OutputKind { transform, expected, actual } => write!(
                f,
                "Transform '{}' declared {} output, produced {}",
                transform, expected, actual
            ),
            TransformError::ExecutionError(msg) => write!(f, "Execution error: {}", msg),
        }
    }
}

impl std::error::Error for TransformError {}

/// Trait for transformation functions
pub trait TransformFn: Send + Sync {
    /// Transform a resolved (defined) source value
    fn execute(&self, value: &Value) -> Result<Value, TransformError>;
}

/// Simple function-based implementation of TransformFn
impl<F> TransformFn for F
where
    F: Fn(&Value) -> Result<Value, TransformError> + Send + Sync,
{
    fn execute(&self, value: &Value) -> Result<Value, TransformError> {
        self(value)
    }
}

/// A named transform with declared input and output kinds
#[derive(Clone)]
pub struct Transform {
    name: String,
    input: ValueKind,
    output: ValueKind,
    func: Arc<dyn TransformFn>,
}

impl Transform {
    pub fn new<F>(name: impl Into<String>, input: ValueKind, output: ValueKind, func: F) -> Self
    where
        F: TransformFn + 'static,
    {
        Self {
            name: name.into(),
            input,
            output,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> ValueKind {
        self.input
    }

    pub fn output(&self) -> ValueKind {
        self.output
    }

    /// Apply the transform, enforcing the declared input and output kinds.
    pub fn apply(&self, value: &Value) -> Result<Value, TransformError> {
        if !self.input.accepts(value) {
            return Err(TransformError::InputKind {
                transform: self.name.clone(),
                expected: self.input,
                actual: ValueKind::of(value),
            });
        }

        let result = self.func.execute(value)?;

        if !self.output.accepts(&result) {
            return Err(TransformError::OutputKind {
                transform: self.name.clone(),
                expected: self.output,
                actual: ValueKind::of(&result),
            });
        }
        Ok(result)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("name", &self.name)
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}

/// Registry for storing and looking up transforms by name
#[derive(Debug, Clone)]
pub struct TransformRegistry {
    transforms: HashMap<String, Transform>,
}

impl TransformRegistry {
    /// Create a new empty transform registry
    pub fn new() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Create a registry pre-loaded with the builtin transforms
    ///
    /// | name        | input  | output |
    /// |-------------|--------|--------|
    /// | `to_number` | string | number |
    /// | `to_string` | any    | string |
    /// | `trim`      | string | string |
    /// | `uppercase` | string | string |
    /// | `lowercase` | string | string |
    /// | `wrap_list` | any    | array  |
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Transform::new(
            "to_number",
            ValueKind::String,
            ValueKind::Number,
            to_number,
        ));
        registry.register(Transform::new(
            "to_string",
            ValueKind::Any,
            ValueKind::String,
            |value: &Value| -> Result<Value, TransformError> {
                Ok(match value {
                    Value::String(s) => Value::String(s.clone()),
                    other => Value::String(other.to_string()),
                })
            },
        ));
        registry.register(string_transform("trim", |s| s.trim().to_string()));
        registry.register(string_transform("uppercase", |s| s.to_uppercase()));
        registry.register(string_transform("lowercase", |s| s.to_lowercase()));
        registry.register(Transform::new(
            "wrap_list",
            ValueKind::Any,
            ValueKind::Array,
            |value: &Value| -> Result<Value, TransformError> { Ok(Value::Array(vec![value.clone()])) },
        ));
        registry
    }

    /// Register a transform under its own name, replacing any previous one
    ///
    /// # Example
    ///
    /// ```
    /// use mvnomap::{Transform, TransformError, TransformRegistry, ValueKind};
    /// use serde_json::{json, Value};
    ///
    /// let mut registry = TransformRegistry::new();
    /// registry.register(Transform::new(
    ///     "double",
    ///     ValueKind::Number,
    ///     ValueKind::Number,
    ///     |v: &Value| -> Result<Value, TransformError> {
    ///         Ok(json!(v.as_f64().unwrap_or_default() * 2.0))
    ///     },
    /// ));
    /// assert!(registry.has_transform("double"));
    /// ```
    pub fn register(&mut self, transform: Transform) {
        self.transforms.insert(transform.name.clone(), transform);
    }

    /// Look up a transform by name
    pub fn get(&self, name: &str) -> Result<&Transform, TransformError> {
        self.transforms
            .get(name)
            .ok_or_else(|| TransformError::NotFound(name.to_string()))
    }

    /// Call a registered transform
    pub fn call(&self, name: &str, value: &Value) -> Result<Value, TransformError> {
        self.get(name)?.apply(value)
    }

    /// Check if a transform is registered
    pub fn has_transform(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Get list of all registered transform names, sorted
    pub fn list_transforms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.transforms.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn to_number(value: &Value) -> Result<Value, TransformError> {
    let text = value.as_str().unwrap_or_default().trim();
    let parsed: f64 = text
        .parse()
        .map_err(|_| TransformError::ExecutionError(format!("'{}' is not a number", text)))?;
    serde_json::Number::from_f64(parsed)
        .map(Value::Number)
        .ok_or_else(|| TransformError::ExecutionError(format!("'{}' is not a finite number", text)))
}

fn string_transform(name: &str, f: fn(&str) -> String) -> Transform {
    Transform::new(
        name,
        ValueKind::String,
        ValueKind::String,
        move |value: &Value| -> Result<Value, TransformError> {
            Ok(Value::String(f(value.as_str().unwrap_or_default())))
        },
    )
}
