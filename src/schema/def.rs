//! Serializable schema definitions.
//!
//! Provider schemas are written in YAML and compiled into [`Schema`]
//! values once, when the provider configuration is loaded.

use crate::schema::types::{Coercion, Field, ObjectSchema, Refinement, Schema, StringSchema, UnknownKeys};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of value a schema definition describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Any,
}

/// Schema definition from YAML.
///
/// ```yaml
/// type: object
/// fields:
///   msisdn: { type: string, pattern: "^\\+?[0-9]+$" }
///   period:
///     type: object
///     optional: true
///     fields:
///       start: { type: string, date: true }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDef {
    #[serde(rename = "type")]
    pub kind: SchemaKind,

    /// Field may be absent (only meaningful for object fields)
    #[serde(default)]
    pub optional: bool,

    /// String must parse as a date
    #[serde(default)]
    pub date: bool,

    /// String must match this regular expression
    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(default)]
    pub non_empty: bool,

    /// Convert the string in the validated copy
    #[serde(default)]
    pub coerce: Option<Coercion>,

    /// Message reported when the date refinement fails
    #[serde(default)]
    pub message: Option<String>,

    /// Object fields, in declaration order
    #[serde(default)]
    pub fields: IndexMap<String, SchemaDef>,

    #[serde(default)]
    pub unknown_keys: UnknownKeys,

    /// Array element schema
    #[serde(default)]
    pub items: Option<Box<SchemaDef>>,
}

/// Error compiling a schema definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDefError {
    InvalidPattern { path: String, reason: String },
    MissingItems { path: String },
    Misplaced { path: String, option: &'static str },
}

impl fmt::Display for SchemaDefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaDefError::InvalidPattern { path, reason } => {
                write!(f, "Invalid pattern at '{}': {}", path, reason)
            }
            SchemaDefError::MissingItems { path } => {
                write!(f, "Array schema at '{}' has no 'items'", path)
            }
            SchemaDefError::Misplaced { path, option } => {
                write!(f, "Option '{}' at '{}' only applies to strings", option, path)
            }
        }
    }
}

impl std::error::Error for SchemaDefError {}

impl SchemaDef {
    /// Compile into a [`Schema`], checking patterns and option placement
    pub fn compile(&self) -> Result<Schema, SchemaDefError> {
        self.compile_at("<root>")
    }

    fn compile_at(&self, path: &str) -> Result<Schema, SchemaDefError> {
        if self.kind != SchemaKind::String {
            let misplaced = [
                ("date", self.date),
                ("pattern", self.pattern.is_some()),
                ("non_empty", self.non_empty),
                ("coerce", self.coerce.is_some()),
            ];
            if let Some((option, _)) = misplaced.iter().find(|(_, set)| *set) {
                return Err(SchemaDefError::Misplaced {
                    path: path.to_string(),
                    option: *option,
                });
            }
        }

        let schema = match self.kind {
            SchemaKind::String => Schema::String(self.compile_string(path)?),
            SchemaKind::Number => Schema::Number,
            SchemaKind::Integer => Schema::Integer,
            SchemaKind::Boolean => Schema::Boolean,
            SchemaKind::Any => Schema::Any,
            SchemaKind::Array => {
                let items = self.items.as_ref().ok_or_else(|| SchemaDefError::MissingItems {
                    path: path.to_string(),
                })?;
                Schema::array(items.compile_at(&format!("{}[]", path))?)
            }
            SchemaKind::Object => {
                let mut object = ObjectSchema::new().unknown_keys(self.unknown_keys);
                for (name, def) in &self.fields {
                    let child_path = if path == "<root>" {
                        name.clone()
                    } else {
                        format!("{}.{}", path, name)
                    };
                    object.fields.insert(
                        name.clone(),
                        Field {
                            schema: def.compile_at(&child_path)?,
                            required: !def.optional,
                        },
                    );
                }
                Schema::Object(object)
            }
        };
        Ok(schema)
    }

    fn compile_string(&self, path: &str) -> Result<StringSchema, SchemaDefError> {
        let mut string = StringSchema::new();
        if self.non_empty {
            string = string.refine(Refinement::NonEmpty);
        }
        if let Some(pattern) = &self.pattern {
            let regex = Regex::new(pattern).map_err(|e| SchemaDefError::InvalidPattern {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
            string = string.refine(Refinement::Pattern(regex));
        }
        if self.date {
            string = string.refine(Refinement::Date {
                message: self.message.clone(),
            });
        }
        string.coerce = self.coerce;
        Ok(string)
    }
}
