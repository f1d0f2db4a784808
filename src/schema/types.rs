//! Schema description types.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A declarative description of a record's required shape
#[derive(Debug, Clone)]
pub enum Schema {
    String(StringSchema),
    Number,
    Integer,
    Boolean,
    Object(ObjectSchema),
    Array(Box<Schema>),
    /// Any value, copied through unchanged
    Any,
}

impl Schema {
    pub fn string() -> Self {
        Schema::String(StringSchema::default())
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array(Box::new(items))
    }

    /// Name of the expected type, as reported in issues
    pub fn type_name(&self) -> &'static str {
        match self {
            Schema::String(_) => "string",
            Schema::Number => "number",
            Schema::Integer => "integer",
            Schema::Boolean => "boolean",
            Schema::Object(_) => "object",
            Schema::Array(_) => "array",
            Schema::Any => "any",
        }
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Schema::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl From<StringSchema> for Schema {
    fn from(schema: StringSchema) -> Self {
        Schema::String(schema)
    }
}

impl From<ObjectSchema> for Schema {
    fn from(schema: ObjectSchema) -> Self {
        Schema::Object(schema)
    }
}

/// String constraints
#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    pub refinements: Vec<Refinement>,
    /// Replace the string with a converted value in the validated copy
    pub coerce: Option<Coercion>,
}

impl StringSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refine(mut self, refinement: Refinement) -> Self {
        self.refinements.push(refinement);
        self
    }

    /// Require a parseable date, reporting `message` on failure
    pub fn date(self, message: impl Into<String>) -> Self {
        self.refine(Refinement::Date {
            message: Some(message.into()),
        })
    }

    pub fn coerce(mut self, coercion: Coercion) -> Self {
        self.coerce = Some(coercion);
        self
    }
}

/// Extra checks on a string value
#[derive(Debug, Clone)]
pub enum Refinement {
    /// The string must parse as a date or date-time
    Date { message: Option<String> },
    /// The string must match the regular expression
    Pattern(Regex),
    NonEmpty,
}

/// Conversion applied to a valid string in the validated copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coercion {
    /// Parse as a floating point number
    Number,
}

/// Policy for keys present in the data but not declared by the schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeys {
    /// Drop them from the validated copy
    #[default]
    Strip,
    /// Copy them through unchecked
    Passthrough,
    /// Report them as an issue
    Strict,
}

/// A declared object field
#[derive(Debug, Clone)]
pub struct Field {
    pub schema: Schema,
    pub required: bool,
}

/// Object shape: declared fields in declaration order
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub fields: IndexMap<String, Field>,
    pub unknown_keys: UnknownKeys,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.fields.insert(
            name.into(),
            Field {
                schema: schema.into(),
                required: true,
            },
        );
        self
    }

    pub fn optional(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.fields.insert(
            name.into(),
            Field {
                schema: schema.into(),
                required: false,
            },
        );
        self
    }

    pub fn unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown_keys = policy;
        self
    }

    /// A copy whose top-level fields are all optional.
    ///
    /// Nested objects keep their own required fields, so a section that is
    /// present must still be complete.
    pub fn partial(&self) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|(name, field)| {
                (
                    name.clone(),
                    Field {
                        schema: field.schema.clone(),
                        required: false,
                    },
                )
            })
            .collect();

        Self {
            fields,
            unknown_keys: self.unknown_keys,
        }
    }
}
