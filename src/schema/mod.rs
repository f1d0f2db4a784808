//! Declarative record schemas and their validator.
//!
//! Schemas can be built in code ([`ObjectSchema::required`] and friends)
//! or written in YAML as a [`SchemaDef`] and compiled.

pub mod canonical;
pub mod def;
pub mod error;
pub mod types;
pub mod validator;

pub use canonical::{canonical_schema, partial_canonical_schema};
pub use def::{SchemaDef, SchemaDefError, SchemaKind};
pub use error::{Issue, IssueCode, ValidationError};
pub use types::{Coercion, Field, ObjectSchema, Refinement, Schema, StringSchema, UnknownKeys};
pub use validator::{is_parseable_date, validate};
