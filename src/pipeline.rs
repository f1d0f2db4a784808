//! Schema-checked conversion of one provider record.
//!
//! `validate input -> map -> validate output`. Each step is a hard
//! boundary; a failure anywhere aborts the conversion with nothing returned.

use crate::mapping::{map_with_config, FieldMapping, MappingError};
use crate::record::PartialRecord;
use crate::schema::{partial_canonical_schema, validate, Schema, ValidationError};
use crate::soap::SoapError;
use serde_json::Value;
use std::fmt;

/// A raw payload could not be decoded into a record at all
#[derive(Debug)]
pub enum ParseError {
    Json(serde_json::Error),
    Soap(SoapError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Json(err) => write!(f, "Failed to parse JSON payload: {}", err),
            ParseError::Soap(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Json(err) => Some(err),
            ParseError::Soap(err) => Some(err),
        }
    }
}

/// Error type for conversions
#[derive(Debug)]
pub enum ConversionError {
    /// The raw payload could not be decoded into a record
    Parse(ParseError),
    /// The record does not match the provider's input schema
    InputSchema(ValidationError),
    Mapping(MappingError),
    /// The mapped record does not match the canonical schema
    OutputSchema(ValidationError),
    Record(serde_json::Error),
}

impl ConversionError {
    /// The schema violation, if this failure is one
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ConversionError::InputSchema(err) | ConversionError::OutputSchema(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::Parse(err) => write!(f, "{}", err),
            ConversionError::InputSchema(err) => write!(f, "Invalid data: {}", err),
            ConversionError::Mapping(err) => write!(f, "Mapping failed: {}", err),
            ConversionError::OutputSchema(err) => write!(f, "Invalid mapped result: {}", err),
            ConversionError::Record(err) => write!(f, "Record conversion failed: {}", err),
        }
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConversionError::Parse(err) => Some(err),
            ConversionError::InputSchema(err) | ConversionError::OutputSchema(err) => Some(err),
            ConversionError::Mapping(err) => Some(err),
            ConversionError::Record(err) => Some(err),
        }
    }
}

impl From<ParseError> for ConversionError {
    fn from(err: ParseError) -> Self {
        ConversionError::Parse(err)
    }
}

impl From<SoapError> for ConversionError {
    fn from(err: SoapError) -> Self {
        ConversionError::Parse(ParseError::Soap(err))
    }
}

impl From<MappingError> for ConversionError {
    fn from(err: MappingError) -> Self {
        ConversionError::Mapping(err)
    }
}

impl From<serde_json::Error> for ConversionError {
    fn from(err: serde_json::Error) -> Self {
        ConversionError::Record(err)
    }
}

/// Validate a raw provider record against its input schema
pub fn validate_data(schema: &Schema, data: &Value) -> Result<Value, ConversionError> {
    validate(schema, data).map_err(ConversionError::InputSchema)
}

/// Validate a mapped record against the partial canonical schema
pub fn validate_mapped_result(result: &Value) -> Result<Value, ConversionError> {
    validate(partial_canonical_schema(), result).map_err(ConversionError::OutputSchema)
}

/// Convert a raw provider record into a partial canonical record, as JSON.
pub fn convert_value(
    data: &Value,
    input_schema: &Schema,
    mappings: &[FieldMapping],
) -> Result<Value, ConversionError> {
    let validated = validate_data(input_schema, data)?;
    let mapped = map_with_config(&validated, mappings)?;
    validate_mapped_result(&mapped)
}

/// Convert a raw provider record into a typed partial canonical record.
///
/// # Example
///
/// ```
/// use mvnomap::schema::{ObjectSchema, Schema};
/// use mvnomap::{convert, FieldMapping};
/// use serde_json::json;
///
/// let input = Schema::Object(
///     ObjectSchema::new()
///         .required("user_id", Schema::string())
///         .required("msisdn", Schema::string()),
/// );
/// let mappings = vec![
///     FieldMapping::new("user_id", "telgea_user_id"),
///     FieldMapping::new("msisdn", "msisdn"),
/// ];
///
/// let record = convert(&json!({"user_id": "abc123", "msisdn": "+46701234567"}), &input, &mappings).unwrap();
/// assert_eq!(record.telgea_user_id.as_deref(), Some("abc123"));
/// ```
pub fn convert(
    data: &Value,
    input_schema: &Schema,
    mappings: &[FieldMapping],
) -> Result<PartialRecord, ConversionError> {
    let value = convert_value(data, input_schema, mappings)?;
    Ok(PartialRecord::from_value(value)?)
}
