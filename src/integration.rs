//! Provider integrations.
//!
//! An integration owns, per operation, the input schema of the provider's
//! payload and the mapping table into the canonical record. The
//! [`MvnoIntegration`] trait carries the shared conversion steps as
//! default methods; [`ProviderIntegration`] is the configured
//! implementation built from provider YAML (see [`crate::config`]).

use crate::mapping::{map_with_config, FieldMapping};
use crate::merge::ArrayMergePolicy;
use crate::normalize::{NormalizeError, Normalizer};
use crate::pipeline::{self, ConversionError, ParseError};
use crate::record::PartialRecord;
use crate::schema::Schema;
use crate::soap::parse_soap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Wire format of an operation's payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    #[default]
    Json,
    Soap,
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadFormat::Json => write!(f, "json"),
            PayloadFormat::Soap => write!(f, "soap"),
        }
    }
}

/// A provider response handed to an integration
#[derive(Debug, Clone)]
pub enum Payload<'a> {
    /// An already decoded REST body
    Json(Value),
    /// A raw SOAP envelope
    Soap(&'a str),
}

impl<'a> Payload<'a> {
    pub fn format(&self) -> PayloadFormat {
        match self {
            Payload::Json(_) => PayloadFormat::Json,
            Payload::Soap(_) => PayloadFormat::Soap,
        }
    }

    /// Wrap raw payload text according to `format`, decoding JSON eagerly
    pub fn from_text(text: &'a str, format: PayloadFormat) -> Result<Self, ParseError> {
        match format {
            PayloadFormat::Json => serde_json::from_str(text)
                .map(Payload::Json)
                .map_err(ParseError::Json),
            PayloadFormat::Soap => Ok(Payload::Soap(text)),
        }
    }

    /// Decode into a record ready for validation
    pub fn into_record(self) -> Result<Value, ParseError> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Soap(xml) => parse_soap(xml).map_err(ParseError::Soap),
        }
    }
}

/// Error type for integration-level operations
#[derive(Debug)]
pub enum IntegrationError {
    UnknownProvider(String),
    UnknownOperation { provider: String, operation: String },
    /// The payload's format is not the one the operation declares
    PayloadFormat {
        operation: String,
        expected: PayloadFormat,
        received: PayloadFormat,
    },
    Conversion(ConversionError),
    Normalize(NormalizeError),
}

impl fmt::Display for IntegrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationError::UnknownProvider(name) => write!(f, "Unknown provider '{}'", name),
            IntegrationError::UnknownOperation { provider, operation } => {
                write!(f, "Provider '{}' has no operation '{}'", provider, operation)
            }
            IntegrationError::PayloadFormat { operation, expected, received } => write!(
                f,
                "Operation '{}' expects a {} payload, received {}",
                operation, expected, received
            ),
            IntegrationError::Conversion(err) => write!(f, "{}", err),
            IntegrationError::Normalize(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for IntegrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntegrationError::Conversion(err) => Some(err),
            IntegrationError::Normalize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConversionError> for IntegrationError {
    fn from(err: ConversionError) -> Self {
        IntegrationError::Conversion(err)
    }
}

impl From<ParseError> for IntegrationError {
    fn from(err: ParseError) -> Self {
        IntegrationError::Conversion(ConversionError::Parse(err))
    }
}

impl From<NormalizeError> for IntegrationError {
    fn from(err: NormalizeError) -> Self {
        IntegrationError::Normalize(err)
    }
}

/// Behaviour shared by every provider integration.
///
/// Only [`MvnoIntegration::name`] is required; the conversion steps
/// delegate to [`crate::pipeline`] and [`crate::normalize`] and can be
/// overridden one at a time.
pub trait MvnoIntegration {
    fn name(&self) -> &str;

    /// Normalizer used by [`MvnoIntegration::normalize`]
    fn normalizer(&self) -> Normalizer {
        Normalizer::default()
    }

    fn validate_data(&self, schema: &Schema, data: &Value) -> Result<Value, ConversionError> {
        pipeline::validate_data(schema, data)
    }

    fn validate_mapped_result(&self, result: &Value) -> Result<Value, ConversionError> {
        pipeline::validate_mapped_result(result)
    }

    /// Validate, map and re-validate one provider record
    fn convert_data(
        &self,
        data: &Value,
        schema: &Schema,
        mappings: &[FieldMapping],
    ) -> Result<PartialRecord, ConversionError> {
        let validated = self.validate_data(schema, data)?;
        let mapped = map_with_config(&validated, mappings)?;
        let checked = self.validate_mapped_result(&mapped)?;
        Ok(PartialRecord::from_value(checked)?)
    }

    fn normalize(&self, records: &[PartialRecord]) -> Result<PartialRecord, NormalizeError> {
        self.normalizer().normalize(records)
    }
}

/// One provider operation (one API response type)
#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub input: PayloadFormat,
    pub schema: Schema,
    pub mappings: Vec<FieldMapping>,
}

/// A provider integration assembled from configuration
#[derive(Debug, Clone)]
pub struct ProviderIntegration {
    name: String,
    description: Option<String>,
    operations: IndexMap<String, Operation>,
    array_policy: ArrayMergePolicy,
}

impl ProviderIntegration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            operations: IndexMap::new(),
            array_policy: ArrayMergePolicy::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_array_policy(mut self, policy: ArrayMergePolicy) -> Self {
        self.array_policy = policy;
        self
    }

    /// Add an operation, replacing one of the same name
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operations.insert(operation.name.clone(), operation);
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Operations in declaration order
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    pub fn operation(&self, name: &str) -> Result<&Operation, IntegrationError> {
        self.operations
            .get(name)
            .ok_or_else(|| IntegrationError::UnknownOperation {
                provider: self.name.clone(),
                operation: name.to_string(),
            })
    }

    /// Convert one payload through the named operation
    pub fn convert(&self, operation: &str, payload: Payload<'_>) -> Result<PartialRecord, IntegrationError> {
        let op = self.operation(operation)?;
        if payload.format() != op.input {
            return Err(IntegrationError::PayloadFormat {
                operation: op.name.clone(),
                expected: op.input,
                received: payload.format(),
            });
        }

        debug!(provider = %self.name, operation, format = %op.input, "converting payload");
        let result = payload
            .into_record()
            .map_err(ConversionError::Parse)
            .and_then(|record| self.convert_data(&record, &op.schema, &op.mappings));

        match result {
            Ok(record) => {
                debug!(provider = %self.name, operation, "conversion finished");
                Ok(record)
            }
            Err(err) => {
                warn!(provider = %self.name, operation, error = %err, "conversion failed");
                Err(err.into())
            }
        }
    }

    /// Convert raw payload text, decoded per the operation's declared format
    pub fn convert_text(&self, operation: &str, text: &str) -> Result<PartialRecord, IntegrationError> {
        let format = self.operation(operation)?.input;
        let payload = Payload::from_text(text, format)?;
        self.convert(operation, payload)
    }
}

impl MvnoIntegration for ProviderIntegration {
    fn name(&self) -> &str {
        &self.name
    }

    fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.array_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ObjectSchema;
    use serde_json::json;

    fn identity_operation(name: &str, input: PayloadFormat) -> Operation {
        Operation {
            name: name.to_string(),
            input,
            schema: Schema::Object(
                ObjectSchema::new()
                    .required("user_id", Schema::string())
                    .required("msisdn", Schema::string()),
            ),
            mappings: vec![
                FieldMapping::new("user_id", "telgea_user_id"),
                FieldMapping::new("msisdn", "msisdn"),
            ],
        }
    }

    fn provider() -> ProviderIntegration {
        ProviderIntegration::new("acme").with_operation(identity_operation("usage", PayloadFormat::Json))
    }

    #[test]
    fn test_convert_json_payload() {
        let record = provider()
            .convert("usage", Payload::Json(json!({"user_id": "u1", "msisdn": "+1"})))
            .unwrap();

        assert_eq!(record.telgea_user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_unknown_operation() {
        let err = provider().convert("billing", Payload::Json(json!({}))).unwrap_err();

        assert_eq!(err.to_string(), "Provider 'acme' has no operation 'billing'");
    }

    #[test]
    fn test_payload_format_mismatch() {
        let err = provider().convert("usage", Payload::Soap("<x/>")).unwrap_err();

        assert!(matches!(
            err,
            IntegrationError::PayloadFormat {
                expected: PayloadFormat::Json,
                received: PayloadFormat::Soap,
                ..
            }
        ));
    }

    #[test]
    fn test_convert_text_reports_bad_json() {
        let err = provider().convert_text("usage", "{not json").unwrap_err();

        assert!(matches!(
            err,
            IntegrationError::Conversion(ConversionError::Parse(ParseError::Json(_)))
        ));
    }

    #[test]
    fn test_soap_operation() {
        let mut op = identity_operation("sms", PayloadFormat::Soap);
        op.schema = Schema::Object(ObjectSchema::new().required(
            "Charge",
            Schema::Object(
                ObjectSchema::new()
                    .required("user_id", Schema::string())
                    .required("msisdn", Schema::string()),
            ),
        ));
        op.mappings = vec![
            FieldMapping::new("Charge.user_id", "telgea_user_id"),
            FieldMapping::new("Charge.msisdn", "msisdn"),
        ];
        let integration = ProviderIntegration::new("acme").with_operation(op);
        let xml = "<soapenv:Envelope><soapenv:Body><Charge><user_id>u1</user_id><msisdn>+1</msisdn></Charge></soapenv:Body></soapenv:Envelope>";

        let record = integration.convert("sms", Payload::Soap(xml)).unwrap();

        assert_eq!(record.msisdn.as_deref(), Some("+1"));
    }

    #[test]
    fn test_trait_normalize_uses_configured_policy() {
        let integration = provider().with_array_policy(ArrayMergePolicy::Replace);

        assert_eq!(integration.normalizer().array_policy(), ArrayMergePolicy::Replace);
        assert!(matches!(
            integration.normalize(&[PartialRecord::default()]),
            Err(NormalizeError::InsufficientInputs { received: 1 })
        ));
    }
}
