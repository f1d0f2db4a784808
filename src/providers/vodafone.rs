//! Vodafone: usage over REST, SMS charges over SOAP.

use crate::config::{load_provider_str, ConfigError};
use crate::integration::{IntegrationError, MvnoIntegration, Payload, ProviderIntegration};
use crate::normalize::Normalizer;
use crate::record::PartialRecord;
use crate::transform_registry::{Transform, TransformError, TransformRegistry, ValueKind};
use serde_json::{Map, Value};

pub const PROVIDER_NAME: &str = "vodafone";

/// Embedded provider definition
pub const PROVIDER_YAML: &str = include_str!("../../config/providers/vodafone.yaml");

pub const USAGE_OPERATION: &str = "usage";
pub const SMS_CHARGES_OPERATION: &str = "sms_charges";

/// `sms:ChargeSMS` element name -> canonical charge field
const CHARGE_FIELDS: [(&str, &str); 4] = [
    ("sms:MessageID", "message_id"),
    ("sms:Timestamp", "timestamp"),
    ("sms:ChargeAmount", "amount"),
    ("sms:Currency", "currency"),
];

/// Turn one validated `sms:ChargeSMS` element into a one-element charge list.
///
/// Absent elements stay absent so that the canonical schema reports them.
pub fn sms_charge_list(charge: &Value) -> Result<Value, TransformError> {
    let element = charge
        .as_object()
        .ok_or_else(|| TransformError::ExecutionError("sms:ChargeSMS is not an element".to_string()))?;

    let mut entry = Map::new();
    for (source, target) in CHARGE_FIELDS {
        if let Some(value) = element.get(source) {
            entry.insert(target.to_string(), value.clone());
        }
    }
    Ok(Value::Array(vec![Value::Object(entry)]))
}

/// Register the transforms the Vodafone mapping tables reference
pub fn register_transforms(registry: &mut TransformRegistry) {
    registry.register(Transform::new(
        "vodafone.sms_charge_list",
        ValueKind::Object,
        ValueKind::Array,
        sms_charge_list,
    ));
}

/// Vodafone integration with one method per API response type
#[derive(Debug, Clone)]
pub struct VodafoneIntegration {
    inner: ProviderIntegration,
}

impl VodafoneIntegration {
    /// Build from the embedded definition
    pub fn new() -> Result<Self, ConfigError> {
        let mut registry = TransformRegistry::with_builtins();
        register_transforms(&mut registry);
        Self::from_yaml(PROVIDER_YAML, &registry)
    }

    pub fn from_yaml(yaml: &str, registry: &TransformRegistry) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: load_provider_str(yaml, registry)?,
        })
    }

    pub fn convert_usage_response(&self, data: &Value) -> Result<PartialRecord, IntegrationError> {
        self.inner.convert(USAGE_OPERATION, Payload::Json(data.clone()))
    }

    pub fn convert_sms_charges_response(&self, xml: &str) -> Result<PartialRecord, IntegrationError> {
        self.inner.convert(SMS_CHARGES_OPERATION, Payload::Soap(xml))
    }

    pub fn integration(&self) -> &ProviderIntegration {
        &self.inner
    }
}

impl MvnoIntegration for VodafoneIntegration {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn normalizer(&self) -> Normalizer {
        self.inner.normalizer()
    }
}

impl From<VodafoneIntegration> for ProviderIntegration {
    fn from(vodafone: VodafoneIntegration) -> Self {
        vodafone.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sms_charge_list() {
        let charge = json!({
            "sms:UserID": "abc123",
            "sms:MessageID": "msg789",
            "sms:Timestamp": "2025-04-01T12:30:00Z",
            "sms:ChargeAmount": 0.05,
            "sms:Currency": "EUR"
        });

        assert_eq!(
            sms_charge_list(&charge).unwrap(),
            json!([{
                "message_id": "msg789",
                "timestamp": "2025-04-01T12:30:00Z",
                "amount": 0.05,
                "currency": "EUR"
            }])
        );
    }

    #[test]
    fn test_sms_charge_list_keeps_missing_fields_absent() {
        let list = sms_charge_list(&json!({"sms:MessageID": "m1"})).unwrap();

        assert_eq!(list, json!([{"message_id": "m1"}]));
    }

    #[test]
    fn test_embedded_definition_loads() {
        let vodafone = VodafoneIntegration::new().unwrap();

        let operations: Vec<&str> = vodafone
            .integration()
            .operations()
            .map(|op| op.name.as_str())
            .collect();
        assert_eq!(vodafone.name(), PROVIDER_NAME);
        assert_eq!(operations, vec![USAGE_OPERATION, SMS_CHARGES_OPERATION]);
    }

    #[test]
    fn test_definition_needs_provider_transform() {
        let err = VodafoneIntegration::from_yaml(PROVIDER_YAML, &TransformRegistry::with_builtins()).unwrap_err();

        assert!(matches!(err, ConfigError::UnknownTransform { .. }));
    }
}
