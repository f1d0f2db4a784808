//! Typed canonical records.
//!
//! Conversions and the normalizer work on `serde_json::Value` trees; these
//! types are the typed view of a record once it has passed the canonical
//! schema.

use crate::schema::{Issue, IssueCode, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key of the user identifier in a canonical record
pub const USER_ID_FIELD: &str = "telgea_user_id";

/// Key of the subscriber number in a canonical record
pub const MSISDN_FIELD: &str = "msisdn";

/// Data usage for one subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageData {
    pub total_mb: f64,
    pub roaming_mb: f64,
    pub country: String,
    pub network_type: String,
    pub provider_code: String,
}

/// One charged SMS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsCharge {
    pub message_id: String,
    pub timestamp: String,
    pub amount: f64,
    pub currency: String,
}

/// Billing period bounds, each a parseable date string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub start: String,
    pub end: String,
}

/// A fully identified canonical record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub telgea_user_id: String,
    pub msisdn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_data: Option<UsageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_charges: Option<Vec<SmsCharge>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_period: Option<BillingPeriod>,
}

/// Any subset of a canonical record.
///
/// Every field is optional; an absent field serializes as an absent key,
/// never as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telgea_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msisdn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_data: Option<UsageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_charges: Option<Vec<SmsCharge>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_period: Option<BillingPeriod>,
}

impl PartialRecord {
    /// Decode a record that already passed the canonical schema
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Convert to pretty-printed JSON string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Require the identity fields and produce a [`CanonicalRecord`].
    ///
    /// Reports every missing identity field, in schema order.
    pub fn into_complete(self) -> Result<CanonicalRecord, ValidationError> {
        match (self.telgea_user_id, self.msisdn) {
            (Some(telgea_user_id), Some(msisdn)) => Ok(CanonicalRecord {
                telgea_user_id,
                msisdn,
                usage_data: self.usage_data,
                sms_charges: self.sms_charges,
                billing_period: self.billing_period,
            }),
            (user_id, msisdn) => {
                let issues = [(USER_ID_FIELD, user_id.is_none()), (MSISDN_FIELD, msisdn.is_none())]
                    .into_iter()
                    .filter(|(_, missing)| *missing)
                    .map(|(field, _)| {
                        Issue::new(
                            &[field.to_string()],
                            IssueCode::InvalidType {
                                expected: "string".to_string(),
                                received: "undefined".to_string(),
                            },
                            "Required",
                        )
                    })
                    .collect();
                Err(ValidationError::new(issues))
            }
        }
    }
}

impl From<CanonicalRecord> for PartialRecord {
    fn from(record: CanonicalRecord) -> Self {
        Self {
            telgea_user_id: Some(record.telgea_user_id),
            msisdn: Some(record.msisdn),
            usage_data: record.usage_data,
            sms_charges: record.sms_charges,
            billing_period: record.billing_period,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let record = PartialRecord {
            msisdn: Some("+46701234567".to_string()),
            ..Default::default()
        };

        assert_eq!(record.to_value().unwrap(), json!({"msisdn": "+46701234567"}));
    }

    #[test]
    fn test_from_value() {
        let record = PartialRecord::from_value(json!({
            "telgea_user_id": "abc123",
            "billing_period": {"start": "2025-04-01", "end": "2025-04-30"}
        }))
        .unwrap();

        assert_eq!(record.telgea_user_id.as_deref(), Some("abc123"));
        assert_eq!(record.billing_period.unwrap().end, "2025-04-30");
        assert!(record.msisdn.is_none());
    }

    #[test]
    fn test_into_complete() {
        let record = PartialRecord {
            telgea_user_id: Some("abc123".to_string()),
            msisdn: Some("+46701234567".to_string()),
            ..Default::default()
        };

        let complete = record.clone().into_complete().unwrap();
        assert_eq!(complete.telgea_user_id, "abc123");
        assert_eq!(PartialRecord::from(complete), record);
    }

    #[test]
    fn test_into_complete_reports_missing_identity() {
        let err = PartialRecord::default().into_complete().unwrap_err();

        let paths: Vec<String> = err.issues.iter().map(|i| i.dotted_path()).collect();
        assert_eq!(paths, vec!["telgea_user_id", "msisdn"]);
        assert!(err.to_string().contains("Required"));
    }
}
