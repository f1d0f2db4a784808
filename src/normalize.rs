//! Reconciliation of partial records describing one subscriber.

use crate::merge::{merge_all, ArrayMergePolicy};
use crate::record::PartialRecord;
use serde_json::Value;
use std::fmt;

/// Identity field that two partial records disagree on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Msisdn,
    UserId,
}

/// Error type for normalization
#[derive(Debug)]
pub enum NormalizeError {
    /// Fewer than two records were supplied
    InsufficientInputs { received: usize },
    /// A record's identity differs from the first record's
    IdentityMismatch {
        field: IdentityField,
        expected: Option<String>,
        found: Option<String>,
    },
    /// A record could not be converted to or from its JSON form
    Record(serde_json::Error),
}

fn shown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("undefined")
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::InsufficientInputs { received } => write!(
                f,
                "At least two responses are required for normalization, received {}",
                received
            ),
            NormalizeError::IdentityMismatch { field: IdentityField::Msisdn, expected, found } => write!(
                f,
                "MSISDN mismatch: MSISDN {} does not match MSISDN {}",
                shown(expected),
                shown(found)
            ),
            NormalizeError::IdentityMismatch { field: IdentityField::UserId, expected, found } => write!(
                f,
                "User mismatch: user {} does not match user {}",
                shown(expected),
                shown(found)
            ),
            NormalizeError::Record(err) => write!(f, "Record conversion failed: {}", err),
        }
    }
}

impl std::error::Error for NormalizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NormalizeError::Record(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for NormalizeError {
    fn from(err: serde_json::Error) -> Self {
        NormalizeError::Record(err)
    }
}

/// Merges partial records after checking that they share one identity
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    array_policy: ArrayMergePolicy,
}

impl Normalizer {
    pub fn new(array_policy: ArrayMergePolicy) -> Self {
        Self { array_policy }
    }

    pub fn array_policy(&self) -> ArrayMergePolicy {
        self.array_policy
    }

    /// Merge two or more partial records into one.
    ///
    /// The first record is the identity baseline. Records are checked in
    /// order, MSISDN before user id, and the first divergence is reported.
    /// Merging is in argument order with later records winning; the result
    /// is not checked for completeness (see
    /// [`PartialRecord::into_complete`]).
    pub fn normalize(&self, records: &[PartialRecord]) -> Result<PartialRecord, NormalizeError> {
        let [baseline, rest @ ..] = records else {
            return Err(NormalizeError::InsufficientInputs { received: 0 });
        };
        if rest.is_empty() {
            return Err(NormalizeError::InsufficientInputs { received: 1 });
        }

        for record in rest {
            check_identity(baseline, record)?;
        }

        let values = records
            .iter()
            .map(PartialRecord::to_value)
            .collect::<Result<Vec<Value>, _>>()?;
        let merged = merge_all(&values, self.array_policy);

        Ok(PartialRecord::from_value(merged)?)
    }
}

fn check_identity(baseline: &PartialRecord, record: &PartialRecord) -> Result<(), NormalizeError> {
    if record.msisdn != baseline.msisdn {
        return Err(NormalizeError::IdentityMismatch {
            field: IdentityField::Msisdn,
            expected: baseline.msisdn.clone(),
            found: record.msisdn.clone(),
        });
    }
    if record.telgea_user_id != baseline.telgea_user_id {
        return Err(NormalizeError::IdentityMismatch {
            field: IdentityField::UserId,
            expected: baseline.telgea_user_id.clone(),
            found: record.telgea_user_id.clone(),
        });
    }
    Ok(())
}

/// Normalize with the default array policy ([`ArrayMergePolicy::ConcatDedup`])
pub fn normalize(records: &[PartialRecord]) -> Result<PartialRecord, NormalizeError> {
    Normalizer::default().normalize(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{SmsCharge, UsageData};

    fn identified(user: &str, msisdn: &str) -> PartialRecord {
        PartialRecord {
            telgea_user_id: Some(user.to_string()),
            msisdn: Some(msisdn.to_string()),
            ..Default::default()
        }
    }

    fn usage(total_mb: f64) -> UsageData {
        UsageData {
            total_mb,
            roaming_mb: 0.0,
            country: "SE".to_string(),
            network_type: "4G".to_string(),
            provider_code: "SE01".to_string(),
        }
    }

    fn charge(id: &str) -> SmsCharge {
        SmsCharge {
            message_id: id.to_string(),
            timestamp: "2025-04-01T10:00:00Z".to_string(),
            amount: 0.05,
            currency: "EUR".to_string(),
        }
    }

    #[test]
    fn test_requires_two_records() {
        let record = identified("u1", "+1");

        assert!(matches!(
            normalize(&[]),
            Err(NormalizeError::InsufficientInputs { received: 0 })
        ));
        assert!(matches!(
            normalize(&[record]),
            Err(NormalizeError::InsufficientInputs { received: 1 })
        ));
    }

    #[test]
    fn test_merges_disjoint_sections() {
        let mut a = identified("u1", "+1");
        a.usage_data = Some(usage(845.23));
        let mut b = identified("u1", "+1");
        b.sms_charges = Some(vec![charge("m1")]);

        let merged = normalize(&[a, b]).unwrap();

        assert_eq!(merged.telgea_user_id.as_deref(), Some("u1"));
        assert_eq!(merged.usage_data.unwrap().total_mb, 845.23);
        assert_eq!(merged.sms_charges.unwrap()[0].message_id, "m1");
    }

    #[test]
    fn test_msisdn_mismatch_names_both_values() {
        let a = identified("u1", "+46701234561");
        let b = identified("u1", "+46701234567");

        let err = normalize(&[a, b]).unwrap_err();

        assert_eq!(
            err.to_string(),
            "MSISDN mismatch: MSISDN +46701234561 does not match MSISDN +46701234567"
        );
    }

    #[test]
    fn test_user_mismatch_with_same_msisdn() {
        let a = identified("abc123", "+1");
        let b = identified("xyz456", "+1");

        let err = normalize(&[a, b]).unwrap_err();

        assert_eq!(err.to_string(), "User mismatch: user abc123 does not match user xyz456");
    }

    #[test]
    fn test_first_divergence_is_reported() {
        let a = identified("u1", "+1");
        let b = identified("u2", "+1");
        let c = identified("u1", "+2");

        let err = normalize(&[a, b, c]).unwrap_err();

        assert!(matches!(
            err,
            NormalizeError::IdentityMismatch { field: IdentityField::UserId, .. }
        ));
    }

    #[test]
    fn test_msisdn_checked_before_user() {
        let a = identified("u1", "+1");
        let b = identified("u2", "+2");

        let err = normalize(&[a, b]).unwrap_err();

        assert!(matches!(
            err,
            NormalizeError::IdentityMismatch { field: IdentityField::Msisdn, .. }
        ));
    }

    #[test]
    fn test_absent_identity_is_a_mismatch() {
        let a = identified("u1", "+1");
        let b = PartialRecord {
            msisdn: Some("+1".to_string()),
            ..Default::default()
        };

        let err = normalize(&[a, b]).unwrap_err();

        assert_eq!(err.to_string(), "User mismatch: user u1 does not match user undefined");
    }

    #[test]
    fn test_later_record_wins() {
        let mut a = identified("u1", "+1");
        a.usage_data = Some(usage(1.0));
        let mut b = identified("u1", "+1");
        b.usage_data = Some(usage(2.0));
        let mut c = identified("u1", "+1");
        c.usage_data = Some(usage(3.0));

        let merged = normalize(&[a, b, c]).unwrap();

        assert_eq!(merged.usage_data.unwrap().total_mb, 3.0);
    }

    #[test]
    fn test_sms_charges_policy() {
        let mut a = identified("u1", "+1");
        a.sms_charges = Some(vec![charge("m1"), charge("m2")]);
        let mut b = identified("u1", "+1");
        b.sms_charges = Some(vec![charge("m2"), charge("m3")]);
        let records = [a, b];

        let concat = normalize(&records).unwrap().sms_charges.unwrap();
        let ids: Vec<&str> = concat.iter().map(|c| c.message_id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);

        let replaced = Normalizer::new(ArrayMergePolicy::Replace)
            .normalize(&records)
            .unwrap()
            .sms_charges
            .unwrap();
        let ids: Vec<&str> = replaced.iter().map(|c| c.message_id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m3"]);
    }
}
