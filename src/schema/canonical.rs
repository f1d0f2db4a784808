//! The canonical (internal) record schema.
//!
//! One schema describes the normalized record for every provider. It is
//! built once per process and shared.

use crate::record::{MSISDN_FIELD, USER_ID_FIELD};
use crate::schema::types::{ObjectSchema, Schema, StringSchema};
use std::sync::OnceLock;

fn build_canonical() -> ObjectSchema {
    let usage_data = ObjectSchema::new()
        .required("total_mb", Schema::Number)
        .required("roaming_mb", Schema::Number)
        .required("country", Schema::string())
        .required("network_type", Schema::string())
        .required("provider_code", Schema::string());

    let sms_charge = ObjectSchema::new()
        .required("message_id", Schema::string())
        .required("timestamp", Schema::string())
        .required("amount", Schema::Number)
        .required("currency", Schema::string());

    let billing_period = ObjectSchema::new()
        .required("start", StringSchema::new().date("Invalid start date format"))
        .required("end", StringSchema::new().date("Invalid end date format"));

    ObjectSchema::new()
        .required(USER_ID_FIELD, Schema::string())
        .required(MSISDN_FIELD, Schema::string())
        .optional("usage_data", usage_data)
        .optional("sms_charges", Schema::array(Schema::Object(sms_charge)))
        .optional("billing_period", billing_period)
}

/// The complete canonical schema: identity fields required, sections
/// optional but complete when present.
pub fn canonical_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| Schema::Object(build_canonical()))
}

/// The canonical schema with every top-level field optional, used to
/// validate the partial output of a single conversion.
pub fn partial_canonical_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| Schema::Object(build_canonical().partial()))
}
