//! # mvnomap: MVNO Provider Record Normalization
//!
//! mvnomap turns heterogeneous telecom provider responses (REST JSON, SOAP
//! XML) into one canonical subscriber record, and reconciles several
//! partial records about the same subscriber into one.
//!
//! ## Features
//!
//! - **Declarative field mapping**: dotted source/target paths, fallback source lists, typed transforms
//! - **Schema validation**: all-or-nothing validation with every issue reported, unknown keys stripped
//! - **SOAP decoding**: envelope bodies turned into plain records
//! - **Normalization**: identity-checked deep merge of partial records
//! - **YAML providers**: integrations declared in configuration and checked at load time
//!
//! ## Example: Provider definition
//!
//! ```yaml
//! provider:
//!   name: vodafone
//!   operations:
//!     usage:
//!       input: json
//!       schema:
//!         type: object
//!         fields:
//!           user_id: { type: string }
//!           msisdn: { type: string }
//!       mappings:
//!         - { source: user_id, target: telgea_user_id }
//!         - { source: msisdn, target: msisdn }
//! ```
//!
//! ## Example: Converting and normalizing
//!
//! ```no_run
//! use mvnomap::providers::VodafoneIntegration;
//! use mvnomap::MvnoIntegration;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let vodafone = VodafoneIntegration::new()?;
//! let usage = vodafone.convert_usage_response(&json!({ "user_id": "abc123" }))?;
//! let charges = vodafone.convert_sms_charges_response("<soapenv:Envelope>...</soapenv:Envelope>")?;
//! let record = vodafone.normalize(&[usage, charges])?.into_complete()?;
//! println!("{}", serde_json::to_string_pretty(&record)?);
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod path;
pub mod transform_registry;
pub mod mapping;
pub mod schema;
pub mod record;
pub mod merge;
pub mod normalize;
pub mod soap;
pub mod pipeline;

// Provider integrations and their configuration
pub mod integration;
pub mod config;
pub mod providers;

// Re-export key types
pub use path::{FieldPath, PathError, PathSegment};
pub use transform_registry::{Transform, TransformError, TransformFn, TransformRegistry, ValueKind};
pub use mapping::{map_with_config, FieldMapping, MappingError, SourceField};
pub use schema::{Issue, IssueCode, Schema, ValidationError};
pub use record::{BillingPeriod, CanonicalRecord, PartialRecord, SmsCharge, UsageData};
pub use merge::{deep_merge, ArrayMergePolicy};
pub use normalize::{normalize, IdentityField, NormalizeError, Normalizer};
pub use soap::{parse_soap, SoapError};
pub use pipeline::{convert, ConversionError, ParseError};

pub use integration::{IntegrationError, MvnoIntegration, Payload, PayloadFormat, ProviderIntegration};
pub use config::{load_provider, load_providers_from_dir, ConfigError};
pub use providers::ProviderRegistry;
