//! Provider YAML definitions and loader.
//!
//! A provider file declares one integration:
//!
//! ```yaml
//! provider:
//!   name: vodafone
//!   description: Vodafone usage and SMS billing
//!   array_merge: concat_dedup
//!   operations:
//!     usage:
//!       input: json
//!       schema:
//!         type: object
//!         fields:
//!           user_id: { type: string }
//!           msisdn: { type: string }
//!           msisdn_e164: { type: string, optional: true }
//!       mappings:
//!         - source: user_id
//!           target: telgea_user_id
//!         - source: [msisdn_e164, msisdn]
//!           target: msisdn
//!           transform: trim
//! ```
//!
//! Loading resolves transforms against a [`TransformRegistry`] and compiles
//! schemas, so a loaded integration cannot fail on configuration at
//! conversion time.

use crate::integration::{MvnoIntegration, Operation, PayloadFormat, ProviderIntegration};
use crate::mapping::{FieldMapping, SourceField};
use crate::merge::ArrayMergePolicy;
use crate::path::FieldPath;
use crate::schema::{SchemaDef, SchemaDefError};
use crate::transform_registry::TransformRegistry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Top-level layout of a provider file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFile {
    pub provider: ProviderDef,
}

/// Provider definition from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDef {
    /// Provider name (unique identifier)
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// How `normalize` combines arrays from several responses
    #[serde(default)]
    pub array_merge: ArrayMergePolicy,

    /// Operations in declaration order
    pub operations: IndexMap<String, OperationDef>,
}

/// One provider response type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDef {
    #[serde(default)]
    pub input: PayloadFormat,

    /// Schema of the decoded payload
    pub schema: SchemaDef,

    /// Ordered mapping rules into the canonical record
    pub mappings: Vec<MappingDef>,
}

/// A single path or a fallback list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceDef {
    Path(String),
    Fallback(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingDef {
    pub source: SourceDef,
    pub target: String,

    /// Name of a registered transform
    #[serde(default)]
    pub transform: Option<String>,
}

/// Error type for provider configuration
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Yaml { path: Option<PathBuf>, message: String },
    NotADirectory(PathBuf),
    /// Structurally valid YAML describing an unusable provider
    InvalidProvider { provider: String, reason: String },
    Schema {
        provider: String,
        operation: String,
        source: SchemaDefError,
    },
    UnknownTransform {
        provider: String,
        operation: String,
        target: String,
        transform: String,
    },
    /// One target is nested inside another target of the same operation
    ConflictingTargets {
        provider: String,
        operation: String,
        parent: String,
        child: String,
    },
    DuplicateProvider(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "Failed to read {}: {}", path.display(), message)
            }
            ConfigError::Yaml { path: Some(path), message } => {
                write!(f, "Failed to parse provider YAML {}: {}", path.display(), message)
            }
            ConfigError::Yaml { path: None, message } => {
                write!(f, "Failed to parse provider YAML: {}", message)
            }
            ConfigError::NotADirectory(path) => write!(f, "Path is not a directory: {}", path.display()),
            ConfigError::InvalidProvider { provider, reason } => {
                write!(f, "Invalid provider '{}': {}", provider, reason)
            }
            ConfigError::Schema { provider, operation, source } => {
                write!(f, "Invalid schema in {}.{}: {}", provider, operation, source)
            }
            ConfigError::UnknownTransform { provider, operation, target, transform } => write!(
                f,
                "Unknown transform '{}' for target '{}' in {}.{}",
                transform, target, provider, operation
            ),
            ConfigError::ConflictingTargets { provider, operation, parent, child } => write!(
                f,
                "Conflicting targets in {}.{}: '{}' is written inside '{}'",
                provider, operation, child, parent
            ),
            ConfigError::DuplicateProvider(name) => write!(f, "Provider '{}' is defined twice", name),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Schema { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl ProviderDef {
    /// Resolve transforms, compile schemas and check the mapping tables
    pub fn compile(&self, registry: &TransformRegistry) -> Result<ProviderIntegration, ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidProvider {
                provider: self.name.clone(),
                reason: "name cannot be empty".to_string(),
            });
        }
        if self.operations.is_empty() {
            return Err(ConfigError::InvalidProvider {
                provider: self.name.clone(),
                reason: "no operations declared".to_string(),
            });
        }

        let mut integration = ProviderIntegration::new(&self.name).with_array_policy(self.array_merge);
        if let Some(description) = &self.description {
            integration = integration.with_description(description);
        }

        for (name, def) in &self.operations {
            integration = integration.with_operation(def.compile(&self.name, name, registry)?);
        }
        Ok(integration)
    }
}

impl OperationDef {
    fn compile(
        &self,
        provider: &str,
        operation: &str,
        registry: &TransformRegistry,
    ) -> Result<Operation, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidProvider {
            provider: provider.to_string(),
            reason: format!("operation '{}': {}", operation, reason),
        };

        let schema = self.schema.compile().map_err(|source| ConfigError::Schema {
            provider: provider.to_string(),
            operation: operation.to_string(),
            source,
        })?;

        let mut mappings = Vec::with_capacity(self.mappings.len());
        for def in &self.mappings {
            let target = FieldPath::from_dotted(&def.target);
            if target.is_empty() {
                return Err(invalid("mapping target cannot be empty".to_string()));
            }

            let source = match &def.source {
                SourceDef::Path(path) => SourceField::Path(FieldPath::from_dotted(path)),
                SourceDef::Fallback(paths) => {
                    SourceField::Fallback(paths.iter().map(|p| FieldPath::from_dotted(p)).collect())
                }
            };
            if source.paths().is_empty() || source.paths().iter().any(FieldPath::is_empty) {
                return Err(invalid(format!("empty source path for target '{}'", def.target)));
            }

            let transform = match &def.transform {
                Some(name) => Some(registry.get(name).cloned().map_err(|_| {
                    ConfigError::UnknownTransform {
                        provider: provider.to_string(),
                        operation: operation.to_string(),
                        target: def.target.clone(),
                        transform: name.clone(),
                    }
                })?),
                None => None,
            };

            mappings.push(FieldMapping { source, target, transform });
        }

        check_targets(&mappings).map_err(|(parent, child)| ConfigError::ConflictingTargets {
            provider: provider.to_string(),
            operation: operation.to_string(),
            parent,
            child,
        })?;

        Ok(Operation {
            name: operation.to_string(),
            input: self.input,
            schema,
            mappings,
        })
    }
}

/// Find a target written inside another target: `(parent, child)`
fn check_targets(mappings: &[FieldMapping]) -> Result<(), (String, String)> {
    for (i, a) in mappings.iter().enumerate() {
        for b in &mappings[i + 1..] {
            if b.target.is_strictly_below(&a.target) {
                return Err((a.target.raw.clone(), b.target.raw.clone()));
            }
            if a.target.is_strictly_below(&b.target) {
                return Err((b.target.raw.clone(), a.target.raw.clone()));
            }
        }
    }
    Ok(())
}

/// Load a provider integration from YAML text
pub fn load_provider_str(yaml: &str, registry: &TransformRegistry) -> Result<ProviderIntegration, ConfigError> {
    let file: ProviderFile = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Yaml {
        path: None,
        message: e.to_string(),
    })?;
    file.provider.compile(registry)
}

/// Load a provider integration from a YAML file.
///
/// # Errors
/// Returns error if the file can't be read, isn't a provider definition, or
/// references a transform missing from `registry`
pub fn load_provider<P: AsRef<Path>>(path: P, registry: &TransformRegistry) -> Result<ProviderIntegration, ConfigError> {
    let path = path.as_ref();

    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let file: ProviderFile = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;

    let integration = file.provider.compile(registry)?;
    info!(
        provider = %file.provider.name,
        operations = file.provider.operations.len(),
        path = %path.display(),
        "loaded provider"
    );
    Ok(integration)
}

/// Load every `*.yaml` / `*.yml` provider in `dir`, ordered by file name.
///
/// Any invalid file fails the whole load, as does a provider name used twice.
pub fn load_providers_from_dir<P: AsRef<Path>>(
    dir: P,
    registry: &TransformRegistry,
) -> Result<Vec<ProviderIntegration>, ConfigError> {
    let dir = dir.as_ref();

    if !dir.is_dir() {
        return Err(ConfigError::NotADirectory(dir.to_path_buf()));
    }

    let io_error = |e: std::io::Error| ConfigError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if is_yaml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    debug!(dir = %dir.display(), files = files.len(), "scanning provider directory");

    let mut providers: Vec<ProviderIntegration> = Vec::with_capacity(files.len());
    for path in files {
        let integration = load_provider(&path, registry)?;
        if providers.iter().any(|p| p.name() == integration.name()) {
            return Err(ConfigError::DuplicateProvider(integration.name().to_string()));
        }
        providers.push(integration);
    }
    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::Payload;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;

    const ACME: &str = r#"
provider:
  name: acme
  operations:
    usage:
      schema:
        type: object
        fields:
          id: { type: string }
          phone: { type: string }
          mb: { type: string, optional: true }
      mappings:
        - source: id
          target: telgea_user_id
        - source: [phone_e164, phone]
          target: msisdn
          transform: trim
"#;

    fn write_yaml(dir: &Path, name: &str, content: &str) -> PathBuf {
        let file_path = dir.join(name);
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path
    }

    #[test]
    fn test_load_provider_str() {
        let integration = load_provider_str(ACME, &TransformRegistry::with_builtins()).unwrap();

        assert_eq!(integration.name(), "acme");
        let op = integration.operation("usage").unwrap();
        assert_eq!(op.input, PayloadFormat::Json);
        assert_eq!(op.mappings.len(), 2);
        assert_eq!(op.mappings[1].source.to_string(), "[phone_e164, phone]");
        assert_eq!(op.mappings[1].transform.as_ref().unwrap().name(), "trim");

        let record = integration
            .convert("usage", Payload::Json(json!({"id": "u1", "phone": " +1 "})))
            .unwrap();
        assert_eq!(record.msisdn.as_deref(), Some("+1"));
    }

    #[test]
    fn test_unknown_transform_is_rejected() {
        let yaml = ACME.replace("transform: trim", "transform: rot13");

        let err = load_provider_str(&yaml, &TransformRegistry::with_builtins()).unwrap_err();

        assert!(matches!(err, ConfigError::UnknownTransform { ref transform, .. } if transform == "rot13"));
        assert_eq!(
            err.to_string(),
            "Unknown transform 'rot13' for target 'msisdn' in acme.usage"
        );
    }

    #[test]
    fn test_conflicting_targets_are_rejected() {
        let yaml = ACME.replace("target: msisdn", "target: telgea_user_id.number");

        let err = load_provider_str(&yaml, &TransformRegistry::with_builtins()).unwrap_err();

        match err {
            ConfigError::ConflictingTargets { parent, child, .. } => {
                assert_eq!(parent, "telgea_user_id");
                assert_eq!(child, "telgea_user_id.number");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_same_target_twice_is_allowed() {
        let yaml = ACME.replace("target: msisdn", "target: telgea_user_id");

        assert!(load_provider_str(&yaml, &TransformRegistry::with_builtins()).is_ok());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let yaml = ACME.replace("id: { type: string }", "id: { type: string, pattern: \"[a-\" }");

        let err = load_provider_str(&yaml, &TransformRegistry::with_builtins()).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Schema {
                source: SchemaDefError::InvalidPattern { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_missing_provider_section() {
        let err = load_provider_str("name: acme\n", &TransformRegistry::with_builtins()).unwrap_err();

        assert!(matches!(err, ConfigError::Yaml { path: None, .. }));
    }

    #[test]
    fn test_empty_fallback_list_is_rejected() {
        let yaml = ACME.replace("source: [phone_e164, phone]", "source: []");

        let err = load_provider_str(&yaml, &TransformRegistry::with_builtins()).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidProvider { .. }));
    }

    #[test]
    fn test_load_providers_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        write_yaml(temp_dir.path(), "b_acme.yaml", ACME);
        write_yaml(temp_dir.path(), "a_other.yml", &ACME.replace("name: acme", "name: other"));
        write_yaml(temp_dir.path(), "notes.txt", "not yaml");

        let providers = load_providers_from_dir(temp_dir.path(), &TransformRegistry::with_builtins()).unwrap();

        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["other", "acme"]);
    }

    #[test]
    fn test_duplicate_provider_in_dir() {
        let temp_dir = TempDir::new().unwrap();
        write_yaml(temp_dir.path(), "one.yaml", ACME);
        write_yaml(temp_dir.path(), "two.yaml", ACME);

        let err = load_providers_from_dir(temp_dir.path(), &TransformRegistry::with_builtins()).unwrap_err();

        assert!(matches!(err, ConfigError::DuplicateProvider(ref name) if name == "acme"));
    }

    #[test]
    fn test_invalid_file_names_its_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_yaml(temp_dir.path(), "broken.yaml", "provider: [");

        let err = load_provider(&path, &TransformRegistry::with_builtins()).unwrap_err();

        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_missing_dir() {
        let err = load_providers_from_dir("/nonexistent/providers", &TransformRegistry::new()).unwrap_err();

        assert!(matches!(err, ConfigError::NotADirectory(_)));
    }
}
