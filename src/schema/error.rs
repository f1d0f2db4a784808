//! Structured validation failures.

use std::fmt;

/// What constraint a value violated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueCode {
    /// Wrong primitive type, or a required field is missing
    /// (`received` is `undefined`)
    InvalidType { expected: String, received: String },
    /// A string refinement failed (`validation` names it: `regex`,
    /// `non_empty`, `numeric`)
    InvalidString { validation: String },
    /// A string that must parse as a date does not
    InvalidDate,
    /// Keys not declared by a strict object schema
    UnrecognizedKeys { keys: Vec<String> },
}

impl IssueCode {
    /// Stable machine-readable code
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::InvalidType { .. } => "invalid_type",
            IssueCode::InvalidString { .. } => "invalid_string",
            IssueCode::InvalidDate => "invalid_date",
            IssueCode::UnrecognizedKeys { .. } => "unrecognized_keys",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueCode::InvalidType { expected, received } => write!(
                f,
                "{} (expected {}, received {})",
                self.as_str(),
                expected,
                received
            ),
            IssueCode::InvalidString { validation } => {
                write!(f, "{} ({})", self.as_str(), validation)
            }
            IssueCode::InvalidDate => write!(f, "{}", self.as_str()),
            IssueCode::UnrecognizedKeys { keys } => {
                write!(f, "{} ({})", self.as_str(), keys.join(", "))
            }
        }
    }
}

/// One violation at one location in the validated record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Path segments from the record root; array positions appear as
    /// decimal indices
    pub path: Vec<String>,
    pub code: IssueCode,
    pub message: String,
}

impl Issue {
    pub fn new(path: &[String], code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            code,
            message: message.into(),
        }
    }

    /// The path in dotted notation (`<root>` for the record itself)
    pub fn dotted_path(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.join(".")
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.dotted_path(), self.code, self.message)
    }
}

/// A record does not conform to a schema (SchemaViolation).
///
/// Always carries at least one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        debug_assert!(!issues.is_empty());
        Self { issues }
    }

    /// Find the first issue reported at `dotted_path`
    pub fn issue_at(&self, dotted_path: &str) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.dotted_path() == dotted_path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.issues.len() == 1 { "" } else { "s" };
        write!(f, "{} validation issue{}: ", self.issues.len(), plural)?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display() {
        let err = ValidationError::new(vec![Issue::new(
            &["user_id".to_string()],
            IssueCode::InvalidType {
                expected: "string".to_string(),
                received: "undefined".to_string(),
            },
            "Required",
        )]);

        assert_eq!(
            err.to_string(),
            "1 validation issue: user_id: invalid_type (expected string, received undefined): Required"
        );
    }

    #[test]
    fn test_root_and_nested_paths() {
        let root = Issue::new(&[], IssueCode::InvalidDate, "bad");
        let nested = Issue::new(
            &["sms_charges".to_string(), "0".to_string(), "amount".to_string()],
            IssueCode::InvalidDate,
            "bad",
        );

        assert_eq!(root.dotted_path(), "<root>");
        assert_eq!(nested.dotted_path(), "sms_charges.0.amount");
    }
}
