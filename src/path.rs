//! Dotted-path addressing for nested records.
//!
//! A record is a `serde_json::Value` tree. Paths such as `usage.data.total_mb`
//! address a location by descending one object key per segment. Reads are
//! lenient (a broken path is simply "undefined"), writes create the
//! intermediate objects they need.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Represents a path to a field in a nested record
///
/// # Examples
///
/// - `user_id` - top-level key
/// - `usage.data.total_mb` - nested keys
/// - `sms:ChargeSMS.sms:UserID` - namespaced XML element names
/// - `items.[0].name` - array element (read-only)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath {
    /// The raw path string
    pub raw: String,
    /// Parsed path segments
    pub segments: Vec<PathSegment>,
}

/// A segment in a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named field (e.g., "usage", "total_mb")
    Field(String),
    /// An array index (e.g., [0], [5])
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Error raised when a value cannot be written at a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path has no segments
    EmptyPath,
    /// A non-object value already occupies an intermediate segment
    NotAContainer { path: String, segment: String },
    /// Index segments can only be read
    IndexNotWritable { path: String, index: usize },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::EmptyPath => write!(f, "Cannot write to an empty path"),
            PathError::NotAContainer { path, segment } => write!(
                f,
                "Cannot write '{}': segment '{}' holds a non-object value",
                path, segment
            ),
            PathError::IndexNotWritable { path, index } => write!(
                f,
                "Cannot write '{}': index segment [{}] is read-only",
                path, index
            ),
        }
    }
}

impl std::error::Error for PathError {}

impl FieldPath {
    /// Parse a field path with a given delimiter
    ///
    /// # Example
    ///
    /// ```
    /// use mvnomap::FieldPath;
    ///
    /// let path = FieldPath::parse("usage.data.country", ".");
    /// assert_eq!(path.segments.len(), 3);
    /// ```
    pub fn parse(path: &str, delimiter: &str) -> Self {
        let segments = path
            .split(delimiter)
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.starts_with('[') && s.ends_with(']') {
                    if let Ok(index) = s[1..s.len() - 1].parse::<usize>() {
                        return PathSegment::Index(index);
                    }
                }

                PathSegment::Field(s.to_string())
            })
            .collect();

        Self {
            raw: path.to_string(),
            segments,
        }
    }

    /// Create a field path from a dotted string (common format)
    pub fn from_dotted(path: &str) -> Self {
        Self::parse(path, ".")
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when `self` addresses a location strictly inside `other`.
    ///
    /// Writing both paths into one record would require `other` to be a
    /// scalar and an object at the same time.
    pub fn is_strictly_below(&self, other: &FieldPath) -> bool {
        self.segments.len() > other.segments.len()
            && self.segments[..other.segments.len()] == other.segments[..]
    }

    /// Resolve the path against `record`.
    ///
    /// Returns `None` ("undefined") when any segment is missing or an
    /// intermediate value cannot be descended into. An explicit `null`
    /// stored at the path is a defined value.
    pub fn read<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        if self.segments.is_empty() {
            return None;
        }

        let mut current = record;
        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Field(name), Value::Object(map)) => map.get(name)?,
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Assign `value` at the path, creating an empty object for every
    /// missing intermediate segment.
    ///
    /// `record` must be an object. Finding a scalar or array where an
    /// intermediate object is expected is a mapping configuration defect and
    /// is reported, never repaired.
    pub fn write(&self, record: &mut Value, value: Value) -> Result<(), PathError> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Err(PathError::EmptyPath);
        };

        let mut current = as_object_mut(record, &self.raw, "<root>")?;
        for segment in parents {
            let name = self.field_name(segment)?;
            let child = current
                .entry(name.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = as_object_mut(child, &self.raw, name)?;
        }

        let name = self.field_name(last)?;
        current.insert(name.to_string(), value);
        Ok(())
    }

    fn field_name<'a>(&self, segment: &'a PathSegment) -> Result<&'a str, PathError> {
        match segment {
            PathSegment::Field(name) => Ok(name),
            PathSegment::Index(index) => Err(PathError::IndexNotWritable {
                path: self.raw.clone(),
                index: *index,
            }),
        }
    }
}

fn as_object_mut<'a>(
    value: &'a mut Value,
    path: &str,
    segment: &str,
) -> Result<&'a mut Map<String, Value>, PathError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(PathError::NotAContainer {
            path: path.to_string(),
            segment: segment.to_string(),
        }),
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<String> for FieldPath {
    fn from(raw: String) -> Self {
        Self::from_dotted(&raw)
    }
}

impl From<&str> for FieldPath {
    fn from(raw: &str) -> Self {
        Self::from_dotted(raw)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.raw
    }
}
