//! Recursive record merge.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How two arrays at the same location are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayMergePolicy {
    /// Keep the earlier elements, then append each later element that is
    /// not already present (structural equality)
    #[default]
    ConcatDedup,
    /// The later array replaces the earlier one
    Replace,
}

/// Merge `source` into `target`, `source` taking precedence.
///
/// - object + object: merged key by key, recursively; keys only in
///   `target` are kept
/// - array + array: combined according to `policy`
/// - anything else: `source` replaces `target`
pub fn deep_merge(target: &mut Value, source: &Value, policy: ArrayMergePolicy) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, source_value) in source_map {
                match target_map.get_mut(key) {
                    Some(target_value) => deep_merge(target_value, source_value, policy),
                    None => {
                        target_map.insert(key.clone(), source_value.clone());
                    }
                }
            }
        }
        (Value::Array(target_items), Value::Array(source_items))
            if policy == ArrayMergePolicy::ConcatDedup =>
        {
            for item in source_items {
                if !target_items.contains(item) {
                    target_items.push(item.clone());
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Fold `values` left to right into one fresh value
pub fn merge_all<'a, I>(values: I, policy: ArrayMergePolicy) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut merged = Value::Object(serde_json::Map::new());
    for value in values {
        deep_merge(&mut merged, value, policy);
    }
    merged
}
