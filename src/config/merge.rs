//! Field-by-field merging of configuration tiers.
//!
//! Objects merge recursively; every other value (arrays included) is
//! replaced by the higher tier. A null in the overlay means "not specified"
//! and keeps the lower tier's value.

use serde_json::Value;

/// Merge `overlay` on top of `base`.
///
/// # Example
/// ```
/// use serde_json::json;
/// use task_tree::config::deep_merge;
///
/// let defaults = json!({"database": {"path": "tasks.db", "busy_timeout_ms": 5000}});
/// let project = json!({"database": {"path": "project.db"}});
/// let merged = deep_merge(defaults, project);
/// assert_eq!(merged, json!({"database": {"path": "project.db", "busy_timeout_ms": 5000}}));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge tiers in order, lowest priority first.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
