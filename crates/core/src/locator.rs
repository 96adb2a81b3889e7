//! Locates a world patch anywhere inside a normalized agent event.
//!
//! The agent runtime wraps tool results in envelopes whose names change with
//! the SDK version (`toolResponse`, `actions[].functionResponse.response`,
//! `content.parts[].functionResponse`, ...). The search only relies on the
//! five canonical patch keys, never on the wrapper names.

use serde_json::Value;

pub const PATCH_KEYS: [&str; 5] = ["effect", "color", "intensity", "spawn", "caption"];

/// Returns true when `value` is a mapping holding every patch key.
pub fn is_patch_shaped(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| PATCH_KEYS.iter().all(|key| map.contains_key(*key)))
}

/// Depth-first search for the first patch-shaped value.
///
/// At each mapping the mapping itself is tested first, then its `patch`
/// entry, then its values in order. Sequences are searched element by
/// element. The first hit ends the search.
pub fn find_patch(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if is_patch_shaped(value) {
                return Some(value);
            }
            if let Some(wrapped) = map.get("patch").filter(|patch| is_patch_shaped(patch)) {
                return Some(wrapped);
            }
            map.values().find_map(find_patch)
        }
        Value::Array(items) => items.iter().find_map(find_patch),
        _ => None,
    }
}
