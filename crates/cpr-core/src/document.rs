//! # Document Merging
//!
//! Partial updates arrive as JSON objects holding only the fields to change.
//! They are applied the way the back office has always applied them: each
//! top-level key in the patch replaces the stored value wholesale, nested
//! objects included.
//!
//! ```text
//! stored:  { "name": "Rafi", "emergencyContact": { "name": "A", "phone": "1" } }
//! patch:   { "emergencyContact": { "name": "B" } }
//! result:  { "name": "Rafi", "emergencyContact": { "name": "B" } }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};

/// Keys a patch can never overwrite.
pub const PROTECTED_KEYS: &[&str] = &["_id", "createdAt"];

/// Applies `patch` on top of `current` and decodes the result back into `T`.
///
/// Keys listed in [`PROTECTED_KEYS`] are ignored. A patch that leaves the
/// document in a shape `T` cannot decode is an [`CoreError::InvalidUpdate`].
pub fn merge_top_level<T>(current: &T, patch: Map<String, Value>) -> CoreResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut doc = match serde_json::to_value(current) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(CoreError::InvalidUpdate("record is not an object".into())),
        Err(e) => return Err(CoreError::InvalidUpdate(e.to_string())),
    };

    for (key, value) in patch {
        if PROTECTED_KEYS.contains(&key.as_str()) {
            continue;
        }
        doc.insert(key, value);
    }

    serde_json::from_value(Value::Object(doc)).map_err(|e| CoreError::InvalidUpdate(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Doc {
        #[serde(rename = "_id")]
        id: String,
        name: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_replaces_top_level_fields() {
        let doc = Doc {
            id: "a".into(),
            name: "old".into(),
            tags: vec!["x".into()],
        };
        let merged = merge_top_level(&doc, patch(json!({ "name": "new" }))).unwrap();
        assert_eq!(merged.name, "new");
        assert_eq!(merged.tags, vec!["x".to_string()]);
    }

    #[test]
    fn test_ignores_protected_keys() {
        let doc = Doc {
            id: "a".into(),
            name: "n".into(),
            tags: vec![],
        };
        let merged = merge_top_level(&doc, patch(json!({ "_id": "b" }))).unwrap();
        assert_eq!(merged.id, "a");
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let doc = Doc {
            id: "a".into(),
            name: "n".into(),
            tags: vec![],
        };
        let err = merge_top_level(&doc, patch(json!({ "tags": 5 }))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidUpdate(_)));
    }
}
