use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde_json::Value;

use crate::errors::HarnessError;

/// One recorded request/response pair.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CassetteEntry {
    pub entity: String,
    pub action: String,
    /// Request parameters; defaults to an empty object.
    #[serde(default = "empty_params")]
    pub params: Value,
    pub response: Value,
}

fn empty_params() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Deterministic response fixtures keyed by entity, action, and params.
///
/// A plain dictionary: no matching heuristics, no fallthrough. Lookups are
/// insensitive to params key ordering because keys are canonicalized into the
/// store key.
#[derive(Debug, Default)]
pub struct CassetteStore {
    responses: HashMap<String, Value>,
}

impl CassetteStore {
    /// Builds a store from in-memory entries. Later duplicates win.
    pub fn from_entries(entries: impl IntoIterator<Item = CassetteEntry>) -> Self {
        let mut responses = HashMap::new();
        for entry in entries {
            responses.insert(
                store_key(&entry.entity, &entry.action, &entry.params),
                entry.response,
            );
        }
        Self { responses }
    }

    /// Loads a store from a JSON file holding an array of entries.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Cassette(format!("failed to read {}: {e}", path.display()))
        })?;
        let entries: Vec<CassetteEntry> = serde_json::from_str(&raw).map_err(|e| {
            HarnessError::Cassette(format!("failed to parse {}: {e}", path.display()))
        })?;
        Ok(Self::from_entries(entries))
    }

    /// Returns the recorded response for an exact entity/action/params triple.
    pub fn lookup(&self, entity: &str, action: &str, params: &Value) -> Option<&Value> {
        self.responses.get(&store_key(entity, action, params))
    }

    /// Number of recorded responses.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// True when the store holds no responses.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

fn store_key(entity: &str, action: &str, params: &Value) -> String {
    format!("{entity}::{action}::{}", canonical_json(params))
}

/// Serializes with recursively sorted object keys.
fn canonical_json(value: &Value) -> String {
    fn canonicalize(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<&String, &Value> = map.iter().collect();
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, value) in sorted {
                    out.insert(key.clone(), canonicalize(value));
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
            other => other.clone(),
        }
    }
    canonicalize(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write as _;

    fn store() -> CassetteStore {
        CassetteStore::from_entries(vec![
            CassetteEntry {
                entity: "users".into(),
                action: "list".into(),
                params: json!({"limit": 5, "offset": 0}),
                response: json!({"data": [{"id": 1}]}),
            },
            CassetteEntry {
                entity: "users".into(),
                action: "get".into(),
                params: json!({"id": 1}),
                response: json!({"id": 1, "name": "Ada"}),
            },
        ])
    }

    #[test]
    fn lookup_is_insensitive_to_params_key_order() {
        let store = store();
        let reordered = json!({"offset": 0, "limit": 5});
        assert_eq!(
            store.lookup("users", "list", &reordered),
            Some(&json!({"data": [{"id": 1}]}))
        );
    }

    #[test]
    fn lookup_misses_on_different_params_or_action() {
        let store = store();
        assert_eq!(store.lookup("users", "list", &json!({"limit": 6, "offset": 0})), None);
        assert_eq!(store.lookup("users", "delete", &json!({"id": 1})), None);
    }

    #[test]
    fn load_parses_entry_array_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"[{{"entity": "users", "action": "list", "response": {{"data": []}}}}]"#
        )
        .expect("write cassette");

        let store = CassetteStore::load(file.path()).expect("load cassette");
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.lookup("users", "list", &json!({})),
            Some(&json!({"data": []}))
        );
    }

    #[test]
    fn load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "not json").expect("write cassette");
        let err = CassetteStore::load(file.path()).expect_err("malformed cassette");
        assert!(matches!(err, HarnessError::Cassette(message) if message.contains("parse")));
    }
}
