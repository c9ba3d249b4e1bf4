//! The change record: an ordered map of field name to `[old, new]` pair,
//! with computed fields nested under a reserved key.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved key whose value is the nested record of computed fields.
pub const CUSTOM_FIELDS_KEY: &str = "custom_fields";

/// Field-level diff of one entity mutation.
///
/// A plain key maps to a two-element `[old, new]` array. The reserved
/// `custom_fields` key, when present, maps to a nested object of the same
/// shape. A key is present only when old and new differ under the engine's
/// comparison rule, or the field is force-written. Empty means "write no
/// entry" for update/insert events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeRecord(serde_json::Map<String, Value>);

impl ChangeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Record `[old, new]` for a field, replacing any previous pair.
    pub fn push(&mut self, name: impl Into<String>, old: Value, new: Value) {
        self.0.insert(name.into(), Value::Array(vec![old, new]));
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// The `(old, new)` pair recorded for a field, if any.
    pub fn get(&self, name: &str) -> Option<(&Value, &Value)> {
        match self.0.get(name) {
            Some(Value::Array(pair)) if pair.len() == 2 => Some((&pair[0], &pair[1])),
            _ => None,
        }
    }

    /// Iterate field names alongside their `(old, new)` pairs, skipping the
    /// nested custom-fields object.
    pub fn iter(&self) -> impl Iterator<Item = (&str, (&Value, &Value))> {
        self.0.iter().filter_map(|(name, value)| match value {
            Value::Array(pair) if pair.len() == 2 => {
                Some((name.as_str(), (&pair[0], &pair[1])))
            }
            _ => None,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Drop every excluded field. Exact name match, no globbing; the order
    /// of the remaining fields is preserved.
    pub fn exclude(&mut self, excluded: &HashSet<String>) {
        self.0.retain(|name, _| !excluded.contains(name));
    }

    /// Nest a computed-fields record under the reserved key. An empty
    /// sub-record never produces the key.
    pub fn set_custom_fields(&mut self, sub: ChangeRecord) {
        if !sub.is_empty() {
            self.0
                .insert(CUSTOM_FIELDS_KEY.to_string(), Value::Object(sub.0));
        }
    }

    /// The nested computed-fields record, if present.
    pub fn custom_fields(&self) -> Option<ChangeRecord> {
        match self.0.get(CUSTOM_FIELDS_KEY) {
            Some(Value::Object(map)) => Some(ChangeRecord(map.clone())),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
