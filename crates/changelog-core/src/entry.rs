//! The persisted unit: one log entry per mutation event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::record::ChangeRecord;

/// Reserved entry kind for delete events.
pub const DELETED: &str = "deleted";

/// Default entry kind for lifecycle events.
pub const DEFAULT_KIND: &str = "update";

/// Payload of a log entry, as stored in the single `data` column.
///
/// `Empty` is the "no data captured" sentinel — the literal empty string,
/// deliberately distinct from a diff with no fields ("nothing changed").
/// Structured payloads are stored JSON-encoded; plain text is stored raw.
#[derive(Debug, Clone, PartialEq)]
pub enum LogData {
    Empty,
    Diff(ChangeRecord),
    Custom(Vec<Value>),
    Text(String),
}

impl LogData {
    /// Encode for the storage column.
    pub fn to_column(&self) -> Result<String, serde_json::Error> {
        match self {
            LogData::Empty => Ok(String::new()),
            LogData::Diff(record) => serde_json::to_string(record),
            LogData::Custom(items) => serde_json::to_string(items),
            LogData::Text(text) => Ok(text.clone()),
        }
    }

    /// Decode from the storage column. Tolerant: anything that is not the
    /// sentinel, a JSON object, or a JSON array reads back as plain text.
    pub fn from_column(column: &str) -> Self {
        if column.is_empty() {
            return LogData::Empty;
        }
        if column.starts_with('{') {
            if let Ok(record) = serde_json::from_str::<ChangeRecord>(column) {
                return LogData::Diff(record);
            }
        }
        if column.starts_with('[') {
            if let Ok(items) = serde_json::from_str::<Vec<Value>>(column) {
                return LogData::Custom(items);
            }
        }
        LogData::Text(column.to_string())
    }
}

impl Serialize for LogData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let column = self.to_column().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&column)
    }
}

impl<'de> Deserialize<'de> for LogData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let column = String::deserialize(deserializer)?;
        Ok(LogData::from_column(&column))
    }
}

/// One persisted change-log entry.
///
/// Constructed fresh per event, immutable after build, appended once.
/// `related_object_type`/`related_object_id` form a weak reference to the
/// entity: lookup only, and the entry outlives what it describes. `id` and
/// `created_at` are assigned by the store; `user_id`, `hostname`, and
/// `module` are save-time context the store merges in — the core never
/// computes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Option<i64>,
    pub related_object_type: String,
    pub related_object_id: String,
    pub parent_id: Option<String>,
    pub data: LogData,
    pub kind: String,
    pub created_at: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
    pub hostname: Option<String>,
    pub module: Option<String>,
}

impl LogEntry {
    /// A fresh, unstored entry referring to the given object.
    pub fn new(
        related_object_type: impl Into<String>,
        related_object_id: impl Into<String>,
        data: LogData,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            related_object_type: related_object_type.into(),
            related_object_id: related_object_id.into(),
            parent_id: None,
            data,
            kind: kind.into(),
            created_at: None,
            user_id: None,
            hostname: None,
            module: None,
        }
    }
}
