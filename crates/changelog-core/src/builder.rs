//! Wraps a change record (or raw payload) with its metadata and dispatches
//! the resulting entry to the store.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::entry::{LogData, LogEntry, DELETED};
use crate::errors::{ChangelogError, ChangelogResult};
use crate::record::ChangeRecord;
use crate::traits::{LogStore, TrackedEntity};
use crate::value::to_id_string;

/// Caller-overridable transform applied to every diff before storage, so
/// downstream consumers can rename or relabel keys. Identity by default.
pub type LabelHook = Arc<dyn Fn(ChangeRecord) -> ChangeRecord + Send + Sync>;

/// How the optional parent/grouping identifier is resolved off the owner.
#[derive(Clone, Default)]
pub enum ParentId {
    #[default]
    None,
    /// Read a named attribute off the owner.
    Attribute(String),
    /// Call a resolver with the owner.
    Resolver(Arc<dyn Fn(&dyn TrackedEntity) -> Option<Value> + Send + Sync>),
}

impl ParentId {
    pub fn resolve(&self, entity: &dyn TrackedEntity) -> Option<String> {
        match self {
            ParentId::None => None,
            ParentId::Attribute(name) => {
                entity.attribute(name).as_ref().and_then(to_id_string)
            }
            ParentId::Resolver(f) => f(entity).as_ref().and_then(to_id_string),
        }
    }
}

impl fmt::Debug for ParentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentId::None => f.write_str("ParentId::None"),
            ParentId::Attribute(name) => write!(f, "ParentId::Attribute({name:?})"),
            ParentId::Resolver(_) => f.write_str("ParentId::Resolver(<fn>)"),
        }
    }
}

/// One-shot constructor of log entries for a single store.
///
/// No state beyond its configuration survives a call; the per-entity cache
/// lives with the recorder, not here.
pub struct LogEntryBuilder<'a> {
    store: &'a dyn LogStore,
    labels: Option<LabelHook>,
}

impl<'a> LogEntryBuilder<'a> {
    pub fn new(store: &'a dyn LogStore) -> Self {
        Self { store, labels: None }
    }

    pub fn with_labels(mut self, hook: LabelHook) -> Self {
        self.labels = Some(hook);
        self
    }

    /// Build and append an entry for a computed diff. An empty diff is a
    /// no-op: the store sees zero calls and `None` is returned.
    pub fn build_from_diff(
        &self,
        diff: ChangeRecord,
        entity: &dyn TrackedEntity,
        kind: &str,
        parent_id: &ParentId,
    ) -> ChangelogResult<Option<LogEntry>> {
        if diff.is_empty() {
            tracing::debug!(
                object_type = %entity.object_type(),
                kind,
                "no attribute changes, skipping log entry"
            );
            return Ok(None);
        }

        let mut entry = LogEntry::new(
            entity.object_type(),
            self.require_id(entity)?,
            LogData::Diff(self.apply_labels(diff)),
            kind,
        );
        entry.parent_id = parent_id.resolve(entity);

        let stored = self.store.append(&entry)?;
        tracing::debug!(
            object_type = %stored.related_object_type,
            object_id = %stored.related_object_id,
            kind = %stored.kind,
            id = stored.id,
            "appended change log entry"
        );
        Ok(Some(stored))
    }

    /// Build and append an explicit entry carrying arbitrary payload,
    /// bypassing diff computation. Non-sequence input is normalized into a
    /// one-element sequence.
    pub fn build_custom(
        &self,
        data: Value,
        entity: &dyn TrackedEntity,
        kind: &str,
    ) -> ChangelogResult<LogEntry> {
        let items = match data {
            Value::Array(items) => items,
            other => vec![other],
        };

        let entry = LogEntry::new(
            entity.object_type(),
            self.require_id(entity)?,
            LogData::Custom(items),
            kind,
        );
        self.store.append(&entry)
    }

    /// Build and append the delete-time entry. The kind is fixed to the
    /// reserved `deleted` tag; `data` is whatever the delete snapshot
    /// produced, possibly the empty sentinel.
    pub fn build_delete_entry(
        &self,
        data: LogData,
        entity: &dyn TrackedEntity,
    ) -> ChangelogResult<LogEntry> {
        let data = match data {
            LogData::Diff(diff) => LogData::Diff(self.apply_labels(diff)),
            other => other,
        };

        let entry = LogEntry::new(
            entity.object_type(),
            self.require_id(entity)?,
            data,
            DELETED,
        );
        self.store.append(&entry)
    }

    fn apply_labels(&self, diff: ChangeRecord) -> ChangeRecord {
        match &self.labels {
            Some(hook) => hook(diff),
            None => diff,
        }
    }

    fn require_id(&self, entity: &dyn TrackedEntity) -> ChangelogResult<String> {
        entity.object_id().ok_or_else(|| ChangelogError::MissingIdentity {
            object_type: entity.object_type(),
        })
    }
}
