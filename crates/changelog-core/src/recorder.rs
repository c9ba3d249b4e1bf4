//! Lifecycle facade: one recorder per tracked entity instance, invoked
//! explicitly at the four lifecycle points (after find, after update,
//! after insert, before delete).

use std::collections::HashSet;

use serde_json::Value;

use crate::builder::{LabelHook, LogEntryBuilder, ParentId};
use crate::diff::custom_fields::{CustomField, CustomFieldCache};
use crate::diff::engine;
use crate::entry::{LogEntry, DEFAULT_KIND};
use crate::errors::{ChangelogError, ChangelogResult};
use crate::traits::{LogStore, TrackedEntity};
use crate::value::Snapshot;

/// Change tracking attached to one entity instance.
///
/// Owns the custom-field cache, so it must live as long as the entity it
/// tracks. The cache read/compute/write-back sequence is not synchronized:
/// at most one save of a given entity instance may be in flight at a time,
/// and callers serialize saves externally.
pub struct ChangeRecorder {
    excluded_attributes: HashSet<String>,
    custom_fields: Vec<CustomField>,
    kind: String,
    parent_id: ParentId,
    auto_cache: bool,
    data_on_delete: bool,
    labels: Option<LabelHook>,
    cache: CustomFieldCache,
}

impl std::fmt::Debug for ChangeRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeRecorder")
            .field("excluded_attributes", &self.excluded_attributes)
            .field("custom_fields", &self.custom_fields)
            .field("kind", &self.kind)
            .field("parent_id", &self.parent_id)
            .field("auto_cache", &self.auto_cache)
            .field("data_on_delete", &self.data_on_delete)
            .field("labels", &self.labels.as_ref().map(|_| "<hook>"))
            .field("cache", &self.cache)
            .finish()
    }
}

impl Default for ChangeRecorder {
    fn default() -> Self {
        Self {
            excluded_attributes: HashSet::new(),
            custom_fields: Vec::new(),
            kind: DEFAULT_KIND.to_string(),
            parent_id: ParentId::None,
            auto_cache: false,
            data_on_delete: false,
            labels: None,
            cache: CustomFieldCache::new(),
        }
    }
}

impl ChangeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute names dropped from every diff (exact match).
    pub fn exclude<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_attributes
            .extend(attributes.into_iter().map(Into::into));
        self
    }

    pub fn custom_field(mut self, field: CustomField) -> Self {
        self.custom_fields.push(field);
        self
    }

    /// Default kind tag for update/insert entries.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_parent_id(mut self, parent_id: ParentId) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Prime the custom-field cache automatically in [`Self::after_find`].
    /// Every load then pays the full custom-field computation.
    pub fn with_auto_cache(mut self, auto_cache: bool) -> Self {
        self.auto_cache = auto_cache;
        self
    }

    /// Capture a full attribute snapshot on delete instead of the empty
    /// sentinel.
    pub fn with_data_on_delete(mut self, data_on_delete: bool) -> Self {
        self.data_on_delete = data_on_delete;
        self
    }

    pub fn with_labels(mut self, hook: LabelHook) -> Self {
        self.labels = Some(hook);
        self
    }

    /// Change the kind tag for subsequent entries.
    pub fn set_kind(&mut self, kind: impl Into<String>) {
        self.kind = kind.into();
    }

    pub fn cache(&self) -> &CustomFieldCache {
        &self.cache
    }

    /// Runtime capability check for log retrieval: models that do not carry
    /// a recorder do not track changes, and asking for their log is an
    /// immediate error.
    pub fn require<'a>(
        recorder: Option<&'a ChangeRecorder>,
        object_type: &str,
    ) -> ChangelogResult<&'a ChangeRecorder> {
        recorder.ok_or_else(|| ChangelogError::MissingBehavior {
            object_type: object_type.to_string(),
        })
    }

    /// After-find hook: primes the cache when auto-cache is on, so the
    /// first diff compares against loaded state instead of null.
    pub fn after_find(&mut self, entity: &dyn TrackedEntity) {
        if self.auto_cache {
            self.cache_custom_fields(entity);
        }
    }

    /// Eagerly resolve and cache every custom field's current value.
    pub fn cache_custom_fields(&mut self, entity: &dyn TrackedEntity) {
        if self.custom_fields.is_empty() {
            return;
        }
        self.cache = engine::cache_custom_fields(entity, &self.custom_fields);
    }

    /// After-update hook: diff the touched attributes, append an entry when
    /// anything qualifies, and on success write the emitted custom-field
    /// values back into the cache.
    ///
    /// `touched` maps each modified attribute to its pre-change value, as
    /// reported by the caller's dirty tracking.
    pub fn record_update(
        &mut self,
        store: &dyn LogStore,
        entity: &dyn TrackedEntity,
        touched: &Snapshot,
    ) -> ChangelogResult<Option<LogEntry>> {
        let diff = engine::update_diff(
            entity,
            touched,
            &self.excluded_attributes,
            &self.custom_fields,
            &self.cache,
            false,
        );

        // Capture the engine's own keys before the label hook can rename
        // them; the cache must track what was computed, not what was stored.
        let written_custom = diff.custom_fields();

        let stored = self
            .builder(store)
            .build_from_diff(diff, entity, &self.kind, &self.parent_id)?;

        if stored.is_some() {
            if let Some(written) = written_custom {
                self.cache.absorb(&written);
            }
        }
        Ok(stored)
    }

    /// After-insert hook. The original lifecycle logs inserts through the
    /// same path as updates, with the configured kind.
    pub fn record_insert(
        &mut self,
        store: &dyn LogStore,
        entity: &dyn TrackedEntity,
        touched: &Snapshot,
    ) -> ChangelogResult<Option<LogEntry>> {
        self.record_update(store, entity, touched)
    }

    /// Before-delete hook: append the delete entry, carrying either a full
    /// attribute snapshot or the empty sentinel.
    pub fn record_delete(
        &mut self,
        store: &dyn LogStore,
        entity: &dyn TrackedEntity,
    ) -> ChangelogResult<LogEntry> {
        let data = engine::delete_snapshot(
            entity,
            &self.excluded_attributes,
            &self.custom_fields,
            &self.cache,
            self.data_on_delete,
        );
        self.builder(store).build_delete_entry(data, entity)
    }

    /// Manual log path: record an arbitrary payload without diffing. A kind
    /// override sticks for subsequent entries, matching the original
    /// behavior's type setter.
    pub fn record_custom(
        &mut self,
        store: &dyn LogStore,
        entity: &dyn TrackedEntity,
        data: Value,
        kind: Option<&str>,
    ) -> ChangelogResult<LogEntry> {
        if let Some(kind) = kind {
            self.set_kind(kind);
        }
        self.builder(store).build_custom(data, entity, &self.kind)
    }

    fn builder<'a>(&self, store: &'a dyn LogStore) -> LogEntryBuilder<'a> {
        let builder = LogEntryBuilder::new(store);
        match &self.labels {
            Some(hook) => builder.with_labels(hook.clone()),
            None => builder,
        }
    }
}
