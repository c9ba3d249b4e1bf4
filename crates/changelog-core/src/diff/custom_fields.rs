//! Computed-field specs, dotted-path resolution, and the per-instance
//! last-observed-value cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::record::ChangeRecord;
use crate::traits::{FieldLookup, PathNode, TrackedEntity};

/// Trailing marker on a field name meaning "always force a diff entry".
pub const FORCE_SUFFIX: char = '!';

/// How a custom field's current value is obtained.
#[derive(Clone)]
enum CustomFieldSource {
    /// Dotted attribute/method-chain path walked against the owning entity.
    Path(String),
    /// Pure function of the owning entity.
    Func(Arc<dyn Fn(&dyn TrackedEntity) -> Value + Send + Sync>),
}

/// A named computed field attached to an entity's change log.
///
/// A name ending in `!` is force-written: it appears in every diff
/// regardless of equality. The stored key always has the suffix stripped.
#[derive(Clone)]
pub struct CustomField {
    name: String,
    source: CustomFieldSource,
}

impl CustomField {
    /// Spec from a dotted path; the name defaults to the path text, which
    /// may carry the force suffix.
    pub fn path(path: impl Into<String>) -> Self {
        let name = path.into();
        let path = name.trim_end_matches(FORCE_SUFFIX).to_string();
        Self {
            name,
            source: CustomFieldSource::Path(path),
        }
    }

    /// Spec from a function of the owning entity.
    pub fn computed<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&dyn TrackedEntity) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            source: CustomFieldSource::Func(Arc::new(f)),
        }
    }

    /// Cache/emission key: the name with any force suffix stripped.
    pub fn key(&self) -> &str {
        self.name.trim_end_matches(FORCE_SUFFIX)
    }

    pub fn is_forced(&self) -> bool {
        self.name.ends_with(FORCE_SUFFIX)
    }

    /// Current value against the owning entity. Never errors: a path miss
    /// resolves to null.
    pub fn resolve(&self, entity: &dyn TrackedEntity) -> Value {
        match &self.source {
            CustomFieldSource::Path(path) => resolve_path(entity, path),
            CustomFieldSource::Func(f) => f(entity),
        }
    }
}

impl fmt::Debug for CustomField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            CustomFieldSource::Path(path) => {
                f.debug_struct("CustomField").field("name", &self.name).field("path", path).finish()
            }
            CustomFieldSource::Func(_) => {
                f.debug_struct("CustomField").field("name", &self.name).field("func", &"<fn>").finish()
            }
        }
    }
}

/// Walk a dotted path against an entity. Any segment that is absent or not
/// traversable resolves the whole path to null. A thunk reached as the
/// final segment is invoked with no arguments to obtain the value.
pub fn resolve_path(root: &dyn FieldLookup, path: &str) -> Value {
    enum Cursor<'a> {
        Lookup(&'a dyn FieldLookup),
        Owned(Value),
    }

    let mut segments = path.split('.').peekable();
    let mut cursor = Cursor::Lookup(root);

    while let Some(segment) = segments.next() {
        let is_last = segments.peek().is_none();
        cursor = match cursor {
            Cursor::Lookup(lookup) => match lookup.field(segment) {
                Some(PathNode::Value(value)) => Cursor::Owned(value),
                Some(PathNode::Object(object)) => Cursor::Lookup(object),
                Some(PathNode::Thunk(thunk)) if is_last => Cursor::Owned(thunk()),
                _ => return Value::Null,
            },
            Cursor::Owned(Value::Object(map)) => match map.get(segment) {
                Some(value) => Cursor::Owned(value.clone()),
                None => return Value::Null,
            },
            // A scalar mid-path is not traversable.
            Cursor::Owned(_) => return Value::Null,
        };
    }

    match cursor {
        Cursor::Owned(value) => value,
        // Path ended on a traversable object with no terminal value.
        Cursor::Lookup(_) => Value::Null,
    }
}

/// Per-entity-instance map from custom field name to last-observed value.
///
/// Lives as long as its entity instance; never persisted. Absent entries
/// compare as null, so the first diff after load reports `[null, value]`
/// unless the cache was primed (see `cache_custom_fields`). Single-writer:
/// callers must serialize saves of a given entity instance.
#[derive(Debug, Clone, Default)]
pub struct CustomFieldCache(HashMap<String, Value>);

impl CustomFieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Write-back after a successful log write: update exactly the keys the
    /// persisted diff emitted with their new values, leaving other cached
    /// entries untouched. Subsequent diffs then compare against
    /// last-logged state rather than last-loaded state.
    pub fn absorb(&mut self, written: &ChangeRecord) {
        for (name, (_, new)) in written.iter() {
            self.0.insert(name.to_string(), new.clone());
        }
    }
}
