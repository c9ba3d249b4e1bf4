//! The lifecycle-source contract: what the engine needs from an entity
//! undergoing mutation.

use serde_json::Value;

use crate::value::Snapshot;

/// A node reached while walking a dotted field path.
pub enum PathNode<'a> {
    /// Terminal value (scalar or structure).
    Value(Value),
    /// Traversable sub-object; the walk continues into it.
    Object(&'a dyn FieldLookup),
    /// Zero-argument invocable. Invoked only when it is the final segment;
    /// mid-path it is not traversable and the walk resolves to null.
    Thunk(&'a dyn Fn() -> Value),
}

/// Duck-typed attribute access for dotted-path resolution. A missing field
/// is `None`, never an error.
pub trait FieldLookup {
    fn field(&self, name: &str) -> Option<PathNode<'_>>;
}

/// A database-backed record the engine can diff and reference.
///
/// Implementations supply a stable type discriminator (covering joined or
/// composite entity kinds), a serializable identity, and read access to the
/// current attribute values. Dirty tracking stays with the caller: the set
/// of touched attributes with pre-change values is an input to the engine.
pub trait TrackedEntity: FieldLookup {
    /// Type discriminator stored on every entry referring to this entity.
    fn object_type(&self) -> String;

    /// Identity as a single string; composite keys serialize to one JSON
    /// array (see [`crate::value::serialize_key`]). `None` means the entity
    /// has no persisted identity yet.
    fn object_id(&self) -> Option<String>;

    /// Full current attribute snapshot, used for delete-time capture.
    fn attributes(&self) -> Snapshot;

    /// Current value of one attribute.
    fn attribute(&self, name: &str) -> Option<Value> {
        self.attributes().get(name).cloned()
    }
}
