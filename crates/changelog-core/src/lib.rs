//! # changelog-core
//!
//! Change-tracking engine for database-backed record objects: computes
//! field-level diffs between old and new entity state, attaches computed
//! ("custom") fields with a per-instance value cache, and shapes the result
//! into durable log entries dispatched to an append-only store.
//!
//! The engine is synchronous and stateless apart from the per-entity
//! custom-field cache. Persistence lives behind the [`traits::LogStore`]
//! seam; `changelog-storage` provides the SQLite implementation.

pub mod builder;
pub mod diff;
pub mod entry;
pub mod errors;
pub mod record;
pub mod recorder;
pub mod traits;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use builder::{LabelHook, LogEntryBuilder, ParentId};
pub use diff::{CustomField, CustomFieldCache};
pub use entry::{LogData, LogEntry, DEFAULT_KIND, DELETED};
pub use errors::{ChangelogError, ChangelogResult};
pub use record::{ChangeRecord, CUSTOM_FIELDS_KEY};
pub use recorder::ChangeRecorder;
pub use traits::{FieldLookup, LogStore, PathNode, TrackedEntity};
pub use value::Snapshot;
