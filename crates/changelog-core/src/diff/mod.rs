//! Diff computation: field-level comparison of entity state plus computed
//! ("custom") fields with a per-instance value cache.

pub mod custom_fields;
pub mod engine;

pub use custom_fields::{resolve_path, CustomField, CustomFieldCache};
pub use engine::{cache_custom_fields, custom_fields_diff, delete_snapshot, update_diff};
