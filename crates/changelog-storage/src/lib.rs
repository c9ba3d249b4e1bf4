//! # changelog-storage
//!
//! SQLite persistence for change-log entries. Implements the core's
//! `LogStore` seam over a single `changelogs` table: ordered append-only
//! writes, save-time context merging (user/hostname/module), and the
//! read-back queries viewers and reports consume.

pub mod context;
pub mod reader;
pub mod schema;
pub mod store;

pub use context::{ContextProvider, NullContext, StaticContext};
pub use store::SqliteLogStore;

use changelog_core::ChangelogError;

/// Map a low-level storage failure into the shared error type.
pub(crate) fn to_storage_err(message: String) -> ChangelogError {
    ChangelogError::Storage { message }
}
