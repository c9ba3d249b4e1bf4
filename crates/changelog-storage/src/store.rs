//! `SqliteLogStore` — the durable, ordered, append-only sink.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use changelog_core::{ChangelogResult, LogEntry, LogStore};

use crate::context::{ContextProvider, NullContext};
use crate::schema;
use crate::to_storage_err;

/// Append-only log store over a single SQLite connection.
///
/// Assigns `id` (AUTOINCREMENT) and `created_at` on append, merges the
/// configured save-time context into unset columns, and returns the
/// completed entry. Entries are never updated or deleted here; a rejected
/// append leaves prior rows untouched.
pub struct SqliteLogStore {
    conn: Mutex<Connection>,
    context: Box<dyn ContextProvider>,
}

impl SqliteLogStore {
    /// Open a store backed by a file on disk.
    pub fn open(path: &Path) -> ChangelogResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> ChangelogResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> ChangelogResult<Self> {
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            context: Box::new(NullContext),
        })
    }

    /// Replace the save-time context provider.
    pub fn with_context(mut self, context: impl ContextProvider + 'static) -> Self {
        self.context = Box::new(context);
        self
    }

    /// Run a closure against the connection. Used by the reader module.
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> ChangelogResult<T>,
    ) -> ChangelogResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| to_storage_err("connection mutex poisoned".to_string()))?;
        f(&conn)
    }
}

impl LogStore for SqliteLogStore {
    fn append(&self, entry: &LogEntry) -> ChangelogResult<LogEntry> {
        let mut stored = entry.clone();
        stored.created_at = Some(Utc::now());
        if stored.user_id.is_none() {
            stored.user_id = self.context.user_id();
        }
        if stored.hostname.is_none() {
            stored.hostname = self.context.hostname();
        }
        if stored.module.is_none() {
            stored.module = self.context.module();
        }

        let data = stored.data.to_column()?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO changelogs (
                    related_object_type, related_object_id, parent_id, data,
                    kind, created_at, user_id, hostname, module
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    stored.related_object_type,
                    stored.related_object_id,
                    stored.parent_id,
                    data,
                    stored.kind,
                    stored.created_at.map(|t| t.to_rfc3339()),
                    stored.user_id,
                    stored.hostname,
                    stored.module,
                ],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;

            stored.id = Some(conn.last_insert_rowid());
            tracing::debug!(
                id = stored.id,
                object_type = %stored.related_object_type,
                object_id = %stored.related_object_id,
                kind = %stored.kind,
                "appended log entry"
            );
            Ok(stored)
        })
    }
}
