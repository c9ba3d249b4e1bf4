//! Read-back queries: the log history viewers and reports consume.

use rusqlite::{params, Connection, Row};

use changelog_core::{ChangelogError, ChangelogResult, LogData, LogEntry, TrackedEntity};

use crate::store::SqliteLogStore;
use crate::to_storage_err;

impl SqliteLogStore {
    /// Full history for one entity, in append (id-ascending) order.
    ///
    /// An entity with no persisted identity has no history; asking for one
    /// is an error rather than an empty result.
    pub fn entries_for(&self, entity: &dyn TrackedEntity) -> ChangelogResult<Vec<LogEntry>> {
        let object_type = entity.object_type();
        let object_id = entity
            .object_id()
            .ok_or(ChangelogError::MissingIdentity {
                object_type: object_type.clone(),
            })?;
        self.history(&object_type, &object_id)
    }

    /// History for an object reference, in append order.
    pub fn history(&self, object_type: &str, object_id: &str) -> ChangelogResult<Vec<LogEntry>> {
        self.with_conn(|conn| {
            query_entries(
                conn,
                "SELECT id, related_object_type, related_object_id, parent_id, data,
                        kind, created_at, user_id, hostname, module
                 FROM changelogs
                 WHERE related_object_type = ?1 AND related_object_id = ?2
                 ORDER BY id ASC",
                params![object_type, object_id],
            )
        })
    }

    /// Every entry carrying the given kind tag, in append order.
    pub fn by_kind(&self, kind: &str) -> ChangelogResult<Vec<LogEntry>> {
        self.with_conn(|conn| {
            query_entries(
                conn,
                "SELECT id, related_object_type, related_object_id, parent_id, data,
                        kind, created_at, user_id, hostname, module
                 FROM changelogs
                 WHERE kind = ?1
                 ORDER BY id ASC",
                params![kind],
            )
        })
    }

    /// Every entry grouped under the given parent id, in append order.
    pub fn children_of(&self, parent_id: &str) -> ChangelogResult<Vec<LogEntry>> {
        self.with_conn(|conn| {
            query_entries(
                conn,
                "SELECT id, related_object_type, related_object_id, parent_id, data,
                        kind, created_at, user_id, hostname, module
                 FROM changelogs
                 WHERE parent_id = ?1
                 ORDER BY id ASC",
                params![parent_id],
            )
        })
    }
}

fn query_entries(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> ChangelogResult<Vec<LogEntry>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params, row_to_entry)
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))
}

fn row_to_entry(row: &Row<'_>) -> Result<LogEntry, rusqlite::Error> {
    let data: String = row.get(4)?;
    let created_at: Option<String> = row.get(6)?;
    Ok(LogEntry {
        id: row.get(0)?,
        related_object_type: row.get(1)?,
        related_object_id: row.get(2)?,
        parent_id: row.get(3)?,
        data: LogData::from_column(&data),
        kind: row.get(5)?,
        created_at: created_at.and_then(|s| {
            chrono::DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .ok()
        }),
        user_id: row.get(7)?,
        hostname: row.get(8)?,
        module: row.get(9)?,
    })
}
