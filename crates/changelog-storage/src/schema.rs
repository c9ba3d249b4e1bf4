//! The `changelogs` table: one row per log entry, append-only.

use rusqlite::Connection;

use changelog_core::ChangelogResult;

use crate::to_storage_err;

/// Create the table and indexes if they do not exist. Idempotent.
///
/// `related_object_id` and `parent_id` are TEXT so composite keys fit as a
/// single JSON-encoded value. `data` holds the JSON-encoded record, a plain
/// scalar message, or the literal empty string for the no-snapshot delete
/// case.
pub fn initialize(conn: &Connection) -> ChangelogResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS changelogs (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            related_object_type TEXT NOT NULL,
            related_object_id   TEXT NOT NULL,
            parent_id           TEXT,
            data                TEXT NOT NULL DEFAULT '',
            kind                TEXT NOT NULL,
            created_at          TEXT NOT NULL,
            user_id             TEXT,
            hostname            TEXT,
            module              TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_changelogs_related
            ON changelogs(related_object_type, related_object_id);
        CREATE INDEX IF NOT EXISTS idx_changelogs_kind ON changelogs(kind);
        CREATE INDEX IF NOT EXISTS idx_changelogs_parent ON changelogs(parent_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
