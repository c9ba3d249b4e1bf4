//! Error types shared across the changelog crates.

/// Errors surfaced by diff computation, entry construction, and storage.
#[derive(Debug, thiserror::Error)]
pub enum ChangelogError {
    /// Log retrieval was requested for a model that does not carry the
    /// change-tracking capability.
    #[error("change log requested for `{object_type}`, which does not track changes")]
    MissingBehavior { object_type: String },

    /// The entity has no persisted identity yet, so no entry can refer to it.
    #[error("`{object_type}` has no persisted identity; cannot reference it from a log entry")]
    MissingIdentity { object_type: String },

    /// Append or read against the log store failed. Never retried here;
    /// the caller decides transactional coupling.
    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ChangelogResult<T> = Result<T, ChangelogError>;
