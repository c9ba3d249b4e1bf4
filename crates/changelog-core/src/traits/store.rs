use crate::entry::LogEntry;
use crate::errors::ChangelogResult;

/// Durable, ordered, append-only sink for log entries.
///
/// The store assigns `id` and `created_at`, merges save-time context
/// (user/hostname/module), and returns the completed entry. Entries are
/// never updated or deleted through this interface. Failures propagate
/// synchronously; retries, timeouts, and transactional coupling belong to
/// the implementation and its caller.
pub trait LogStore: Send + Sync {
    fn append(&self, entry: &LogEntry) -> ChangelogResult<LogEntry>;
}
