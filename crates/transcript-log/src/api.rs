use async_trait::async_trait;
use pagetrace_core_types::{EventRecord, Session, SessionId};

use crate::errors::LogResult;

/// The persistence boundary: an append-only ordered log keyed by session and
/// sequence.
///
/// The recorder delivers with at-least-once semantics — a failed
/// acknowledgment is retried — so implementations must treat the event id as
/// an idempotency key and ignore replays.
#[async_trait]
pub trait TranscriptLog: Send + Sync {
    async fn create_session(&self, session: &Session) -> LogResult<()>;
    async fn update_session(&self, session: &Session) -> LogResult<()>;
    /// Appends a batch, returning how many events were newly accepted
    /// (replayed duplicates are acknowledged but not counted).
    async fn append(&self, events: &[EventRecord]) -> LogResult<usize>;
    /// Events of a session ordered by sequence.
    async fn query_ordered(&self, session: &SessionId) -> LogResult<Vec<EventRecord>>;
    async fn count_events(&self, session: &SessionId) -> LogResult<u64>;
}
