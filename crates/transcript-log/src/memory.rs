use async_trait::async_trait;
use dashmap::DashMap;
use pagetrace_core_types::{EventRecord, Session, SessionId};

use crate::api::TranscriptLog;
use crate::errors::{LogError, LogResult};
use crate::idempotency::SeenEvents;

const DEFAULT_SEEN_CAPACITY: usize = 64_000;

struct SessionRecord {
    session: Session,
    events: Vec<EventRecord>,
}

/// In-memory reference implementation of the persistence boundary. Suitable
/// for tests and for exports within a single process lifetime.
pub struct MemoryTranscriptLog {
    sessions: DashMap<SessionId, SessionRecord>,
    seen: SeenEvents,
}

impl MemoryTranscriptLog {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            seen: SeenEvents::with_capacity(DEFAULT_SEEN_CAPACITY),
        }
    }

    pub fn session(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id).map(|record| record.session.clone())
    }
}

impl Default for MemoryTranscriptLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptLog for MemoryTranscriptLog {
    async fn create_session(&self, session: &Session) -> LogResult<()> {
        self.sessions.insert(
            session.id.clone(),
            SessionRecord {
                session: session.clone(),
                events: Vec::new(),
            },
        );
        Ok(())
    }

    async fn update_session(&self, session: &Session) -> LogResult<()> {
        let mut record = self
            .sessions
            .get_mut(&session.id)
            .ok_or_else(|| LogError::UnknownSession(session.id.0.clone()))?;
        record.session = session.clone();
        Ok(())
    }

    async fn append(&self, events: &[EventRecord]) -> LogResult<usize> {
        let mut accepted = 0;
        for event in events {
            let mut record = self
                .sessions
                .get_mut(&event.session)
                .ok_or_else(|| LogError::UnknownSession(event.session.0.clone()))?;
            if !self.seen.first_seen(&event.id.0) {
                continue;
            }
            record.events.push(event.clone());
            accepted += 1;
        }
        Ok(accepted)
    }

    async fn query_ordered(&self, session: &SessionId) -> LogResult<Vec<EventRecord>> {
        let record = self
            .sessions
            .get(session)
            .ok_or_else(|| LogError::UnknownSession(session.0.clone()))?;
        let mut events = record.events.clone();
        events.sort_by_key(|event| event.seq);
        Ok(events)
    }

    async fn count_events(&self, session: &SessionId) -> LogResult<u64> {
        let record = self
            .sessions
            .get(session)
            .ok_or_else(|| LogError::UnknownSession(session.0.clone()))?;
        Ok(record.events.len() as u64)
    }
}
