use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::SessionId;

/// One recording session. Created when recording starts; only the recorder
/// mutates it (end timestamp and final count) when recording stops.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub url: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Monotonic milliseconds at session start; event `ts_mono` values are
    /// relative to the same clock.
    pub started_mono_ms: u64,
    pub event_count: u64,
    /// Snapshot of the active configuration at start time.
    pub config: JsonValue,
}

impl Session {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        started_at: DateTime<Utc>,
        started_mono_ms: u64,
        config: JsonValue,
    ) -> Self {
        Self {
            id: SessionId::new(),
            title: title.into(),
            url: url.into(),
            started_at,
            ended_at: None,
            started_mono_ms,
            event_count: 0,
            config,
        }
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}
