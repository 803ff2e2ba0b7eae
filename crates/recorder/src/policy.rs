use serde::{Deserialize, Serialize};

/// Orchestration limits and flush cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecorderPolicyView {
    /// Periodic flush/limit-check tick.
    pub flush_interval_ms: u64,
    /// Hard cap on the in-memory outbound buffer; reaching it forces an
    /// immediate flush instead of further growth.
    pub buffer_max: usize,
    /// Per-session event ceiling; reaching it ends the session gracefully.
    pub max_events: u64,
    /// Session duration ceiling, checked on the tick interval.
    pub max_duration_ms: u64,
}

impl Default for RecorderPolicyView {
    fn default() -> Self {
        Self {
            flush_interval_ms: 1_000,
            buffer_max: 256,
            max_events: 10_000,
            max_duration_ms: 30 * 60 * 1_000,
        }
    }
}
