//! Wiring layer for the `pagetrace` CLI: builds a recorder over the
//! in-memory log and drives a scripted demo session through the real
//! pipeline.

pub mod demo;

use std::sync::Arc;

use recorder::{ManualClock, Recorder, RecorderSettings};
use transcript_log::MemoryTranscriptLog;

pub use demo::run_demo;

/// A recorder wired to an in-memory log and a hand-driven clock.
pub fn build_recorder(
    settings: RecorderSettings,
) -> (Arc<Recorder>, Arc<MemoryTranscriptLog>, Arc<ManualClock>) {
    let log = Arc::new(MemoryTranscriptLog::new());
    let clock = Arc::new(ManualClock::new(0));
    let recorder = Arc::new(Recorder::new(log.clone(), clock.clone(), settings));
    (recorder, log, clock)
}
