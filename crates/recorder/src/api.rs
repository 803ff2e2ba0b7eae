use std::collections::VecDeque;
use std::sync::Arc;

use capture::{
    CapturePolicyView, ChangeBatcher, ChangeNotification, InteractionCapturer,
    InteractionNotification,
};
use chrono::Utc;
use dom_snapshot::DomTree;
use pagetrace_core_types::{EventDraft, EventRecord, Session};
use redaction::{RedactionEngine, RedactionRule};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};
use transcript_log::TranscriptLog;

use crate::clock::MonoClock;
use crate::errors::{RecorderError, RecorderResult};
use crate::policy::RecorderPolicyView;

#[derive(Clone, Debug, Default)]
pub struct SessionMeta {
    pub title: String,
    pub url: String,
}

/// Everything the surrounding settings collaborator supplies.
#[derive(Clone, Debug, Default)]
pub struct RecorderSettings {
    pub capture: CapturePolicyView,
    pub recorder: RecorderPolicyView,
    /// Custom rules, applied after the built-in defaults.
    pub rules: Vec<RedactionRule>,
}

struct ActiveSession {
    session: Session,
    next_seq: u64,
    buffer: VecDeque<EventRecord>,
    batcher: ChangeBatcher,
    interactions: InteractionCapturer,
}

/// The orchestrator. Sole owner of the per-session sequence counter and the
/// outbound buffer: capture components hand it drafts, it sequences them,
/// runs the redaction pass, buffers, and flushes to the persistence boundary.
pub struct Recorder {
    log: Arc<dyn TranscriptLog>,
    clock: Arc<dyn MonoClock>,
    engine: RedactionEngine,
    settings: RecorderSettings,
    active: Mutex<Option<ActiveSession>>,
}

impl Recorder {
    pub fn new(
        log: Arc<dyn TranscriptLog>,
        clock: Arc<dyn MonoClock>,
        settings: RecorderSettings,
    ) -> Self {
        Self {
            engine: RedactionEngine::new(settings.rules.clone()),
            log,
            clock,
            settings,
            active: Mutex::new(None),
        }
    }

    pub async fn start(&self, meta: SessionMeta) -> RecorderResult<Session> {
        let mut guard = self.active.lock().await;
        if guard.is_some() {
            return Err(RecorderError::AlreadyRecording);
        }

        let config = json!({
            "capture": self.settings.capture,
            "recorder": self.settings.recorder,
            "redaction_rules": self.engine.active_rule_count(),
        });
        let session = Session::new(
            meta.title,
            meta.url,
            Utc::now(),
            self.clock.now_ms(),
            config,
        );
        self.log.create_session(&session).await?;

        let mut batcher = ChangeBatcher::new(self.settings.capture.clone());
        batcher.start();
        let mut interactions = InteractionCapturer::new(self.settings.capture.clone());
        interactions.start();

        info!(target: "recorder", session = %session.id.0, "recording started");
        *guard = Some(ActiveSession {
            session: session.clone(),
            next_seq: 0,
            buffer: VecDeque::new(),
            batcher,
            interactions,
        });
        Ok(session)
    }

    /// Accepts a delivery of structural-change notifications. Before-state
    /// capture happens inside this call, in the same synchronous turn.
    pub async fn observe_changes(
        &self,
        tree: &DomTree,
        notifications: Vec<ChangeNotification>,
    ) -> RecorderResult<()> {
        let mut guard = self.active.lock().await;
        let active = guard.as_mut().ok_or(RecorderError::NotRecording)?;
        let now = self.clock.now_ms();
        active.batcher.on_notifications(tree, notifications, now);
        Ok(())
    }

    pub async fn observe_interaction(
        &self,
        tree: &DomTree,
        notification: InteractionNotification,
    ) -> RecorderResult<()> {
        let mut guard = self.active.lock().await;
        let active = guard.as_mut().ok_or(RecorderError::NotRecording)?;
        let now = self.clock.now_ms();
        let drafts = active.interactions.on_interaction(tree, notification, now);
        self.accept(active, drafts);

        if active.buffer.len() >= self.settings.recorder.buffer_max {
            self.flush_active(active).await;
        }
        if active.next_seq >= self.settings.recorder.max_events {
            info!(target: "recorder", "event ceiling reached, ending session");
            self.finish(&mut guard).await?;
        }
        Ok(())
    }

    /// Periodic driver entry point: fires due capture timers, enforces the
    /// duration/event ceilings, flushes the buffer.
    pub async fn tick(&self) -> RecorderResult<()> {
        let mut guard = self.active.lock().await;
        let Some(active) = guard.as_mut() else {
            return Ok(());
        };
        let now = self.clock.now_ms();

        let mut drafts = active.batcher.on_timer(now);
        drafts.extend(active.interactions.on_timer(now));
        self.accept(active, drafts);

        let elapsed = now.saturating_sub(active.session.started_mono_ms);
        if elapsed >= self.settings.recorder.max_duration_ms
            || active.next_seq >= self.settings.recorder.max_events
        {
            info!(target: "recorder", "session limit reached, ending session");
            self.finish(&mut guard).await?;
            return Ok(());
        }

        self.flush_active(active).await;
        Ok(())
    }

    /// Stops recording: no further notifications are accepted, pending
    /// capture state is drained synchronously, and one final flush runs
    /// before the updated session is returned.
    pub async fn stop(&self) -> RecorderResult<Session> {
        let mut guard = self.active.lock().await;
        self.finish(&mut guard).await
    }

    pub async fn is_recording(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// How long the runtime driver may sleep before the next `tick`.
    pub async fn idle_wait_ms(&self) -> u64 {
        let interval = self.settings.recorder.flush_interval_ms;
        let guard = self.active.lock().await;
        let Some(active) = guard.as_ref() else {
            return interval;
        };
        let now = self.clock.now_ms();
        let deadline = [
            active.batcher.next_deadline(),
            active.interactions.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min();
        match deadline {
            Some(due) => due.saturating_sub(now).min(interval).max(1),
            None => interval,
        }
    }

    /// Sequence, redact, buffer — in that order. An event becomes observable
    /// (buffered) only after the redaction pass.
    fn accept(&self, active: &mut ActiveSession, drafts: Vec<EventDraft>) {
        for draft in drafts {
            let seq = active.next_seq;
            active.next_seq += 1;
            let record = EventRecord::from_draft(draft, active.session.id.clone(), seq);
            active.buffer.push_back(self.engine.process(&record));
        }
    }

    async fn flush_active(&self, active: &mut ActiveSession) {
        if active.buffer.is_empty() {
            return;
        }
        let batch: Vec<EventRecord> = active.buffer.drain(..).collect();
        if let Err(err) = self.log.append(&batch).await {
            warn!(target: "recorder", %err, count = batch.len(), "append failed, re-buffering for retry");
            for event in batch.into_iter().rev() {
                active.buffer.push_front(event);
            }
        }
    }

    async fn finish(&self, guard: &mut Option<ActiveSession>) -> RecorderResult<Session> {
        let mut active = guard.take().ok_or(RecorderError::NotRecording)?;

        let mut drafts = active.batcher.stop();
        drafts.extend(active.interactions.stop());
        self.accept(&mut active, drafts);

        self.flush_active(&mut active).await;
        if !active.buffer.is_empty() {
            // One retry for a transient failure during shutdown.
            self.flush_active(&mut active).await;
        }
        if !active.buffer.is_empty() {
            warn!(
                target: "recorder",
                remaining = active.buffer.len(),
                "events could not be persisted before stop"
            );
        }

        active.session.ended_at = Some(Utc::now());
        active.session.event_count = active.next_seq;
        self.log.update_session(&active.session).await?;
        info!(
            target: "recorder",
            session = %active.session.id.0,
            events = active.next_seq,
            "recording stopped"
        );
        Ok(active.session)
    }
}
