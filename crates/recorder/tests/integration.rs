use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use capture::{CapturePolicyView, ChangeNotification, InteractionDetail, InteractionNotification};
use dom_snapshot::{DomTree, NodeId};
use pagetrace_core_types::{EventPayload, EventRecord, Modifiers, Session, SessionId};
use recorder::{ManualClock, Recorder, RecorderPolicyView, RecorderSettings, SessionMeta};
use transcript_log::{LogError, LogResult, MemoryTranscriptLog, TranscriptLog};

fn page() -> (DomTree, NodeId, NodeId) {
    let mut tree = DomTree::with_root("html");
    let root = tree.root();
    let body = tree.append_element(root, "body").unwrap();
    let form = tree.append_element(body, "form").unwrap();
    tree.set_attr(form, "id", "contact-form").unwrap();
    let input = tree.append_element(form, "input").unwrap();
    tree.set_attr(input, "id", "email-field").unwrap();
    let button = tree.append_element(form, "button").unwrap();
    tree.set_attr(button, "id", "submit-btn").unwrap();
    tree.set_attr(button, "aria-label", "Submit").unwrap();
    (tree, input, button)
}

fn click(target: NodeId) -> InteractionNotification {
    InteractionNotification {
        target,
        detail: InteractionDetail::Click {
            button: 0,
            x: 5.0,
            y: 6.0,
            modifiers: Modifiers::default(),
        },
    }
}

fn typed(target: NodeId, value: &str) -> InteractionNotification {
    InteractionNotification {
        target,
        detail: InteractionDetail::Input {
            input_type: "text".into(),
            value: value.into(),
            selection: None,
        },
    }
}

fn recorder_with(
    policy: RecorderPolicyView,
) -> (Arc<Recorder>, Arc<MemoryTranscriptLog>, Arc<ManualClock>) {
    let log = Arc::new(MemoryTranscriptLog::new());
    let clock = Arc::new(ManualClock::new(0));
    let recorder = Arc::new(Recorder::new(
        log.clone(),
        clock.clone(),
        RecorderSettings {
            capture: CapturePolicyView::default(),
            recorder: policy,
            rules: Vec::new(),
        },
    ));
    (recorder, log, clock)
}

async fn start(recorder: &Recorder) -> Session {
    recorder
        .start(SessionMeta {
            title: "Checkout".into(),
            url: "https://shop.example/checkout".into(),
        })
        .await
        .expect("session starts")
}

#[tokio::test]
async fn sequences_are_gap_free_and_reflect_arrival_order() {
    let (recorder, log, clock) = recorder_with(RecorderPolicyView::default());
    let (mut tree, input, button) = page();
    let session = start(&recorder).await;

    // Immediate click at t=0.
    recorder.observe_interaction(&tree, click(button)).await.unwrap();
    // Debounced input at t=10; it will sequence after the mutation batch
    // even though the keystroke happened first.
    clock.set(10);
    recorder
        .observe_interaction(&tree, typed(input, "hello"))
        .await
        .unwrap();
    clock.set(20);
    let item = tree.append_element(tree.root(), "div").unwrap();
    recorder
        .observe_changes(
            &tree,
            vec![ChangeNotification::ChildList {
                target: tree.root(),
                added: vec![item],
                removed: vec![],
            }],
        )
        .await
        .unwrap();

    clock.set(80); // batch window (50ms) elapsed, debounce (300ms) still open
    recorder.tick().await.unwrap();
    clock.set(320);
    recorder.tick().await.unwrap();
    let session = {
        recorder.stop().await.unwrap();
        log.session(&session.id).unwrap()
    };

    let events = log.query_ordered(&session.id).await.unwrap();
    let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![0, 1, 2], "strictly increasing, gap-free, from 0");
    assert_eq!(events[0].kind_tag(), "user:click");
    assert_eq!(events[1].kind_tag(), "mutation:add");
    assert_eq!(events[2].kind_tag(), "user:input");
    assert_eq!(session.event_count, 3);
}

#[tokio::test]
async fn stop_flushes_pending_batch_and_debounce_state() {
    let (recorder, log, _clock) = recorder_with(RecorderPolicyView::default());
    let (mut tree, input, _) = page();
    let session = start(&recorder).await;

    recorder
        .observe_interaction(&tree, typed(input, "in flight"))
        .await
        .unwrap();
    let item = tree.append_element(tree.root(), "p").unwrap();
    recorder
        .observe_changes(
            &tree,
            vec![ChangeNotification::ChildList {
                target: tree.root(),
                added: vec![item],
                removed: vec![],
            }],
        )
        .await
        .unwrap();

    // No timer has fired; stop must drain both pending slots.
    let stopped = recorder.stop().await.unwrap();
    assert_eq!(stopped.event_count, 2);
    assert_eq!(log.count_events(&session.id).await.unwrap(), 2);
    assert!(stopped.ended_at.is_some());
}

#[tokio::test]
async fn full_buffer_forces_an_immediate_flush() {
    let (recorder, log, _clock) = recorder_with(RecorderPolicyView {
        buffer_max: 2,
        ..RecorderPolicyView::default()
    });
    let (tree, _, button) = page();
    let session = start(&recorder).await;

    recorder.observe_interaction(&tree, click(button)).await.unwrap();
    assert_eq!(log.count_events(&session.id).await.unwrap(), 0);
    recorder.observe_interaction(&tree, click(button)).await.unwrap();
    // No tick ran; the cap alone pushed the buffer out.
    assert_eq!(log.count_events(&session.id).await.unwrap(), 2);
}

#[tokio::test]
async fn event_ceiling_ends_the_session_gracefully() {
    let (recorder, log, _clock) = recorder_with(RecorderPolicyView {
        max_events: 2,
        ..RecorderPolicyView::default()
    });
    let (tree, _, button) = page();
    let session = start(&recorder).await;

    recorder.observe_interaction(&tree, click(button)).await.unwrap();
    recorder.observe_interaction(&tree, click(button)).await.unwrap();

    assert!(!recorder.is_recording().await);
    let stored = log.session(&session.id).unwrap();
    assert_eq!(stored.event_count, 2);
    assert!(stored.ended_at.is_some());
    assert!(recorder
        .observe_interaction(&tree, click(button))
        .await
        .is_err());
}

#[tokio::test]
async fn duration_ceiling_is_checked_on_tick() {
    let (recorder, log, clock) = recorder_with(RecorderPolicyView {
        max_duration_ms: 1_000,
        ..RecorderPolicyView::default()
    });
    let (tree, _, button) = page();
    let session = start(&recorder).await;
    recorder.observe_interaction(&tree, click(button)).await.unwrap();

    clock.set(2_000);
    recorder.tick().await.unwrap();

    assert!(!recorder.is_recording().await);
    let stored = log.session(&session.id).unwrap();
    assert!(stored.ended_at.is_some());
    assert_eq!(log.count_events(&session.id).await.unwrap(), 1);
}

#[tokio::test]
async fn redaction_runs_before_events_reach_the_log() {
    let (recorder, log, clock) = recorder_with(RecorderPolicyView::default());
    let (tree, input, _) = page();
    let session = start(&recorder).await;

    recorder
        .observe_interaction(&tree, typed(input, "user@example.com"))
        .await
        .unwrap();
    clock.set(500);
    recorder.tick().await.unwrap();
    recorder.stop().await.unwrap();

    let events = log.query_ordered(&session.id).await.unwrap();
    match &events[0].payload {
        EventPayload::Input { value, .. } => assert_eq!(value, "[EMAIL]"),
        other => panic!("unexpected payload: {other:?}"),
    }
}

/// Fails the first N appends, then delegates to an in-memory log.
struct FlakyLog {
    inner: MemoryTranscriptLog,
    failures_left: AtomicUsize,
}

impl FlakyLog {
    fn new(failures: usize) -> Self {
        Self {
            inner: MemoryTranscriptLog::new(),
            failures_left: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl TranscriptLog for FlakyLog {
    async fn create_session(&self, session: &Session) -> LogResult<()> {
        self.inner.create_session(session).await
    }
    async fn update_session(&self, session: &Session) -> LogResult<()> {
        self.inner.update_session(session).await
    }
    async fn append(&self, events: &[EventRecord]) -> LogResult<usize> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(LogError::AppendRejected("transport down".into()));
        }
        self.inner.append(events).await
    }
    async fn query_ordered(&self, session: &SessionId) -> LogResult<Vec<EventRecord>> {
        self.inner.query_ordered(session).await
    }
    async fn count_events(&self, session: &SessionId) -> LogResult<u64> {
        self.inner.count_events(session).await
    }
}

#[tokio::test]
async fn failed_appends_are_rebuffered_and_retried() {
    let log = Arc::new(FlakyLog::new(1));
    let clock = Arc::new(ManualClock::new(0));
    let recorder = Recorder::new(log.clone(), clock.clone(), RecorderSettings::default());
    let (tree, _, button) = page();
    let session = start(&recorder).await;

    recorder.observe_interaction(&tree, click(button)).await.unwrap();

    clock.set(1_000);
    recorder.tick().await.unwrap(); // append fails, event re-buffered
    assert_eq!(log.count_events(&session.id).await.unwrap(), 0);

    clock.set(2_000);
    recorder.tick().await.unwrap(); // retry succeeds
    assert_eq!(log.count_events(&session.id).await.unwrap(), 1);

    let stopped = recorder.stop().await.unwrap();
    assert_eq!(stopped.event_count, 1);
    // The retry delivered exactly once; nothing was duplicated.
    assert_eq!(log.count_events(&session.id).await.unwrap(), 1);
}
