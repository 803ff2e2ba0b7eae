use std::collections::HashMap;

use describer::describe;
use dom_snapshot::{fragment, DomTree, NodeId};
use pagetrace_core_types::{EventDraft, EventPayload, MouseButton, SelectionRange};
use tracing::trace;

use crate::notify::{InteractionDetail, InteractionNotification};
use crate::policy::CapturePolicyView;

struct PendingEmission {
    due_ms: u64,
    draft: EventDraft,
}

/// Applies the per-kind timing policy to interaction notifications:
/// click/focus/blur immediately, input debounced per target element
/// (last-write-wins), scroll throttled to the trailing window edge.
pub struct InteractionCapturer {
    policy: CapturePolicyView,
    observing: bool,
    pending_inputs: HashMap<NodeId, PendingEmission>,
    pending_scroll: Option<PendingEmission>,
}

impl InteractionCapturer {
    pub fn new(policy: CapturePolicyView) -> Self {
        Self {
            policy,
            observing: false,
            pending_inputs: HashMap::new(),
            pending_scroll: None,
        }
    }

    pub fn start(&mut self) {
        self.observing = true;
    }

    /// Processes one notification; immediate kinds come back as drafts,
    /// debounced/throttled kinds park in pending slots.
    pub fn on_interaction(
        &mut self,
        tree: &DomTree,
        notification: InteractionNotification,
        now_ms: u64,
    ) -> Vec<EventDraft> {
        if !self.observing {
            return Vec::new();
        }
        let target = notification.target;
        let descriptor = describe(tree, target);

        match notification.detail {
            InteractionDetail::Click {
                button,
                x,
                y,
                modifiers,
            } => {
                let draft = EventDraft::new(
                    now_ms,
                    descriptor,
                    EventPayload::Click {
                        button: MouseButton::from_code(button),
                        x,
                        y,
                        modifiers,
                    },
                )
                .with_snapshot(fragment(tree, target));
                vec![draft]
            }
            InteractionDetail::Focus => {
                vec![EventDraft::new(now_ms, descriptor, EventPayload::Focus)]
            }
            InteractionDetail::Blur => {
                vec![EventDraft::new(now_ms, descriptor, EventPayload::Blur)]
            }
            InteractionDetail::Navigation {
                url,
                kind,
                page_source,
            } => {
                vec![EventDraft::new(
                    now_ms,
                    descriptor,
                    EventPayload::Navigation {
                        url,
                        nav_kind: kind,
                        page_source,
                    },
                )]
            }
            InteractionDetail::Input {
                input_type,
                value,
                selection,
            } => {
                let draft = EventDraft::new(
                    now_ms,
                    descriptor,
                    EventPayload::Input {
                        input_type,
                        value,
                        selection: selection.map(|(start, end)| SelectionRange { start, end }),
                    },
                );
                // Last write wins; each keystroke resets the quiet period.
                self.pending_inputs.insert(
                    target,
                    PendingEmission {
                        due_ms: now_ms + self.policy.input_debounce_ms,
                        draft,
                    },
                );
                Vec::new()
            }
            InteractionDetail::Scroll { x, y } => {
                if !self.policy.capture_scroll {
                    trace!(target: "capture-interactions", "scroll capture disabled");
                    return Vec::new();
                }
                let draft =
                    EventDraft::new(now_ms, descriptor, EventPayload::Scroll { x, y });
                match &mut self.pending_scroll {
                    // Window already open: keep its boundary, carry the
                    // latest position.
                    Some(pending) => pending.draft = draft,
                    None => {
                        self.pending_scroll = Some(PendingEmission {
                            due_ms: now_ms + self.policy.scroll_throttle_ms,
                            draft,
                        });
                    }
                }
                Vec::new()
            }
        }
    }

    pub fn next_deadline(&self) -> Option<u64> {
        let input_due = self.pending_inputs.values().map(|p| p.due_ms).min();
        let scroll_due = self.pending_scroll.as_ref().map(|p| p.due_ms);
        match (input_due, scroll_due) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Emits every pending slot whose window has elapsed.
    pub fn on_timer(&mut self, now_ms: u64) -> Vec<EventDraft> {
        let mut due: Vec<PendingEmission> = Vec::new();

        let expired: Vec<NodeId> = self
            .pending_inputs
            .iter()
            .filter(|(_, pending)| pending.due_ms <= now_ms)
            .map(|(&node, _)| node)
            .collect();
        for node in expired {
            if let Some(pending) = self.pending_inputs.remove(&node) {
                due.push(pending);
            }
        }
        if self
            .pending_scroll
            .as_ref()
            .map_or(false, |pending| pending.due_ms <= now_ms)
        {
            if let Some(pending) = self.pending_scroll.take() {
                due.push(pending);
            }
        }

        drain_ordered(due)
    }

    /// Flushes all pending state regardless of deadlines and stops observing.
    pub fn stop(&mut self) -> Vec<EventDraft> {
        self.observing = false;
        let mut due: Vec<PendingEmission> = self.pending_inputs.drain().map(|(_, p)| p).collect();
        if let Some(pending) = self.pending_scroll.take() {
            due.push(pending);
        }
        drain_ordered(due)
    }
}

fn drain_ordered(mut due: Vec<PendingEmission>) -> Vec<EventDraft> {
    due.sort_by_key(|pending| (pending.due_ms, pending.draft.ts_mono));
    due.into_iter().map(|pending| pending.draft).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input_note(target: NodeId, value: &str) -> InteractionNotification {
        InteractionNotification {
            target,
            detail: InteractionDetail::Input {
                input_type: "text".into(),
                value: value.into(),
                selection: None,
            },
        }
    }

    fn field() -> (DomTree, NodeId) {
        let mut tree = DomTree::with_root("body");
        let root = tree.root();
        let input = tree.append_element(root, "input").unwrap();
        tree.set_attr(input, "id", "name").unwrap();
        (tree, input)
    }

    fn capturer(policy: CapturePolicyView) -> InteractionCapturer {
        let mut capturer = InteractionCapturer::new(policy);
        capturer.start();
        capturer
    }

    #[test]
    fn clicks_emit_immediately_with_snapshot() {
        let (tree, input) = field();
        let mut cap = capturer(CapturePolicyView::default());
        let drafts = cap.on_interaction(
            &tree,
            InteractionNotification {
                target: input,
                detail: InteractionDetail::Click {
                    button: 0,
                    x: 10.0,
                    y: 20.0,
                    modifiers: Default::default(),
                },
            },
            5,
        );
        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].dom_snapshot.is_some());
        assert_eq!(drafts[0].payload.kind_tag(), "user:click");
    }

    #[test]
    fn input_debounce_keeps_only_the_latest_value() {
        let (tree, input) = field();
        let mut cap = capturer(CapturePolicyView {
            input_debounce_ms: 100,
            ..CapturePolicyView::default()
        });
        assert!(cap.on_interaction(&tree, input_note(input, "a"), 0).is_empty());
        assert!(cap.on_interaction(&tree, input_note(input, "ab"), 40).is_empty());
        assert!(cap.on_interaction(&tree, input_note(input, "abc"), 80).is_empty());

        // The window restarted at 80; nothing is due at 120.
        assert!(cap.on_timer(120).is_empty());
        let drafts = cap.on_timer(180);
        assert_eq!(drafts.len(), 1);
        match &drafts[0].payload {
            EventPayload::Input { value, .. } => assert_eq!(value, "abc"),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn scroll_throttle_fires_on_the_trailing_edge() {
        let (tree, input) = field();
        let mut cap = capturer(CapturePolicyView {
            capture_scroll: true,
            scroll_throttle_ms: 100,
            ..CapturePolicyView::default()
        });
        let scroll = |y: f64| InteractionNotification {
            target: input,
            detail: InteractionDetail::Scroll { x: 0.0, y },
        };
        assert!(cap.on_interaction(&tree, scroll(10.0), 0).is_empty());
        assert!(cap.on_interaction(&tree, scroll(50.0), 30).is_empty());
        assert!(cap.on_interaction(&tree, scroll(90.0), 60).is_empty());
        assert_eq!(cap.next_deadline(), Some(100));

        let drafts = cap.on_timer(100);
        assert_eq!(drafts.len(), 1);
        match &drafts[0].payload {
            EventPayload::Scroll { y, .. } => assert_eq!(*y, 90.0),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn scroll_capture_is_opt_in() {
        let (tree, input) = field();
        let mut cap = capturer(CapturePolicyView::default());
        cap.on_interaction(
            &tree,
            InteractionNotification {
                target: input,
                detail: InteractionDetail::Scroll { x: 0.0, y: 5.0 },
            },
            0,
        );
        assert_eq!(cap.next_deadline(), None);
    }

    #[test]
    fn stop_flushes_pending_debounce_state() {
        let (tree, input) = field();
        let mut cap = capturer(CapturePolicyView::default());
        cap.on_interaction(&tree, input_note(input, "draft"), 10);
        let drafts = cap.stop();
        assert_eq!(drafts.len(), 1);
        match &drafts[0].payload {
            EventPayload::Input { value, .. } => assert_eq!(value, "draft"),
            other => panic!("unexpected payload: {other:?}"),
        }
        // Stopped capturers ignore further interactions.
        assert!(cap
            .on_interaction(&tree, input_note(input, "late"), 20)
            .is_empty());
    }
}
