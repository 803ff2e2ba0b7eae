use describer::describe;
use dom_snapshot::{fragment, is_ignored_tag, outer_html, DomTree, NodeId};
use pagetrace_core_types::{DomFragment, EventDraft, EventPayload};
use tracing::debug;

use crate::notify::ChangeNotification;
use crate::policy::CapturePolicyView;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObserveState {
    Stopped,
    Observing,
}

/// Coalesces bursts of structural-change notifications into micro-batches.
///
/// Pre-change state is reconstructed synchronously at delivery time: the live
/// tree will have moved on by the time the flush timer fires, so everything an
/// entry needs is materialized before `on_notifications` returns.
pub struct ChangeBatcher {
    policy: CapturePolicyView,
    state: ObserveState,
    batch: Vec<EventDraft>,
    flush_due: Option<u64>,
}

impl ChangeBatcher {
    pub fn new(policy: CapturePolicyView) -> Self {
        Self {
            policy,
            state: ObserveState::Stopped,
            batch: Vec::new(),
            flush_due: None,
        }
    }

    pub fn start(&mut self) {
        self.state = ObserveState::Observing;
    }

    pub fn state(&self) -> ObserveState {
        self.state
    }

    /// Accepts a delivery of raw notifications. Must be called in the same
    /// synchronous turn as observation; entries are fully materialized here.
    pub fn on_notifications(
        &mut self,
        tree: &DomTree,
        notifications: Vec<ChangeNotification>,
        now_ms: u64,
    ) {
        if self.state != ObserveState::Observing {
            return;
        }
        for notification in notifications {
            if let Some(draft) = self.materialize(tree, notification, now_ms) {
                self.batch.push(draft);
            }
        }
        if !self.batch.is_empty() && self.flush_due.is_none() {
            self.flush_due = Some(now_ms + self.policy.batch_window_ms);
        }
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.flush_due
    }

    /// Drains the batch if the coalescing window has elapsed.
    pub fn on_timer(&mut self, now_ms: u64) -> Vec<EventDraft> {
        match self.flush_due {
            Some(due) if due <= now_ms => {
                self.flush_due = None;
                std::mem::take(&mut self.batch)
            }
            _ => Vec::new(),
        }
    }

    /// Cancels the pending flush and synchronously drains whatever is queued.
    /// Nothing delivered before `stop` is lost.
    pub fn stop(&mut self) -> Vec<EventDraft> {
        self.state = ObserveState::Stopped;
        self.flush_due = None;
        std::mem::take(&mut self.batch)
    }

    fn materialize(
        &self,
        tree: &DomTree,
        notification: ChangeNotification,
        now_ms: u64,
    ) -> Option<EventDraft> {
        match notification {
            ChangeNotification::ChildList {
                target,
                added,
                removed,
            } => self.materialize_child_list(tree, target, added, removed, now_ms),
            ChangeNotification::Attribute {
                target,
                name,
                old_value,
            } => {
                if self.ignored(tree, target) {
                    return None;
                }
                let new_value = tree.attr(target, &name).map(str::to_string);
                Some(EventDraft::new(
                    now_ms,
                    describe(tree, target),
                    EventPayload::MutationAttribute {
                        name,
                        old_value,
                        new_value,
                    },
                ))
            }
            ChangeNotification::CharacterData { target, old_value } => {
                if self.ignored(tree, target) {
                    return None;
                }
                let new_value = tree.text_of(target).unwrap_or_default().to_string();
                Some(EventDraft::new(
                    now_ms,
                    describe(tree, target),
                    EventPayload::MutationText {
                        old_value: old_value.unwrap_or_default(),
                        new_value,
                    },
                ))
            }
        }
    }

    fn materialize_child_list(
        &self,
        tree: &DomTree,
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<DomTree>,
        now_ms: u64,
    ) -> Option<EventDraft> {
        if added.is_empty() && removed.is_empty() {
            return None;
        }
        if self.ignored(tree, target) {
            debug!(target: "capture-batcher", "child-list change on ignored tag dropped");
            return None;
        }

        let (parent_before, parent_after) = if self.policy.include_parent_context {
            self.reconstruct_parent(tree, target, &added, &removed)
        } else {
            (None, None)
        };

        let cap = self.policy.max_fragment_nodes;
        let draft = if !added.is_empty() {
            let nodes: Vec<DomFragment> = added
                .iter()
                .filter(|&&node| tree.contains(node))
                .take(cap)
                .map(|&node| fragment(tree, node))
                .collect();
            EventDraft::new(
                now_ms,
                describe(tree, target),
                EventPayload::MutationAdd {
                    node_count: added.len(),
                    nodes,
                    parent_before,
                    parent_after,
                },
            )
        } else {
            let nodes: Vec<DomFragment> = removed
                .iter()
                .take(cap)
                .map(|sub| fragment(sub, sub.root()))
                .collect();
            EventDraft::new(
                now_ms,
                describe(tree, target),
                EventPayload::MutationRemove {
                    node_count: removed.len(),
                    nodes,
                    parent_before,
                    parent_after,
                },
            )
        };
        Some(draft)
    }

    /// Rebuilds the parent as it was before the change: clone the current
    /// subtree, drop the nodes the notification added, re-append the detached
    /// subtrees it removed.
    fn reconstruct_parent(
        &self,
        tree: &DomTree,
        target: NodeId,
        added: &[NodeId],
        removed: &[DomTree],
    ) -> (Option<String>, Option<String>) {
        let after = outer_html(tree, target);
        let Ok(mut before) = tree.clone_subtree(target) else {
            return (None, Some(after));
        };

        // The clone's root children mirror the live children positionally.
        let clone_children: Vec<NodeId> = before.children(before.root()).to_vec();
        let live_children = tree.children(target);
        for &node in added {
            let Some(position) = live_children.iter().position(|&child| child == node) else {
                continue;
            };
            if let Some(&clone_child) = clone_children.get(position) {
                let _ = before.detach(clone_child);
            }
        }
        let before_root = before.root();
        for sub in removed {
            let _ = before.adopt(before_root, sub);
        }

        (Some(outer_html(&before, before_root)), Some(after))
    }

    fn ignored(&self, tree: &DomTree, target: NodeId) -> bool {
        let mut current = Some(target);
        while let Some(node) = current {
            if let Some(tag) = tree.tag(node) {
                return is_ignored_tag(tag);
            }
            // Text nodes: judge by the nearest element ancestor.
            current = tree.parent(node);
        }
        true
    }
}
