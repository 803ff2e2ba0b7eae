use pagetrace_core_types::{EventPayload, EventRecord, Session};

use crate::policy::ExportPolicyView;
use crate::render::{self, value_is_redacted};

/// Fixed explanatory block emitted near the top of every transcript. Carries
/// the ordering caveat so downstream consumers know sequence order is
/// processing order, not observation order.
const CONTEXT_BLOCK: &str = "\
This document is a deterministic, privacy-redacted transcript of a recorded \
browser session, generated for consumption by humans and language models. \
Values shown in square brackets (for example `[EMAIL]`) were redacted before \
storage and are unrecoverable. Events are ordered by their assigned sequence \
number, which reflects processing order at the recorder: a debounced input \
may appear after a DOM change that was observed later.";

#[derive(Default)]
struct SummaryCounts {
    actions: usize,
    mutations: usize,
    errors: usize,
    navigations: usize,
    redactions: usize,
}

/// Projects an ordered event log into the final text document. Pure: same
/// session + events in, same text out.
pub struct TranscriptExporter {
    policy: ExportPolicyView,
}

impl TranscriptExporter {
    pub fn new(policy: ExportPolicyView) -> Self {
        Self { policy }
    }

    pub fn export(&self, session: &Session, events: &[EventRecord]) -> String {
        let mut doc = String::new();
        self.push_header(&mut doc, session, events);
        doc.push_str("## Context\n\n");
        doc.push_str(CONTEXT_BLOCK);
        doc.push_str("\n\n");
        self.push_initial_source(&mut doc, events);
        self.push_timeline(&mut doc, session, events);
        self.push_summary(&mut doc, events);
        if self.policy.include_repro_steps {
            self.push_repro_steps(&mut doc, events);
        }
        doc.trim_end().to_string() + "\n"
    }

    fn push_header(&self, doc: &mut String, session: &Session, events: &[EventRecord]) {
        doc.push_str(&format!("# Session Recording: {}\n\n", session.title));
        doc.push_str(&format!("- **URL:** {}\n", session.url));
        doc.push_str(&format!(
            "- **Started:** {}\n",
            session.started_at.to_rfc3339()
        ));
        match session.ended_at {
            Some(ended) => {
                doc.push_str(&format!("- **Ended:** {}\n", ended.to_rfc3339()));
                let secs = (ended - session.started_at).num_seconds().max(0) as u64;
                doc.push_str(&format!("- **Duration:** {}\n", fmt_duration(secs)));
            }
            None => {
                doc.push_str("- **Ended:** (in progress)\n");
                let last = events
                    .last()
                    .map(|e| e.ts_mono.saturating_sub(session.started_mono_ms))
                    .unwrap_or(0);
                doc.push_str(&format!("- **Duration:** {}\n", fmt_duration(last / 1_000)));
            }
        }
        doc.push_str(&format!("- **Events:** {}\n\n", events.len()));
    }

    fn push_initial_source(&self, doc: &mut String, events: &[EventRecord]) {
        let source = events.iter().find_map(|event| match &event.payload {
            EventPayload::Navigation {
                page_source: Some(source),
                ..
            } => Some(source.as_str()),
            _ => None,
        });
        let Some(source) = source else {
            return;
        };
        doc.push_str("## Initial Page Source\n\n```html\n");
        let count = source.chars().count();
        if count > self.policy.fragment_char_budget {
            let clipped: String = source
                .chars()
                .take(self.policy.fragment_char_budget)
                .collect();
            doc.push_str(&clipped);
            doc.push_str("… [truncated]");
        } else {
            doc.push_str(source);
        }
        doc.push_str("\n```\n\n");
    }

    fn push_timeline(&self, doc: &mut String, session: &Session, events: &[EventRecord]) {
        doc.push_str("## Timeline\n\n");
        doc.push_str("### 00:00.000 [NAVIGATION] Page load\n\n");
        doc.push_str(&format!("Recording started on `{}`\n\n", session.url));
        for event in events {
            doc.push_str(&render::render_event(
                event,
                session.started_mono_ms,
                &self.policy,
            ));
            doc.push_str("\n\n");
        }
    }

    fn push_summary(&self, doc: &mut String, events: &[EventRecord]) {
        let mut counts = SummaryCounts::default();
        for event in events {
            let tag = event.kind_tag();
            if tag.starts_with("user:") {
                counts.actions += 1;
            } else if tag.starts_with("mutation:") {
                counts.mutations += 1;
            } else if tag.starts_with("error:") {
                counts.errors += 1;
            }
            match &event.payload {
                EventPayload::Navigation { .. } => counts.navigations += 1,
                EventPayload::Input { value, .. } if value_is_redacted(value) => {
                    counts.redactions += 1;
                }
                _ => {}
            }
        }

        doc.push_str("## Summary\n\n");
        doc.push_str("| Metric | Count |\n");
        doc.push_str("| --- | --- |\n");
        doc.push_str(&format!("| Total Actions | {} |\n", counts.actions));
        doc.push_str(&format!("| Total Mutations | {} |\n", counts.mutations));
        doc.push_str(&format!("| Errors | {} |\n", counts.errors));
        doc.push_str(&format!("| Navigations | {} |\n", counts.navigations));
        doc.push_str(&format!(
            "| Redactions Applied | {} |\n\n",
            counts.redactions
        ));
    }

    /// Numbered projection of the actionable events. Inputs never echo an
    /// unredacted value.
    fn push_repro_steps(&self, doc: &mut String, events: &[EventRecord]) {
        let mut steps = Vec::new();
        for event in events {
            let label = event
                .target
                .label
                .clone()
                .unwrap_or_else(|| event.target.tag.clone());
            let selector = if event.target.selector.is_empty() {
                event.target.tag.clone()
            } else {
                event.target.selector.clone()
            };
            match &event.payload {
                EventPayload::Click { .. } => {
                    steps.push(format!("Click **\"{label}\"** (`{selector}`)"));
                }
                EventPayload::Navigation { url, .. } => {
                    steps.push(format!("Navigate to `{url}`"));
                }
                EventPayload::Input { value, .. } => {
                    if value_is_redacted(value) {
                        steps.push(format!("Fill **\"{label}\"** (`{selector}`) with `{value}`"));
                    } else {
                        steps.push(format!("Fill **\"{label}\"** (`{selector}`) with a value"));
                    }
                }
                EventPayload::MutationAdd { node_count, .. } => {
                    steps.push(format!(
                        "Observe `{selector}`: {node_count} element{} added",
                        if *node_count == 1 { "" } else { "s" }
                    ));
                }
                EventPayload::MutationRemove { node_count, .. } => {
                    steps.push(format!(
                        "Observe `{selector}`: {node_count} element{} removed",
                        if *node_count == 1 { "" } else { "s" }
                    ));
                }
                // Scroll, focus and blur are noise in a repro script.
                _ => {}
            }
        }
        if steps.is_empty() {
            return;
        }
        doc.push_str("## Reproduction Steps\n\n");
        for (index, step) in steps.iter().enumerate() {
            doc.push_str(&format!("{}. {step}\n", index + 1));
        }
        doc.push('\n');
    }
}

impl Default for TranscriptExporter {
    fn default() -> Self {
        Self::new(ExportPolicyView::default())
    }
}

fn fmt_duration(total_secs: u64) -> String {
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    if minutes == 0 {
        format!("{seconds}s")
    } else {
        format!("{minutes}m {seconds}s")
    }
}
