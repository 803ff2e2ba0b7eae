use pagetrace_core_types::{DomFragment, EventPayload, EventRecord};

use crate::diff::{line_set_diff, prefixed};
use crate::policy::ExportPolicyView;

/// `MM:SS.mmm` relative to session start.
pub fn format_relative(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{minutes:02}:{seconds:02}.{millis:03}")
}

/// A value is considered redacted when a full-value replacement tag survived
/// the pipeline (`[EMAIL]`, `[PASSWORD]`, ...).
pub fn value_is_redacted(value: &str) -> bool {
    value.starts_with('[') && value.ends_with(']') && value.len() > 2
}

pub fn label_for(event: &EventRecord) -> &'static str {
    let tag = event.kind_tag();
    match tag {
        "user:click" => "CLICK",
        "user:input" => "INPUT",
        "user:focus" => "FOCUS",
        "user:blur" => "BLUR",
        "user:scroll" => "SCROLL",
        "user:navigation" => "NAVIGATION",
        _ if tag.starts_with("mutation:") => "MUTATION",
        _ if tag.starts_with("error:") => "ERROR",
        _ => "EVENT",
    }
}

pub fn title_for(event: &EventRecord) -> &'static str {
    match &event.payload {
        EventPayload::Click { .. } => "Click",
        EventPayload::Input { .. } => "Text input",
        EventPayload::Focus => "Focus",
        EventPayload::Blur => "Blur",
        EventPayload::Scroll { .. } => "Scroll",
        EventPayload::Navigation { .. } => "Navigation",
        EventPayload::MutationAdd { .. } => "DOM nodes added",
        EventPayload::MutationRemove { .. } => "DOM nodes removed",
        EventPayload::MutationAttribute { .. } => "Attribute changed",
        EventPayload::MutationText { .. } => "Text changed",
        EventPayload::PageError { .. } => "Page error",
        _ => "Event",
    }
}

fn display_label(event: &EventRecord) -> String {
    event
        .target
        .label
        .clone()
        .unwrap_or_else(|| event.target.tag.clone())
}

fn display_selector(event: &EventRecord) -> String {
    if event.target.selector.is_empty() {
        event.target.tag.clone()
    } else {
        event.target.selector.clone()
    }
}

/// Cuts a fragment to the configured budget; fragments under the minimum
/// length vanish entirely.
fn clip_fragment(fragment: &str, policy: &ExportPolicyView) -> Option<String> {
    let count = fragment.chars().count();
    if count < policy.fragment_min_len {
        return None;
    }
    if count <= policy.fragment_char_budget {
        return Some(fragment.to_string());
    }
    let clipped: String = fragment.chars().take(policy.fragment_char_budget).collect();
    Some(format!("{clipped}… [truncated]"))
}

fn diff_fence(body: &str) -> String {
    format!("```diff\n{body}\n```")
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "element"
    } else {
        "elements"
    }
}

/// One timeline block: header line, type-specific description, optional
/// fragment/diff block.
pub fn render_event(event: &EventRecord, start_mono_ms: u64, policy: &ExportPolicyView) -> String {
    let stamp = format_relative(event.ts_mono.saturating_sub(start_mono_ms));
    let mut block = format!(
        "### {stamp} [{}] {}\n\n",
        label_for(event),
        title_for(event)
    );
    block.push_str(&describe(event, policy));
    block
}

fn describe(event: &EventRecord, policy: &ExportPolicyView) -> String {
    let label = display_label(event);
    let selector = display_selector(event);
    match &event.payload {
        EventPayload::Click { modifiers, .. } => {
            let mut line = format!("User clicked **\"{label}\"** (`{selector}`)");
            if modifiers.any() {
                line.push_str(&format!(" while holding {}", modifiers.names().join("+")));
            }
            line
        }
        EventPayload::Input { value, .. } => {
            let mut out = format!("User typed in **\"{label}\"** (`{selector}`)\n");
            if value_is_redacted(value) {
                out.push_str(&format!("Value: `{value}` (redacted)"));
            } else {
                let preview: String = value.chars().take(policy.value_preview_len).collect();
                if value.chars().count() > policy.value_preview_len {
                    out.push_str(&format!("Value: `{preview}…`"));
                } else {
                    out.push_str(&format!("Value: `{preview}`"));
                }
            }
            out
        }
        EventPayload::Focus => format!("User focused on **\"{label}\"** (`{selector}`)"),
        EventPayload::Blur => format!("User left **\"{label}\"** (`{selector}`)"),
        EventPayload::Scroll { x, y } => format!("User scrolled to ({x}, {y})"),
        EventPayload::Navigation { url, nav_kind, .. } => {
            format!("Navigated to `{url}` ({})", nav_kind.as_str())
        }
        EventPayload::MutationAdd {
            node_count,
            nodes,
            parent_before,
            parent_after,
        } => {
            let mut out = format!(
                "{node_count} {} added to `{selector}`",
                plural(*node_count)
            );
            if let Some(diff) = mutation_diff(nodes, parent_before, parent_after, '+', policy) {
                out.push_str("\n\n");
                out.push_str(&diff);
            }
            out
        }
        EventPayload::MutationRemove {
            node_count,
            nodes,
            parent_before,
            parent_after,
        } => {
            let mut out = format!(
                "{node_count} {} removed from `{selector}`",
                plural(*node_count)
            );
            if let Some(diff) = mutation_diff(nodes, parent_before, parent_after, '-', policy) {
                out.push_str("\n\n");
                out.push_str(&diff);
            }
            out
        }
        EventPayload::MutationAttribute {
            name,
            old_value,
            new_value,
        } => {
            let before = old_value.as_deref().unwrap_or_default();
            let after = new_value.as_deref().unwrap_or_default();
            format!(
                "Attribute `{name}` changed on `{selector}`\n\n{}",
                diff_fence(&format!("- {name}=\"{before}\"\n+ {name}=\"{after}\""))
            )
        }
        EventPayload::MutationText {
            old_value,
            new_value,
        } => {
            let body = line_set_diff(old_value, new_value);
            if body.is_empty() {
                format!("Text changed on `{selector}`")
            } else {
                format!("Text changed on `{selector}`\n\n{}", diff_fence(&body))
            }
        }
        EventPayload::PageError { message, source } => match source {
            Some(source) => format!("Page error: {message} (at `{source}`)"),
            None => format!("Page error: {message}"),
        },
        _ => format!("Unrecognized event `{}` on `{selector}`", event.kind_tag()),
    }
}

/// Parent before/after snapshots give a real line diff; otherwise fall back
/// to prefixing each captured fragment wholesale.
fn mutation_diff(
    nodes: &[DomFragment],
    parent_before: &Option<String>,
    parent_after: &Option<String>,
    fallback_prefix: char,
    policy: &ExportPolicyView,
) -> Option<String> {
    if let (Some(before), Some(after)) = (parent_before, parent_after) {
        let before = clip_fragment(before, policy).unwrap_or_default();
        let after = clip_fragment(after, policy).unwrap_or_default();
        let body = line_set_diff(&before, &after);
        if body.is_empty() {
            return None;
        }
        return Some(diff_fence(&body));
    }

    let parts: Vec<String> = nodes
        .iter()
        .filter_map(|node| clip_fragment(&node.html, policy))
        .map(|html| prefixed(&html, fallback_prefix))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(diff_fence(&parts.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagetrace_core_types::{
        DomFragment, ElementDescriptor, EventDraft, Modifiers, MouseButton, SessionId,
    };
    use pretty_assertions::assert_eq;

    fn event(payload: EventPayload, descriptor: ElementDescriptor) -> EventRecord {
        EventRecord::from_draft(
            EventDraft::new(1_234, descriptor, payload),
            SessionId("s".into()),
            0,
        )
    }

    #[test]
    fn relative_stamps_are_minutes_seconds_millis() {
        assert_eq!(format_relative(0), "00:00.000");
        assert_eq!(format_relative(61_023), "01:01.023");
        assert_eq!(format_relative(600_000), "10:00.000");
    }

    #[test]
    fn click_description_matches_the_fixed_grammar() {
        let descriptor = ElementDescriptor {
            tag: "button".into(),
            label: Some("Submit".into()),
            selector: "button#submit-btn".into(),
            ..Default::default()
        };
        let event = event(
            EventPayload::Click {
                button: MouseButton::Left,
                x: 0.0,
                y: 0.0,
                modifiers: Modifiers::default(),
            },
            descriptor,
        );
        assert_eq!(
            describe(&event, &ExportPolicyView::default()),
            "User clicked **\"Submit\"** (`button#submit-btn`)"
        );
    }

    #[test]
    fn click_with_modifiers_gets_a_suffix() {
        let event = event(
            EventPayload::Click {
                button: MouseButton::Left,
                x: 0.0,
                y: 0.0,
                modifiers: Modifiers {
                    ctrl: true,
                    shift: true,
                    ..Default::default()
                },
            },
            ElementDescriptor {
                tag: "a".into(),
                label: Some("Open".into()),
                selector: "#open".into(),
                ..Default::default()
            },
        );
        assert!(describe(&event, &ExportPolicyView::default())
            .ends_with("while holding Ctrl+Shift"));
    }

    #[test]
    fn redacted_input_values_are_marked() {
        let event = event(
            EventPayload::Input {
                input_type: "email".into(),
                value: "[EMAIL]".into(),
                selection: None,
            },
            ElementDescriptor {
                tag: "input".into(),
                label: Some("Email".into()),
                selector: "#email".into(),
                ..Default::default()
            },
        );
        let text = describe(&event, &ExportPolicyView::default());
        assert!(text.contains("Value: `[EMAIL]` (redacted)"));
    }

    #[test]
    fn add_mutation_without_parent_context_uses_plus_fallback() {
        let event = event(
            EventPayload::MutationAdd {
                node_count: 1,
                nodes: vec![DomFragment {
                    html: "<li>first</li>".into(),
                    text: "first".into(),
                    attributes: Default::default(),
                }],
                parent_before: None,
                parent_after: None,
            },
            ElementDescriptor {
                tag: "form".into(),
                selector: "form#contact-form".into(),
                ..Default::default()
            },
        );
        let text = describe(&event, &ExportPolicyView::default());
        assert!(text.starts_with("1 element added to `form#contact-form`"));
        let diff_lines: Vec<&str> = text
            .lines()
            .filter(|line| line.starts_with('+') || line.starts_with('-'))
            .collect();
        assert!(!diff_lines.is_empty());
        assert!(diff_lines.iter().all(|line| line.starts_with('+')));
    }

    #[test]
    fn attribute_mutation_renders_a_two_line_diff() {
        let event = event(
            EventPayload::MutationAttribute {
                name: "class".into(),
                old_value: Some("closed".into()),
                new_value: Some("open".into()),
            },
            ElementDescriptor {
                tag: "div".into(),
                selector: "#panel".into(),
                ..Default::default()
            },
        );
        let text = describe(&event, &ExportPolicyView::default());
        assert!(text.contains("- class=\"closed\""));
        assert!(text.contains("+ class=\"open\""));
    }

    #[test]
    fn short_fragments_are_omitted_and_long_ones_truncated() {
        let policy = ExportPolicyView {
            fragment_min_len: 10,
            fragment_char_budget: 20,
            ..Default::default()
        };
        assert_eq!(clip_fragment("<p></p>", &policy), None);
        let clipped = clip_fragment(&"x".repeat(40), &policy).unwrap();
        assert!(clipped.ends_with("… [truncated]"));
        assert!(clipped.starts_with(&"x".repeat(20)));
    }
}
