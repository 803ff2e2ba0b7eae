use std::collections::BTreeMap;

use pagetrace_core_types::DomFragment;

use crate::tree::{DomTree, NodeId, NodeKind};

/// Tag categories that never contribute to captured markup: non-content
/// machinery and anything that could smuggle executable payloads.
const IGNORED_TAGS: &[&str] = &[
    "script", "style", "meta", "link", "head", "noscript", "template", "base",
];

const VOID_TAGS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "source", "track", "wbr",
];

pub fn is_ignored_tag(tag: &str) -> bool {
    IGNORED_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// Attributes surviving sanitization: no event handlers, no script URLs.
fn sanitized_attrs(attrs: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    attrs
        .iter()
        .filter(|(name, value)| {
            if name.to_ascii_lowercase().starts_with("on") {
                return false;
            }
            let lowered = value.trim().to_ascii_lowercase();
            !(matches!(name.as_str(), "href" | "src" | "action" | "formaction")
                && lowered.starts_with("javascript:"))
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Renders the sanitized outer HTML of `id`. Ignored subtrees render empty.
pub fn outer_html(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    render(tree, id, &mut out);
    out
}

fn render(tree: &DomTree, id: NodeId, out: &mut String) {
    match tree.kind(id) {
        Some(NodeKind::Text { text }) => out.push_str(&escape(text)),
        Some(NodeKind::Element { tag, attrs }) => {
            if is_ignored_tag(tag) {
                return;
            }
            out.push('<');
            out.push_str(tag);
            for (name, value) in sanitized_attrs(attrs) {
                out.push(' ');
                out.push_str(&name);
                out.push_str("=\"");
                out.push_str(&escape(&value));
                out.push('"');
            }
            out.push('>');
            if is_void_tag(tag) {
                return;
            }
            for &child in tree.children(id) {
                render(tree, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        None => {}
    }
}

/// Visible text of `id`, whitespace-normalized, skipping ignored subtrees.
pub fn extract_text(tree: &DomTree, id: NodeId) -> String {
    let mut parts = Vec::new();
    collect_text(tree, id, &mut parts);
    parts.join(" ")
}

fn collect_text(tree: &DomTree, id: NodeId, parts: &mut Vec<String>) {
    match tree.kind(id) {
        Some(NodeKind::Text { text }) => {
            let trimmed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
        Some(NodeKind::Element { tag, .. }) => {
            if is_ignored_tag(tag) {
                return;
            }
            for &child in tree.children(id) {
                collect_text(tree, child, parts);
            }
        }
        None => {}
    }
}

/// Builds the sanitized [`DomFragment`] snapshot of a subtree.
pub fn fragment(tree: &DomTree, id: NodeId) -> DomFragment {
    let attributes = tree
        .attrs(id)
        .map(sanitized_attrs)
        .unwrap_or_default();
    DomFragment {
        html: outer_html(tree, id),
        text: extract_text(tree, id),
        attributes,
    }
}
