use dom_snapshot::{extract_text, DomTree, NodeId};

const MAX_VISIBLE_LABEL: usize = 50;

/// Accessible-name resolution: a fixed priority chain, first non-empty wins.
pub fn resolve(tree: &DomTree, node: NodeId) -> Option<String> {
    attr_label(tree, node, "aria-label")
        .or_else(|| labelledby(tree, node))
        .or_else(|| attr_label(tree, node, "title"))
        .or_else(|| attr_label(tree, node, "alt"))
        .or_else(|| attr_label(tree, node, "placeholder"))
        .or_else(|| associated_label(tree, node))
        .or_else(|| visible_text(tree, node))
}

fn attr_label(tree: &DomTree, node: NodeId, name: &str) -> Option<String> {
    tree.attr(node, name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn labelledby(tree: &DomTree, node: NodeId) -> Option<String> {
    let ids = tree.attr(node, "aria-labelledby")?;
    let parts: Vec<String> = ids
        .split_whitespace()
        .filter_map(|id| tree.find_by_id_attr(id))
        .map(|referenced| extract_text(tree, referenced))
        .filter(|text| !text.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// `<label for=…>` binding, else the nearest ancestor `<label>`; the
/// element's own text/value never leaks into its label.
fn associated_label(tree: &DomTree, node: NodeId) -> Option<String> {
    if let Some(own_id) = tree.attr(node, "id") {
        let bound = document_labels(tree)
            .into_iter()
            .find(|&label| tree.attr(label, "for") == Some(own_id));
        if let Some(label) = bound {
            let text = extract_text(tree, label);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    let ancestor = tree
        .ancestors(node)
        .into_iter()
        .find(|&a| tree.tag(a) == Some("label"))?;
    let text = text_excluding(tree, ancestor, node);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn document_labels(tree: &DomTree) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        if tree.tag(id) == Some("label") {
            out.push(id);
        }
        for &child in tree.children(id).iter().rev() {
            stack.push(child);
        }
    }
    out
}

fn text_excluding(tree: &DomTree, from: NodeId, excluded: NodeId) -> String {
    let mut parts = Vec::new();
    let mut stack = vec![from];
    while let Some(id) = stack.pop() {
        if id == excluded {
            continue;
        }
        if let Some(text) = tree.text_of(id) {
            let trimmed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
        for &child in tree.children(id).iter().rev() {
            stack.push(child);
        }
    }
    parts.join(" ")
}

fn visible_text(tree: &DomTree, node: NodeId) -> Option<String> {
    let text = extract_text(tree, node);
    if text.is_empty() {
        None
    } else {
        Some(clip_visible_text(&text))
    }
}

pub fn clip_visible_text(text: &str) -> String {
    let trimmed = text.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= MAX_VISIBLE_LABEL {
        trimmed.to_string()
    } else {
        let mut clipped: String = chars[..MAX_VISIBLE_LABEL].iter().collect();
        clipped.push('…');
        clipped
    }
}
