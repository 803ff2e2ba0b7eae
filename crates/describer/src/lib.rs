mod label;
mod role;
mod selector;

use dom_snapshot::{DomTree, NodeId};
use pagetrace_core_types::ElementDescriptor;

/// Builds the semantic descriptor for a node. Deterministic given the tree
/// state at call time; never fails — non-element nodes yield best-effort
/// partial descriptors keyed off their parent element.
pub fn describe(tree: &DomTree, node: NodeId) -> ElementDescriptor {
    if !tree.is_element(node) {
        return describe_non_element(tree, node);
    }

    let tag = tree.tag(node).unwrap_or_default().to_string();
    let id = tree
        .attr(node, "id")
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    let classes = tree
        .attr(node, "class")
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    ElementDescriptor {
        role: role::resolve(tree, node),
        label: label::resolve(tree, node),
        selector: selector::css(tree, node),
        xpath: selector::xpath(tree, node),
        bounding_box: tree.layout(node),
        tag,
        id,
        classes,
    }
}

fn describe_non_element(tree: &DomTree, node: NodeId) -> ElementDescriptor {
    // Text and other non-element targets borrow their parent's location so
    // the transcript still points somewhere useful.
    let anchor = tree.parent(node).filter(|&p| tree.is_element(p));
    ElementDescriptor {
        tag: "#text".to_string(),
        selector: anchor.map(|p| selector::css(tree, p)).unwrap_or_default(),
        xpath: anchor.map(|p| selector::xpath(tree, p)).unwrap_or_default(),
        label: tree
            .text_of(node)
            .map(label::clip_visible_text)
            .filter(|text| !text.is_empty()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn describes_a_labeled_button() {
        let mut tree = DomTree::with_root("html");
        let root = tree.root();
        let body = tree.append_element(root, "body").unwrap();
        let button = tree.append_element(body, "button").unwrap();
        tree.set_attr(button, "id", "submit-btn").unwrap();
        tree.set_attr(button, "class", "primary wide").unwrap();
        tree.set_attr(button, "aria-label", "Submit").unwrap();

        let desc = describe(&tree, button);
        assert_eq!(desc.tag, "button");
        assert_eq!(desc.id.as_deref(), Some("submit-btn"));
        assert_eq!(desc.classes, vec!["primary", "wide"]);
        assert_eq!(desc.role.as_deref(), Some("button"));
        assert_eq!(desc.label.as_deref(), Some("Submit"));
        assert_eq!(desc.selector, "#submit-btn");
        assert_eq!(desc.xpath, "//*[@id=\"submit-btn\"]");
    }

    #[test]
    fn text_nodes_yield_partial_descriptors() {
        let mut tree = DomTree::with_root("div");
        let root = tree.root();
        let text = tree.append_text(root, "hello").unwrap();
        let desc = describe(&tree, text);
        assert_eq!(desc.tag, "#text");
        assert_eq!(desc.label.as_deref(), Some("hello"));
        assert!(desc.id.is_none());
        assert!(!desc.selector.is_empty());
    }
}
