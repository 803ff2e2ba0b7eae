use dom_snapshot::{DomTree, NodeId};

/// Explicit `role` attribute wins; otherwise the fixed tag table, with
/// `input` dispatched through its `type` attribute.
pub fn resolve(tree: &DomTree, node: NodeId) -> Option<String> {
    if let Some(explicit) = tree.attr(node, "role").map(str::trim) {
        if !explicit.is_empty() {
            return Some(explicit.to_string());
        }
    }
    let tag = tree.tag(node)?;
    if tag == "input" {
        let input_type = tree.attr(node, "type").unwrap_or("text");
        return Some(input_role(input_type).to_string());
    }
    tag_role(tag).map(str::to_string)
}

fn tag_role(tag: &str) -> Option<&'static str> {
    match tag {
        "a" => Some("link"),
        "button" => Some("button"),
        "select" => Some("combobox"),
        "textarea" => Some("textbox"),
        "img" => Some("img"),
        "nav" => Some("navigation"),
        "main" => Some("main"),
        "header" => Some("banner"),
        "footer" => Some("contentinfo"),
        "form" => Some("form"),
        "table" => Some("table"),
        "ul" | "ol" => Some("list"),
        "li" => Some("listitem"),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some("heading"),
        "dialog" => Some("dialog"),
        "article" => Some("article"),
        _ => None,
    }
}

fn input_role(input_type: &str) -> &'static str {
    match input_type.to_ascii_lowercase().as_str() {
        "checkbox" => "checkbox",
        "radio" => "radio",
        "range" => "slider",
        "button" | "submit" | "reset" | "image" => "button",
        "number" => "spinbutton",
        "search" => "searchbox",
        _ => "textbox",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(tag: &str) -> (DomTree, NodeId) {
        let mut tree = DomTree::with_root("body");
        let root = tree.root();
        let node = tree.append_element(root, tag).unwrap();
        (tree, node)
    }

    #[test]
    fn explicit_role_attribute_wins() {
        let (mut tree, node) = tree_with("div");
        tree.set_attr(node, "role", "tablist").unwrap();
        assert_eq!(resolve(&tree, node).as_deref(), Some("tablist"));
    }

    #[test]
    fn input_type_dispatch() {
        let (mut tree, node) = tree_with("input");
        tree.set_attr(node, "type", "checkbox").unwrap();
        assert_eq!(resolve(&tree, node).as_deref(), Some("checkbox"));

        tree.set_attr(node, "type", "range").unwrap();
        assert_eq!(resolve(&tree, node).as_deref(), Some("slider"));

        tree.set_attr(node, "type", "definitely-new").unwrap();
        assert_eq!(resolve(&tree, node).as_deref(), Some("textbox"));
    }

    #[test]
    fn unknown_tags_have_no_role() {
        let (tree, node) = tree_with("blink");
        assert_eq!(resolve(&tree, node), None);
    }
}
