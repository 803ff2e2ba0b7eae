use dom_snapshot::{DomTree, NodeId};

/// CSS selector for `node`: `#id` when available, else a ` > `-joined
/// ancestor path that stops at the first id-bearing ancestor.
pub fn css(tree: &DomTree, node: NodeId) -> String {
    if let Some(id) = element_id(tree, node) {
        return format!("#{}", escape_ident(id));
    }

    let mut segments = vec![css_segment(tree, node)];
    let mut current = node;
    while let Some(parent) = tree.parent(current) {
        if !tree.is_element(parent) {
            break;
        }
        if let Some(id) = element_id(tree, parent) {
            segments.push(format!("#{}", escape_ident(id)));
            break;
        }
        segments.push(css_segment(tree, parent));
        current = parent;
    }
    segments.reverse();
    segments.join(" > ")
}

fn css_segment(tree: &DomTree, node: NodeId) -> String {
    let tag = tree.tag(node).unwrap_or("*");
    let mut segment = tag.to_string();
    if let Some(classes) = tree.attr(node, "class") {
        for class in classes.split_whitespace().take(2) {
            segment.push('.');
            segment.push_str(&escape_ident(class));
        }
    }
    if let Some(position) = nth_of_type(tree, node) {
        segment.push_str(&format!(":nth-of-type({position})"));
    }
    segment
}

/// 1-based position among same-tag element siblings; `None` when the tag is
/// unique at this level (no disambiguation needed).
fn nth_of_type(tree: &DomTree, node: NodeId) -> Option<usize> {
    let parent = tree.parent(node)?;
    let tag = tree.tag(node)?;
    let same_tag: Vec<NodeId> = tree
        .children(parent)
        .iter()
        .copied()
        .filter(|&sibling| tree.tag(sibling) == Some(tag))
        .collect();
    if same_tag.len() <= 1 {
        return None;
    }
    same_tag.iter().position(|&sibling| sibling == node).map(|idx| idx + 1)
}

/// XPath for `node`: the `//*[@id=…]` shortcut, else a root-relative chain of
/// `tag[n]` segments where n counts same-tag preceding siblings, 1-based.
pub fn xpath(tree: &DomTree, node: NodeId) -> String {
    if let Some(id) = element_id(tree, node) {
        return format!("//*[@id=\"{id}\"]");
    }

    let mut chain = vec![node];
    let mut current = node;
    while let Some(parent) = tree.parent(current) {
        chain.push(parent);
        current = parent;
    }
    chain.reverse();

    let mut path = String::new();
    for step in chain {
        let Some(tag) = tree.tag(step) else {
            continue;
        };
        path.push('/');
        path.push_str(tag);
        path.push_str(&format!("[{}]", xpath_index(tree, step, tag)));
    }
    path
}

fn xpath_index(tree: &DomTree, node: NodeId, tag: &str) -> usize {
    let Some(parent) = tree.parent(node) else {
        return 1;
    };
    let mut index = 1;
    for &sibling in tree.children(parent) {
        if sibling == node {
            break;
        }
        if tree.tag(sibling) == Some(tag) {
            index += 1;
        }
    }
    index
}

fn element_id<'t>(tree: &'t DomTree, node: NodeId) -> Option<&'t str> {
    tree.attr(node, "id")
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Minimal CSS identifier escaping: anything outside `[A-Za-z0-9_-]` gets a
/// backslash.
fn escape_ident(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for ch in ident.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn list_tree() -> (DomTree, NodeId, NodeId) {
        let mut tree = DomTree::with_root("html");
        let root = tree.root();
        let body = tree.append_element(root, "body").unwrap();
        let container = tree.append_element(body, "div").unwrap();
        tree.set_attr(container, "id", "menu").unwrap();
        let list = tree.append_element(container, "ul").unwrap();
        tree.set_attr(list, "class", "items compact extra").unwrap();
        let _first = tree.append_element(list, "li").unwrap();
        let second = tree.append_element(list, "li").unwrap();
        (tree, list, second)
    }

    #[test]
    fn id_shortcut_is_immediate() {
        let (tree, _, _) = list_tree();
        let container = tree.find_by_id_attr("menu").unwrap();
        assert_eq!(css(&tree, container), "#menu");
        assert_eq!(xpath(&tree, container), "//*[@id=\"menu\"]");
    }

    #[test]
    fn css_path_stops_at_id_ancestor() {
        let (tree, _, second) = list_tree();
        assert_eq!(
            css(&tree, second),
            "#menu > ul.items.compact > li:nth-of-type(2)"
        );
    }

    #[test]
    fn classes_are_limited_to_two() {
        let (tree, list, _) = list_tree();
        assert_eq!(css(&tree, list), "#menu > ul.items.compact");
    }

    #[test]
    fn xpath_counts_same_tag_siblings() {
        let mut tree = DomTree::with_root("html");
        let root = tree.root();
        let body = tree.append_element(root, "body").unwrap();
        let _p = tree.append_element(body, "p").unwrap();
        let div = tree.append_element(body, "div").unwrap();
        let span = tree.append_element(div, "span").unwrap();
        assert_eq!(xpath(&tree, span), "/html[1]/body[1]/div[1]/span[1]");

        let div2 = tree.append_element(body, "div").unwrap();
        assert_eq!(xpath(&tree, div2), "/html[1]/body[1]/div[2]");
    }

    #[test]
    fn special_characters_are_escaped() {
        let mut tree = DomTree::with_root("div");
        let root = tree.root();
        let node = tree.append_element(root, "span").unwrap();
        tree.set_attr(node, "id", "a:b.c").unwrap();
        assert_eq!(css(&tree, node), "#a\\:b\\.c");
    }
}
