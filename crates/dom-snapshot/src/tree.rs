use std::collections::BTreeMap;

use pagetrace_core_types::BoundingBox;

use crate::{DomError, DomResult};

/// Index into a [`DomTree`] arena. Only meaningful for the tree that issued it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
    Text {
        text: String,
    },
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    layout: Option<BoundingBox>,
}

/// An owned DOM tree. Nodes live in an arena and are addressed by [`NodeId`];
/// detached subtrees become standalone trees, so no live back-references
/// ever escape.
#[derive(Clone, Debug)]
pub struct DomTree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl DomTree {
    /// Creates a tree with a single root element.
    pub fn with_root(tag: impl Into<String>) -> Self {
        let tag: String = tag.into();
        let root = Node {
            kind: NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: BTreeMap::new(),
            },
            parent: None,
            children: Vec::new(),
            layout: None,
        };
        Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).map_or(false, Option::is_some)
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(DomError::InvalidNode)
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(DomError::InvalidNode)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        id
    }

    pub fn append_element(&mut self, parent: NodeId, tag: impl Into<String>) -> DomResult<NodeId> {
        self.node(parent)?;
        let tag: String = tag.into();
        let id = self.push(Node {
            kind: NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: BTreeMap::new(),
            },
            parent: Some(parent),
            children: Vec::new(),
            layout: None,
        });
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> DomResult<NodeId> {
        self.node(parent)?;
        let id = self.push(Node {
            kind: NodeKind::Text { text: text.into() },
            parent: Some(parent),
            children: Vec::new(),
            layout: None,
        });
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).ok().map(|n| &n.kind)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element { .. }))
    }

    /// Lowercase tag name; `None` for text nodes and invalid ids.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text { .. } => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeKind::Text { .. } => None,
        }
    }

    pub fn attrs(&self, id: NodeId) -> Option<&BTreeMap<String, String>> {
        match self.kind(id)? {
            NodeKind::Element { attrs, .. } => Some(attrs),
            NodeKind::Text { .. } => None,
        }
    }

    pub fn set_attr(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> DomResult<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element { attrs, .. } => {
                attrs.insert(name.into(), value.into());
                Ok(())
            }
            NodeKind::Text { .. } => Err(DomError::NotAnElement),
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element { attrs, .. } => {
                attrs.remove(name);
                Ok(())
            }
            NodeKind::Text { .. } => Err(DomError::NotAnElement),
        }
    }

    /// Raw text of a text node; `None` for elements.
    pub fn text_of(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text { text } => Some(text.as_str()),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> DomResult<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text { text: current } => {
                *current = text.into();
                Ok(())
            }
            NodeKind::Element { .. } => Err(DomError::NotAnElement),
        }
    }

    pub fn set_layout(&mut self, id: NodeId, layout: BoundingBox) -> DomResult<()> {
        self.node_mut(id)?.layout = Some(layout);
        Ok(())
    }

    pub fn layout(&self, id: NodeId) -> Option<BoundingBox> {
        self.node(id).ok().and_then(|n| n.layout)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Ancestors from the immediate parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    /// First element (in document order) whose `id` attribute equals `value`.
    pub fn find_by_id_attr(&self, value: &str) -> Option<NodeId> {
        self.walk(self.root).into_iter().find(|&id| {
            self.attr(id, "id")
                .map(|candidate| candidate == value)
                .unwrap_or(false)
        })
    }

    fn walk(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if !self.contains(id) {
                continue;
            }
            out.push(id);
            for &child in self.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Deep-copies `from` (and its subtree) into a standalone tree.
    pub fn clone_subtree(&self, from: NodeId) -> DomResult<DomTree> {
        let source = self.node(from)?;
        let mut out = match &source.kind {
            NodeKind::Element { tag, attrs } => {
                let mut tree = DomTree::with_root(tag.clone());
                for (name, value) in attrs {
                    tree.set_attr(tree.root, name.clone(), value.clone())?;
                }
                tree
            }
            // A lone text node still yields a tree; wrap it so the root
            // stays an element.
            NodeKind::Text { text } => {
                let mut tree = DomTree::with_root("span");
                let root = tree.root;
                tree.append_text(root, text.clone())?;
                return Ok(tree);
            }
        };
        if let Some(layout) = source.layout {
            out.set_layout(out.root, layout)?;
        }
        let root = out.root;
        self.copy_children_into(from, &mut out, root)?;
        Ok(out)
    }

    fn copy_children_into(
        &self,
        from: NodeId,
        target: &mut DomTree,
        target_parent: NodeId,
    ) -> DomResult<()> {
        for &child in self.children(from) {
            let Ok(node) = self.node(child) else {
                continue;
            };
            match &node.kind {
                NodeKind::Element { tag, attrs } => {
                    let copied = target.append_element(target_parent, tag.clone())?;
                    for (name, value) in attrs {
                        target.set_attr(copied, name.clone(), value.clone())?;
                    }
                    if let Some(layout) = node.layout {
                        target.set_layout(copied, layout)?;
                    }
                    self.copy_children_into(child, target, copied)?;
                }
                NodeKind::Text { text } => {
                    target.append_text(target_parent, text.clone())?;
                }
            }
        }
        Ok(())
    }

    /// Removes `id` from its parent and returns the subtree as an owned tree.
    /// The removed arena slots are tombstoned; the id is invalid afterwards.
    pub fn detach(&mut self, id: NodeId) -> DomResult<DomTree> {
        if id == self.root {
            return Err(DomError::CannotDetachRoot);
        }
        let subtree = self.clone_subtree(id)?;
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|&child| child != id);
        }
        for slot in self.walk(id) {
            self.nodes[slot.index()] = None;
        }
        Ok(subtree)
    }

    /// Deep-copies another tree under `parent` (re-append semantics for
    /// previously detached subtrees). Returns the new subtree root.
    pub fn adopt(&mut self, parent: NodeId, subtree: &DomTree) -> DomResult<NodeId> {
        let sub_root = subtree.root;
        let new_root = match subtree.kind(sub_root).ok_or(DomError::InvalidNode)? {
            NodeKind::Element { tag, attrs } => {
                let id = self.append_element(parent, tag.clone())?;
                let attrs = attrs.clone();
                for (name, value) in attrs {
                    self.set_attr(id, name, value)?;
                }
                id
            }
            NodeKind::Text { text } => self.append_text(parent, text.clone())?,
        };
        subtree.copy_children_into(sub_root, self, new_root)?;
        Ok(new_root)
    }

    /// Concatenated descendant text, whitespace-normalized.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        for node in self.walk(id) {
            if let Some(text) = self.text_of(node) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed.to_string());
                }
            }
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn form_tree() -> (DomTree, NodeId, NodeId) {
        let mut tree = DomTree::with_root("html");
        let root = tree.root();
        let body = tree.append_element(root, "body").unwrap();
        let form = tree.append_element(body, "form").unwrap();
        tree.set_attr(form, "id", "contact").unwrap();
        let input = tree.append_element(form, "input").unwrap();
        tree.set_attr(input, "type", "text").unwrap();
        (tree, form, input)
    }

    #[test]
    fn detach_removes_and_returns_owned_subtree() {
        let (mut tree, form, input) = form_tree();
        let detached = tree.detach(input).unwrap();
        assert!(!tree.contains(input));
        assert!(tree.children(form).is_empty());
        assert_eq!(detached.tag(detached.root()), Some("input"));
        assert_eq!(detached.attr(detached.root(), "type"), Some("text"));
    }

    #[test]
    fn adopt_reappends_detached_subtree() {
        let (mut tree, form, input) = form_tree();
        let detached = tree.detach(input).unwrap();
        let restored = tree.adopt(form, &detached).unwrap();
        assert_eq!(tree.tag(restored), Some("input"));
        assert_eq!(tree.children(form).to_vec(), vec![restored]);
    }

    #[test]
    fn clone_subtree_is_independent_of_source() {
        let (mut tree, form, _) = form_tree();
        let clone = tree.clone_subtree(form).unwrap();
        tree.set_attr(form, "id", "changed").unwrap();
        assert_eq!(clone.attr(clone.root(), "id"), Some("contact"));
        assert_eq!(clone.children(clone.root()).len(), 1);
    }

    #[test]
    fn text_content_joins_and_normalizes() {
        let mut tree = DomTree::with_root("div");
        let root = tree.root();
        tree.append_text(root, "  hello ").unwrap();
        let span = tree.append_element(root, "span").unwrap();
        tree.append_text(span, "world\n").unwrap();
        assert_eq!(tree.text_content(root), "hello world");
    }

    #[test]
    fn ancestors_walk_to_root() {
        let (tree, form, input) = form_tree();
        let chain = tree.ancestors(input);
        assert_eq!(chain.first(), Some(&form));
        assert_eq!(chain.last(), Some(&tree.root()));
    }

    #[test]
    fn find_by_id_attr_scans_document_order() {
        let (tree, form, _) = form_tree();
        assert_eq!(tree.find_by_id_attr("contact"), Some(form));
        assert_eq!(tree.find_by_id_attr("missing"), None);
    }
}
