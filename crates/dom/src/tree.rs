//! Document tree structure

use rustc_hash::FxHashMap;
use std::fmt;

use crate::error::{DomError, DomResult};
use crate::node::{ElementData, Node, NodeId, NodeType};

/// Document tree that owns all nodes
pub struct DomTree {
    /// All nodes in the tree
    nodes: FxHashMap<NodeId, Node>,
    /// Next available node ID
    next_id: u32,
    /// Root document node
    document_id: NodeId,
}

impl DomTree {
    /// Create a new empty document tree
    pub fn new() -> Self {
        let document_id = NodeId::new(0);
        let document = Node::new(document_id, NodeType::Document);

        let mut nodes = FxHashMap::default();
        nodes.insert(document_id, document);

        Self {
            nodes,
            next_id: 1,
            document_id,
        }
    }

    /// Get the document (root) node ID
    pub fn document_id(&self) -> NodeId {
        self.document_id
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(id, node_type));
        id
    }

    /// Create a new element node
    pub fn create_element(&mut self, tag_name: impl Into<String>) -> NodeId {
        self.alloc(NodeType::Element(ElementData::new(tag_name)))
    }

    /// Create a new text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeType::Text(content.into()))
    }

    /// Create a new comment node
    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeType::Comment(content.into()))
    }

    /// Append a child node to a parent
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> DomResult<()> {
        let last_child = {
            let parent = self.get(parent_id).ok_or(DomError::NodeNotFound(parent_id.0))?;
            parent.children.last().copied()
        };

        {
            let child = self.get_mut(child_id).ok_or(DomError::NodeNotFound(child_id.0))?;
            child.parent = Some(parent_id);
            child.prev_sibling = last_child;
            child.next_sibling = None;
        }

        if let Some(last_child_id) = last_child {
            if let Some(last) = self.get_mut(last_child_id) {
                last.next_sibling = Some(child_id);
            }
        }

        {
            let parent = self.get_mut(parent_id).ok_or(DomError::NodeNotFound(parent_id.0))?;
            parent.children.push(child_id);
        }

        Ok(())
    }

    /// Insert a child node before an existing child of a parent
    pub fn insert_before(
        &mut self,
        parent_id: NodeId,
        before_id: NodeId,
        child_id: NodeId,
    ) -> DomResult<()> {
        let index = {
            let parent = self.get(parent_id).ok_or(DomError::NodeNotFound(parent_id.0))?;
            parent
                .children
                .iter()
                .position(|&id| id == before_id)
                .ok_or(DomError::NodeNotFound(before_id.0))?
        };

        let prev_sibling = {
            let before = self.get(before_id).ok_or(DomError::NodeNotFound(before_id.0))?;
            before.prev_sibling
        };

        {
            let child = self.get_mut(child_id).ok_or(DomError::NodeNotFound(child_id.0))?;
            child.parent = Some(parent_id);
            child.prev_sibling = prev_sibling;
            child.next_sibling = Some(before_id);
        }

        if let Some(prev_id) = prev_sibling {
            if let Some(prev) = self.get_mut(prev_id) {
                prev.next_sibling = Some(child_id);
            }
        }
        if let Some(before) = self.get_mut(before_id) {
            before.prev_sibling = Some(child_id);
        }

        {
            let parent = self.get_mut(parent_id).ok_or(DomError::NodeNotFound(parent_id.0))?;
            parent.children.insert(index, child_id);
        }

        Ok(())
    }

    /// Remove a node from its parent
    pub fn remove_child(&mut self, parent_id: NodeId, child_id: NodeId) -> DomResult<()> {
        let (prev_sibling, next_sibling) = {
            let child = self.get(child_id).ok_or(DomError::NodeNotFound(child_id.0))?;
            (child.prev_sibling, child.next_sibling)
        };

        if let Some(prev_id) = prev_sibling {
            if let Some(prev) = self.get_mut(prev_id) {
                prev.next_sibling = next_sibling;
            }
        }
        if let Some(next_id) = next_sibling {
            if let Some(next) = self.get_mut(next_id) {
                next.prev_sibling = prev_sibling;
            }
        }

        {
            let parent = self.get_mut(parent_id).ok_or(DomError::NodeNotFound(parent_id.0))?;
            parent.children.retain(|id| *id != child_id);
        }

        {
            let child = self.get_mut(child_id).ok_or(DomError::NodeNotFound(child_id.0))?;
            child.parent = None;
            child.prev_sibling = None;
            child.next_sibling = None;
        }

        Ok(())
    }

    /// Detach a node from its parent, wherever it is
    pub fn detach(&mut self, child_id: NodeId) -> DomResult<()> {
        let parent_id = self
            .get(child_id)
            .ok_or(DomError::NodeNotFound(child_id.0))?
            .parent
            .ok_or(DomError::InvalidOperation("node has no parent".to_string()))?;
        self.remove_child(parent_id, child_id)
    }

    /// Get all children of a node
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id)
            .map(|n| n.children.to_vec())
            .unwrap_or_default()
    }

    /// Iterate over all descendants of a node (depth-first)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        self.collect_descendants(id, &mut result);
        result
    }

    fn collect_descendants(&self, id: NodeId, result: &mut Vec<NodeId>) {
        if let Some(node) = self.get(id) {
            for &child_id in &node.children {
                result.push(child_id);
                self.collect_descendants(child_id, result);
            }
        }
    }

    /// Check whether `id` is inside the subtree rooted at `ancestor_id`
    pub fn is_descendant_of(&self, id: NodeId, ancestor_id: NodeId) -> bool {
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(parent_id) = current {
            if parent_id == ancestor_id {
                return true;
            }
            current = self.get(parent_id).and_then(|n| n.parent);
        }
        false
    }

    /// Get the text content of a node and all its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, result: &mut String) {
        if let Some(node) = self.get(id) {
            match &node.node_type {
                NodeType::Text(text) => result.push_str(text),
                NodeType::Comment(_) => {}
                _ => {
                    for &child_id in &node.children {
                        self.collect_text(child_id, result);
                    }
                }
            }
        }
    }

    /// All text nodes in the subtree rooted at `id`, in document order
    pub fn descendant_text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&child_id| self.get(child_id).map(|n| n.is_text()).unwrap_or(false))
            .collect()
    }

    /// The leading text run: the first text child appearing before any
    /// element child. Returns None if the first non-comment child is an
    /// element, or the node has no children.
    pub fn leading_text(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        for &child_id in &node.children {
            match self.get(child_id).map(|n| &n.node_type) {
                Some(NodeType::Text(_)) => return Some(child_id),
                Some(NodeType::Comment(_)) => continue,
                _ => return None,
            }
        }
        None
    }

    /// Replace the leading text run with `value`, creating a text node as
    /// first child when there is none.
    pub fn set_leading_text(&mut self, id: NodeId, value: impl Into<String>) -> DomResult<()> {
        let value = value.into();
        if let Some(text_id) = self.leading_text(id) {
            if let Some(text) = self.get_mut(text_id).and_then(|n| n.as_text_mut()) {
                *text = value;
            }
            return Ok(());
        }

        let text_id = self.create_text(value);
        match self.children(id).first().copied() {
            Some(first) => self.insert_before(id, first, text_id),
            None => self.append_child(id, text_id),
        }
    }

    /// Previous sibling that is an element, skipping text and comments
    pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.get(id)?.prev_sibling;
        while let Some(sib_id) = current {
            let node = self.get(sib_id)?;
            if node.is_element() {
                return Some(sib_id);
            }
            current = node.prev_sibling;
        }
        None
    }

    /// Next sibling that is an element, skipping text and comments
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.get(id)?.next_sibling;
        while let Some(sib_id) = current {
            let node = self.get(sib_id)?;
            if node.is_element() {
                return Some(sib_id);
            }
            current = node.next_sibling;
        }
        None
    }

    /// Get the number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (only has the document node)
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Pretty print the tree for debugging
    pub fn pretty_print(&self) -> String {
        let mut output = String::new();
        self.print_node(self.document_id, 0, &mut output);
        output
    }

    fn print_node(&self, id: NodeId, depth: usize, output: &mut String) {
        let indent = "  ".repeat(depth);

        if let Some(node) = self.get(id) {
            match &node.node_type {
                NodeType::Document => {
                    output.push_str("#document\n");
                }
                NodeType::Element(elem) => {
                    let attrs: Vec<String> = elem
                        .attributes
                        .iter()
                        .map(|(k, v)| format!("{}=\"{}\"", k, v))
                        .collect();
                    let attrs_str = if attrs.is_empty() {
                        String::new()
                    } else {
                        format!(" {}", attrs.join(" "))
                    };
                    output.push_str(&format!("{}<{}{}>\n", indent, elem.tag_name, attrs_str));
                }
                NodeType::Text(text) => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        output.push_str(&format!("{}#text: {:?}\n", indent, trimmed));
                    }
                }
                NodeType::Comment(text) => {
                    output.push_str(&format!("{}<!-- {} -->\n", indent, text));
                }
            }

            for &child_id in &node.children {
                self.print_node(child_id, depth + 1, output);
            }
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DomTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty_print())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_elements() {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let body = tree.create_element("body");
        let text = tree.create_text("Hello, World!");

        tree.append_child(tree.document_id(), html).unwrap();
        tree.append_child(html, body).unwrap();
        tree.append_child(body, text).unwrap();

        assert_eq!(tree.len(), 4); // document + html + body + text
        assert_eq!(tree.text_content(body), "Hello, World!");
    }

    #[test]
    fn test_insert_before() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let world = tree.create_text("world");
        tree.append_child(tree.document_id(), p).unwrap();
        tree.append_child(p, world).unwrap();

        let hello = tree.create_text("hello ");
        tree.insert_before(p, world, hello).unwrap();

        assert_eq!(tree.text_content(p), "hello world");
        assert_eq!(tree.get(world).unwrap().prev_sibling, Some(hello));
        assert_eq!(tree.get(hello).unwrap().next_sibling, Some(world));
    }

    #[test]
    fn test_detach_relinks_siblings() {
        let mut tree = DomTree::new();
        let ul = tree.create_element("ul");
        let a = tree.create_element("li");
        let b = tree.create_element("li");
        let c = tree.create_element("li");
        tree.append_child(tree.document_id(), ul).unwrap();
        for li in [a, b, c] {
            tree.append_child(ul, li).unwrap();
        }

        tree.detach(b).unwrap();

        assert_eq!(tree.children(ul), vec![a, c]);
        assert_eq!(tree.get(a).unwrap().next_sibling, Some(c));
        assert_eq!(tree.get(c).unwrap().prev_sibling, Some(a));
        assert_eq!(tree.get(b).unwrap().parent, None);
    }

    #[test]
    fn test_leading_text() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let text = tree.create_text("lead");
        let span = tree.create_element("span");
        tree.append_child(tree.document_id(), p).unwrap();
        tree.append_child(p, text).unwrap();
        tree.append_child(p, span).unwrap();

        assert_eq!(tree.leading_text(p), Some(text));

        // An element before any text means there is no leading run
        let q = tree.create_element("p");
        let i = tree.create_element("i");
        let tail = tree.create_text("tail");
        tree.append_child(tree.document_id(), q).unwrap();
        tree.append_child(q, i).unwrap();
        tree.append_child(q, tail).unwrap();
        assert_eq!(tree.leading_text(q), None);
    }

    #[test]
    fn test_set_leading_text_creates_node() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let span = tree.create_element("span");
        let inner = tree.create_text("x");
        tree.append_child(tree.document_id(), p).unwrap();
        tree.append_child(p, span).unwrap();
        tree.append_child(span, inner).unwrap();

        tree.set_leading_text(p, "lead ").unwrap();
        assert_eq!(tree.text_content(p), "lead x");
    }

    #[test]
    fn test_element_sibling_navigation() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let a = tree.create_element("a");
        let t = tree.create_text(" between ");
        let b = tree.create_element("b");
        tree.append_child(tree.document_id(), div).unwrap();
        tree.append_child(div, a).unwrap();
        tree.append_child(div, t).unwrap();
        tree.append_child(div, b).unwrap();

        assert_eq!(tree.next_element_sibling(a), Some(b));
        assert_eq!(tree.prev_element_sibling(b), Some(a));
        assert_eq!(tree.prev_element_sibling(a), None);
    }

    #[test]
    fn test_is_descendant_of() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let p = tree.create_element("p");
        let text = tree.create_text("x");
        tree.append_child(tree.document_id(), div).unwrap();
        tree.append_child(div, p).unwrap();
        tree.append_child(p, text).unwrap();

        assert!(tree.is_descendant_of(text, div));
        assert!(tree.is_descendant_of(p, div));
        assert!(!tree.is_descendant_of(div, p));
    }
}
