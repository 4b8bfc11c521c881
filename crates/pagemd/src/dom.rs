//! Arena-backed document tree.
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`]. Each
//! node keeps an ordered list of child ids and a back-reference to its
//! parent, so the pipeline can detach and replace nodes in place without
//! any shared ownership. Detached nodes stay in the arena; they are simply
//! no longer reachable from the root.

use std::fmt;

/// Index of a node inside its [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node types, numbered after the DOM nodeType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Element node (nodeType = 1)
    Element = 1,
    /// Text node (nodeType = 3)
    Text = 3,
    /// Document node (nodeType = 9)
    Document = 9,
    /// Document fragment node (nodeType = 11)
    DocumentFragment = 11,
}

/// Per-node failures raised while editing the tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0} does not exist in this document")]
    UnknownNode(NodeId),

    #[error("node {0} has no parent")]
    Detached(NodeId),

    #[error("node {child} is not among the children of its parent {parent}")]
    NotAChild { child: NodeId, parent: NodeId },
}

/// A single node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    /// Node type
    pub node_type: NodeType,

    /// Lowercase tag name for elements, `#text`, `#document` otherwise
    pub node_name: String,

    /// Text content for text nodes
    pub node_value: Option<String>,

    /// Attributes in source order
    pub attributes: Vec<(String, String)>,

    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(node_type: NodeType, node_name: String) -> Self {
        Self {
            node_type,
            node_name,
            node_value: None,
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if this is a text node
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get the tag name (lowercase)
    pub fn tag_name(&self) -> &str {
        &self.node_name
    }

    /// Get an attribute value by name (case-insensitive)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Check if an attribute exists
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A mutable document tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create an empty document with a `#document` root
    pub fn new() -> Self {
        Self::with_root(NodeType::Document)
    }

    /// Create an empty document with a `#document-fragment` root
    pub fn fragment() -> Self {
        Self::with_root(NodeType::DocumentFragment)
    }

    fn with_root(node_type: NodeType) -> Self {
        let name = match node_type {
            NodeType::DocumentFragment => "#document-fragment",
            _ => "#document",
        };
        Self {
            nodes: vec![Node::new(node_type, name.to_string())],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever created, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the root has no children
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    /// Create a detached element node
    pub fn create_element(&mut self, tag_name: &str, attributes: Vec<(String, String)>) -> NodeId {
        let mut node = Node::new(NodeType::Element, tag_name.to_ascii_lowercase());
        node.attributes = attributes;
        self.push(node)
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        let mut node = Node::new(NodeType::Text, "#text".to_string());
        node.node_value = Some(content.to_string());
        self.push(node)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(parent)?;
        if self.node(child)?.parent.is_some() {
            self.detach(child)?;
        }
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove a node, together with its subtree, from its parent
    pub fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        let parent = self.node(id)?.parent.ok_or(DomError::Detached(id))?;
        let siblings = &mut self.node_mut(parent)?.children;
        let position = siblings
            .iter()
            .position(|&c| c == id)
            .ok_or(DomError::NotAChild { child: id, parent })?;
        siblings.remove(position);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Put a new text node where `id` was and detach `id`
    pub fn replace_with_text(&mut self, id: NodeId, text: &str) -> Result<NodeId, DomError> {
        let parent = self.node(id)?.parent.ok_or(DomError::Detached(id))?;
        let position = self
            .node(parent)?
            .children
            .iter()
            .position(|&c| c == id)
            .ok_or(DomError::NotAChild { child: id, parent })?;

        let replacement = self.create_text(text);
        self.node_mut(parent)?.children[position] = replacement;
        self.node_mut(replacement)?.parent = Some(parent);
        self.node_mut(id)?.parent = None;
        Ok(replacement)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Get only element children
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.get(c).is_some_and(Node::is_element))
    }

    /// Tag name of an element node
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).filter(|n| n.is_element()).map(Node::tag_name)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id).and_then(|n| n.attr(name))
    }

    /// All descendants of `id` in document order, `id` itself excluded
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Elements below `from` whose tag name satisfies `predicate`, in document order
    pub fn find_elements<F>(&self, from: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&str) -> bool,
    {
        self.descendants(from)
            .filter(|&id| self.tag_name(id).is_some_and(&predicate))
            .collect()
    }

    /// First element below `from` with the given tag name
    pub fn find_first(&self, from: NodeId, tag_name: &str) -> Option<NodeId> {
        self.descendants(from)
            .find(|&id| self.tag_name(id).is_some_and(|t| t.eq_ignore_ascii_case(tag_name)))
    }

    /// Whether `ancestor` is reachable by walking up from `id`
    pub fn is_attached_to(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get(id) {
            Some(node) if node.is_text() => node.node_value.clone().unwrap_or_default(),
            Some(_) => self
                .descendants(id)
                .filter_map(|d| self.get(d))
                .filter(|n| n.is_text())
                .filter_map(|n| n.node_value.as_deref())
                .collect(),
            None => String::new(),
        }
    }

    /// Point the parent link of `id` at a node that does not list it as a child
    #[cfg(test)]
    pub(crate) fn corrupt_parent_link(&mut self, id: NodeId, bogus_parent: NodeId) {
        self.nodes[id.0].parent = Some(bogus_parent);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}
