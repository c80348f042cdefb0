pub mod snapshot;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;

pub const POST_TAG: &str = "article";
pub const TEST_ID_ATTR: &str = "data-testid";
pub const POST_TEST_ID: &str = "tweet";
pub const POST_TEXT_TEST_ID: &str = "tweetText";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} already has a parent")]
    AlreadyAttached(NodeId),
    #[error("node {0} cannot have children")]
    NotAnElement(NodeId),
    #[error("node {0} cannot be removed")]
    RootRemoval(NodeId),
    #[error("appending node {0} would create a cycle")]
    WouldCycle(NodeId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    pub added: Vec<NodeId>,
    /// Every node of every removed subtree, not just its root.
    pub removed: Vec<NodeId>,
}

impl MutationBatch {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug)]
enum NodeKind {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
        hidden: bool,
    },
    Text(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct Document {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    pending: MutationBatch,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: HashMap::new(),
            root: NodeId(0),
            next_id: 0,
            pending: MutationBatch::default(),
        };
        doc.root = doc.create_element("body", &[]);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        self.insert_node(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
            hidden: false,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.insert_node(NodeKind::Text(text.to_string()))
    }

    /// `article[data-testid=tweet] > div[data-testid=tweetText] > text`
    pub fn create_post(&mut self, text: &str) -> Result<NodeId, PageError> {
        let post = self.create_element(POST_TAG, &[(TEST_ID_ATTR, POST_TEST_ID)]);
        let body = self.create_element("div", &[(TEST_ID_ATTR, POST_TEXT_TEST_ID)]);
        let content = self.create_text(text);
        self.append_child(body, content)?;
        self.append_child(post, body)?;
        Ok(post)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), PageError> {
        match self.nodes.get(&parent).map(|node| &node.kind) {
            None => return Err(PageError::UnknownNode(parent)),
            Some(NodeKind::Text(_)) => return Err(PageError::NotAnElement(parent)),
            Some(NodeKind::Element { .. }) => {}
        }
        let node = self
            .nodes
            .get(&child)
            .ok_or(PageError::UnknownNode(child))?;
        if node.parent.is_some() {
            return Err(PageError::AlreadyAttached(child));
        }
        if child == self.root || self.is_ancestor(child, parent) {
            return Err(PageError::WouldCycle(child));
        }

        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        if self.is_connected(parent) {
            self.pending.added.push(child);
        }
        Ok(())
    }

    pub fn remove(&mut self, node: NodeId) -> Result<(), PageError> {
        if node == self.root {
            return Err(PageError::RootRemoval(node));
        }
        let connected = self.is_connected(node);
        let parent = self
            .nodes
            .get(&node)
            .ok_or(PageError::UnknownNode(node))?
            .parent;
        if let Some(parent) = parent.and_then(|id| self.nodes.get_mut(&id)) {
            parent.children.retain(|child| *child != node);
        }

        let subtree = self.subtree(node);
        for id in &subtree {
            self.nodes.remove(id);
        }
        if connected {
            self.pending.added.retain(|id| !subtree.contains(id));
            self.pending.removed.extend(subtree);
        }
        Ok(())
    }

    pub fn take_mutations(&mut self) -> Option<MutationBatch> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    pub fn is_post(&self, node: NodeId) -> bool {
        self.tag(node) == Some(POST_TAG) && self.attr(node, TEST_ID_ATTR) == Some(POST_TEST_ID)
    }

    pub fn posts(&self) -> Vec<NodeId> {
        self.posts_within(self.root)
    }

    pub fn posts_within(&self, node: NodeId) -> Vec<NodeId> {
        self.subtree(node)
            .into_iter()
            .filter(|id| self.is_post(*id))
            .collect()
    }

    /// First element below `node` (excluding `node`) carrying `name=value`.
    pub fn find_by_attr(&self, node: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.subtree(node)
            .into_iter()
            .skip(1)
            .find(|id| self.attr(*id, name) == Some(value))
    }

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        for id in self.subtree(node) {
            if let Some(Node {
                kind: NodeKind::Text(text),
                ..
            }) = self.nodes.get(&id)
            {
                out.push_str(text);
            }
        }
        out
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        matches!(
            self.nodes.get(&node).map(|n| &n.kind),
            Some(NodeKind::Element { hidden: true, .. })
        )
    }

    /// Returns `false` when the node is gone or is not an element.
    pub fn set_hidden(&mut self, node: NodeId, value: bool) -> bool {
        match self.nodes.get_mut(&node).map(|n| &mut n.kind) {
            Some(NodeKind::Element { hidden, .. }) => {
                *hidden = value;
                true
            }
            _ => false,
        }
    }

    fn insert_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    fn is_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.nodes.contains_key(&node) {
            return out;
        }
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }
}
