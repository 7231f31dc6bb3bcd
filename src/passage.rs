//! Passage: the annotation graph arena.
//!
//! A passage owns two layers:
//!
//! - the **terminal layer**, created once from the input tokens and never
//!   mutated afterwards
//! - the **foundational layer**, populated by the converter
//!
//! Nodes live in a `BTreeMap` keyed by [`NodeId`]; edges live in a single
//! edge table keyed by [`EdgeId`]. Each node lists the ids of its outgoing
//! and incoming edges, so removing an edge touches exactly two lists and
//! no back-pointer can dangle.
//!
//! ## Invariants kept by every mutation
//!
//! - Outgoing lists are sorted by [`crate::ordering`]
//! - Terminals never have children
//! - No edge is ever added or moved so that it closes a cycle

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::canonical::canonical_hash_hex;
use crate::ordering;
use crate::policy::PunctuationClassifier;
use crate::types::{Edge, EdgeId, EdgeTag, Layer, Node, NodeId, NodeKind, TagSuffix, Terminal, Token};

/// Error type for passage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PassageError {
    /// Node not found.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    /// Edge not found.
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),
    /// Token positions must run 1..=N without gaps.
    #[error("Token position {found} out of sequence, expected {expected}")]
    NonContiguousPosition {
        /// Expected position.
        expected: u32,
        /// Position found.
        found: u32,
    },
    /// Terminals can only be added before the foundational layer.
    #[error("Terminal layer is sealed once the foundational layer exists")]
    TerminalLayerSealed,
    /// Terminals are immutable.
    #[error("Terminal {0} cannot be modified or given children")]
    TerminalImmutable(NodeId),
    /// A node with this id already exists.
    #[error("Node already exists: {0}")]
    NodeExists(NodeId),
    /// The passage already has a root.
    #[error("Passage already has root {0}")]
    RootExists(NodeId),
    /// The passage has no root.
    #[error("Passage has no root")]
    MissingRoot,
    /// The edge would close a cycle.
    #[error("Edge {parent} -> {child} would create a cycle")]
    WouldCycle {
        /// Proposed parent.
        parent: NodeId,
        /// Proposed child.
        child: NodeId,
    },
    /// The graph contains a cycle through this node.
    #[error("Cycle detected through {0}")]
    Cycle(NodeId),
    /// Non-root node without a primary parent.
    #[error("Node {0} has no primary parent")]
    DetachedNode(NodeId),
    /// Node with more than one primary parent.
    #[error("Node {0} has more than one primary parent")]
    MultiplePrimaryParents(NodeId),
    /// The root has a parent.
    #[error("Root {0} has a parent")]
    RootHasParent(NodeId),
    /// Node not reachable from the root along primary edges.
    #[error("Node {0} is not reachable from the root")]
    Unreachable(NodeId),
    /// An edge still carries a suffix.
    #[error("Edge {edge} still carries suffix in tag `{tag}`")]
    UnresolvedSuffix {
        /// The edge.
        edge: EdgeId,
        /// Its tag.
        tag: String,
    },
}

/// Annotation graph for one sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    id: String,
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    root: Option<NodeId>,
    terminal_count: u32,
    next_foundational: u32,
    next_edge: u64,
}

impl Passage {
    /// Create an empty passage.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            root: None,
            terminal_count: 0,
            next_foundational: 1,
            next_edge: 1,
        }
    }

    /// Create a passage whose terminal layer holds the given tokens.
    ///
    /// Token positions must be exactly `1..=N` in order.
    pub fn from_tokens(
        id: impl Into<String>,
        tokens: &[Token],
        classifier: &PunctuationClassifier,
    ) -> Result<Self, PassageError> {
        let mut passage = Self::new(id);
        for (i, token) in tokens.iter().enumerate() {
            let expected = i as u32 + 1;
            if token.position != expected {
                return Err(PassageError::NonContiguousPosition {
                    expected,
                    found: token.position,
                });
            }
            passage.add_terminal(token.text.clone(), classifier.is_punctuation(token))?;
        }
        Ok(passage)
    }

    /// Passage identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a terminal at the next position.
    ///
    /// The terminal layer is closed once any foundational node exists.
    pub fn add_terminal(&mut self, text: impl Into<String>, is_punctuation: bool) -> Result<NodeId, PassageError> {
        if self.root.is_some() || self.num_foundational() > 0 {
            return Err(PassageError::TerminalLayerSealed);
        }
        self.terminal_count += 1;
        let position = self.terminal_count;
        let id = NodeId::terminal(position);
        let terminal = Terminal {
            position,
            text: text.into(),
            is_punctuation,
        };
        self.nodes.insert(id, Node::new(id, NodeKind::Terminal(terminal)));
        Ok(id)
    }

    /// Number of terminals.
    pub fn num_terminals(&self) -> usize {
        self.terminal_count as usize
    }

    /// Terminals in position order.
    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> {
        self.nodes
            .range(..NodeId::foundational(0))
            .filter_map(|(_, node)| node.as_terminal())
    }

    /// Terminal ids in position order.
    pub fn terminal_ids(&self) -> Vec<NodeId> {
        (1..=self.terminal_count).map(NodeId::terminal).collect()
    }

    /// Number of foundational and punctuation nodes.
    pub fn num_foundational(&self) -> usize {
        self.nodes.len() - self.num_terminals()
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Root of the foundational layer.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Look up an edge.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// All node ids in canonical order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    /// All nodes in canonical order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges by id.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    fn node_ref(&self, id: NodeId) -> Result<&Node, PassageError> {
        self.nodes.get(&id).ok_or(PassageError::NodeNotFound(id))
    }

    fn edge_ref(&self, id: EdgeId) -> Result<&Edge, PassageError> {
        self.edges.get(&id).ok_or(PassageError::EdgeNotFound(id))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────

    /// Create the root node.
    pub fn create_root(&mut self) -> Result<NodeId, PassageError> {
        if let Some(root) = self.root {
            return Err(PassageError::RootExists(root));
        }
        let id = self.add_foundational();
        self.root = Some(id);
        Ok(id)
    }

    /// Create a foundational node with a fresh id.
    pub fn add_foundational(&mut self) -> NodeId {
        let id = NodeId::foundational(self.next_foundational);
        self.next_foundational += 1;
        self.nodes.insert(id, Node::new(id, NodeKind::Foundational));
        id
    }

    /// Insert a non-terminal node under a caller-chosen id.
    ///
    /// Used to give a replacement node the identifier of the node it
    /// replaces.
    pub fn insert_node(&mut self, id: NodeId, kind: NodeKind) -> Result<(), PassageError> {
        if id.layer() == Layer::Terminal || matches!(kind, NodeKind::Terminal(_)) {
            return Err(PassageError::TerminalImmutable(id));
        }
        if self.nodes.contains_key(&id) {
            return Err(PassageError::NodeExists(id));
        }
        self.next_foundational = self.next_foundational.max(id.index() + 1);
        self.nodes.insert(id, Node::new(id, kind));
        Ok(())
    }

    /// Remove a non-terminal node together with all of its edges.
    ///
    /// Returns the node and the removed edges.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(Node, Vec<Edge>), PassageError> {
        let node = self.node_ref(id)?;
        if node.is_terminal() {
            return Err(PassageError::TerminalImmutable(id));
        }
        let edge_ids: Vec<EdgeId> = node.incoming.iter().chain(node.outgoing.iter()).copied().collect();

        let mut removed = Vec::with_capacity(edge_ids.len());
        for edge_id in edge_ids {
            removed.push(self.remove_edge(edge_id)?);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        let node = self.nodes.remove(&id).ok_or(PassageError::NodeNotFound(id))?;
        Ok((node, removed))
    }

    /// Add a primary edge.
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId, tag: EdgeTag) -> Result<EdgeId, PassageError> {
        let id = self.allocate_edge_id();
        self.insert_edge(Edge::new(id, parent, child, tag))
    }

    /// Add a remote edge.
    pub fn add_remote_edge(&mut self, parent: NodeId, child: NodeId, tag: EdgeTag) -> Result<EdgeId, PassageError> {
        let id = self.allocate_edge_id();
        self.insert_edge(Edge::remote(id, parent, child, tag))
    }

    fn allocate_edge_id(&mut self) -> EdgeId {
        let id = EdgeId::new(self.next_edge);
        self.next_edge += 1;
        id
    }

    fn insert_edge(&mut self, edge: Edge) -> Result<EdgeId, PassageError> {
        self.check_attachable(edge.parent, edge.child)?;

        let id = edge.id;
        let (parent, child) = (edge.parent, edge.child);
        self.edges.insert(id, edge);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.incoming.push(id);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.outgoing.push(id);
        }
        self.resort_outgoing(parent);
        Ok(id)
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), PassageError> {
        if self.node_ref(parent)?.is_terminal() {
            return Err(PassageError::TerminalImmutable(parent));
        }
        self.node_ref(child)?;
        if self.reaches(child, parent) {
            return Err(PassageError::WouldCycle { parent, child });
        }
        Ok(())
    }

    /// Remove an edge from the table and from both endpoint lists.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, PassageError> {
        let edge = self.edges.remove(&id).ok_or(PassageError::EdgeNotFound(id))?;
        if let Some(node) = self.nodes.get_mut(&edge.parent) {
            node.outgoing.retain(|e| *e != id);
        }
        if let Some(node) = self.nodes.get_mut(&edge.child) {
            node.incoming.retain(|e| *e != id);
        }
        Ok(edge)
    }

    /// Move an edge to a new parent, keeping its id, child and tag.
    pub fn retarget_edge(&mut self, id: EdgeId, new_parent: NodeId) -> Result<(), PassageError> {
        let edge = self.edge_ref(id)?;
        let (old_parent, child) = (edge.parent, edge.child);
        if old_parent == new_parent {
            return Ok(());
        }
        self.check_attachable(new_parent, child)?;

        if let Some(node) = self.nodes.get_mut(&old_parent) {
            node.outgoing.retain(|e| *e != id);
        }
        if let Some(edge) = self.edges.get_mut(&id) {
            edge.parent = new_parent;
        }
        if let Some(node) = self.nodes.get_mut(&new_parent) {
            node.outgoing.push(id);
        }
        self.resort_outgoing(new_parent);
        Ok(())
    }

    /// Drop the suffix of an edge's tag.
    pub fn strip_suffix(&mut self, id: EdgeId) -> Result<(), PassageError> {
        let edge = self.edges.get_mut(&id).ok_or(PassageError::EdgeNotFound(id))?;
        edge.tag.strip();
        Ok(())
    }

    /// Re-sort a node's outgoing list into canonical order.
    pub fn resort_outgoing(&mut self, id: NodeId) {
        let edges = &self.edges;
        if let Some(node) = self.nodes.get_mut(&id) {
            ordering::sort_edge_ids(&mut node.outgoing, edges);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Outgoing edges of a node, in canonical order.
    pub fn outgoing_edges(&self, id: NodeId) -> Vec<&Edge> {
        self.nodes
            .get(&id)
            .map(|n| n.outgoing.iter().filter_map(|e| self.edges.get(e)).collect())
            .unwrap_or_default()
    }

    /// Incoming edges of a node.
    pub fn incoming_edges(&self, id: NodeId) -> Vec<&Edge> {
        self.nodes
            .get(&id)
            .map(|n| n.incoming.iter().filter_map(|e| self.edges.get(e)).collect())
            .unwrap_or_default()
    }

    /// Children in canonical order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.outgoing_edges(id).into_iter().map(|e| e.child).collect()
    }

    /// Children along primary edges, in canonical order.
    pub fn primary_children(&self, id: NodeId) -> Vec<NodeId> {
        self.outgoing_edges(id)
            .into_iter()
            .filter(|e| !e.remote)
            .map(|e| e.child)
            .collect()
    }

    /// Parents, in incoming-edge order.
    pub fn parents(&self, id: NodeId) -> Vec<NodeId> {
        self.incoming_edges(id).into_iter().map(|e| e.parent).collect()
    }

    /// Whether `to` can be reached from `from` along any edges.
    ///
    /// A node reaches itself.
    pub fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut seen = BTreeSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.outgoing.iter().filter_map(|e| self.edges.get(e)).map(|e| e.child));
            }
        }
        false
    }

    /// Positions of the terminals under a node, along primary edges, sorted.
    pub fn terminal_span(&self, id: NodeId) -> Vec<u32> {
        let mut positions = Vec::new();
        let mut stack = vec![id];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(node) = self.nodes.get(&current) else { continue };
            match &node.kind {
                NodeKind::Terminal(t) => positions.push(t.position),
                _ => stack.extend(self.primary_children(current)),
            }
        }
        positions.sort_unstable();
        positions
    }

    /// Position of the first terminal under a node, if any.
    pub fn first_terminal_position(&self, id: NodeId) -> Option<u32> {
        self.terminal_span(id).first().copied()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Validation and export
    // ─────────────────────────────────────────────────────────────────────

    /// Check that the passage is a finished, well-formed graph.
    ///
    /// - a root exists and has no parent
    /// - no cycles along any edges
    /// - every other node has exactly one primary parent
    /// - every node is reachable from the root along primary edges
    /// - no edge carries a `-down`/`-left` suffix, nor `-remote` unless
    ///   `allow_remote_suffix`
    pub fn validate(&self, allow_remote_suffix: bool) -> Result<(), PassageError> {
        let root = self.root.ok_or(PassageError::MissingRoot)?;
        if !self.node_ref(root)?.incoming.is_empty() {
            return Err(PassageError::RootHasParent(root));
        }

        self.check_acyclic()?;

        for node in self.nodes.values() {
            if node.id == root {
                continue;
            }
            let primary = self.incoming_edges(node.id).iter().filter(|e| !e.remote).count();
            match primary {
                0 => return Err(PassageError::DetachedNode(node.id)),
                1 => {}
                _ => return Err(PassageError::MultiplePrimaryParents(node.id)),
            }
        }

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            if visited.insert(current) {
                queue.extend(self.primary_children(current));
            }
        }
        if let Some(missing) = self.nodes.keys().find(|id| !visited.contains(id)) {
            return Err(PassageError::Unreachable(*missing));
        }

        for edge in self.edges.values() {
            let unresolved = match edge.tag.suffix {
                TagSuffix::None => false,
                TagSuffix::Remote => !allow_remote_suffix,
                TagSuffix::Down | TagSuffix::Left => true,
            };
            if unresolved {
                return Err(PassageError::UnresolvedSuffix {
                    edge: edge.id,
                    tag: edge.tag.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_acyclic(&self) -> Result<(), PassageError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Active,
            Done,
        }

        let mut marks: BTreeMap<NodeId, Mark> = BTreeMap::new();
        for &start in self.nodes.keys() {
            if marks.contains_key(&start) {
                continue;
            }
            // (node, entered) pairs; a node is finished when popped the second time
            let mut stack = vec![(start, false)];
            while let Some((current, entered)) = stack.pop() {
                if entered {
                    marks.insert(current, Mark::Done);
                    continue;
                }
                match marks.get(&current) {
                    Some(Mark::Done) => continue,
                    Some(Mark::Active) => return Err(PassageError::Cycle(current)),
                    None => {}
                }
                marks.insert(current, Mark::Active);
                stack.push((current, true));
                for child in self.children(current) {
                    match marks.get(&child) {
                        Some(Mark::Active) => return Err(PassageError::Cycle(child)),
                        Some(Mark::Done) => {}
                        None => stack.push((child, false)),
                    }
                }
            }
        }
        Ok(())
    }

    /// Node and edge listing in canonical order.
    pub fn export(&self) -> PassageExport {
        let nodes = self
            .nodes
            .values()
            .map(|node| {
                let terminal = node.as_terminal();
                NodeExport {
                    id: node.id.to_string(),
                    kind: node.kind.name().to_string(),
                    position: terminal.map(|t| t.position),
                    text: terminal.map(|t| t.text.clone()),
                    punctuation: terminal.map(|t| t.is_punctuation),
                }
            })
            .collect();

        let edges = self
            .nodes
            .keys()
            .flat_map(|id| self.outgoing_edges(*id))
            .map(|edge| EdgeExport {
                parent: edge.parent.to_string(),
                child: edge.child.to_string(),
                tag: edge.tag.to_string(),
                remote: edge.remote,
            })
            .collect();

        PassageExport {
            passage_id: self.id.clone(),
            schema_version: crate::PASSAGE_GRAPH_SCHEMA_VERSION.to_string(),
            root: self.root.map(|r| r.to_string()),
            nodes,
            edges,
        }
    }

    /// Fingerprint of the exported graph.
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(&self.export())
    }

    /// Bracketed rendering of the foundational layer.
    ///
    /// Constituents print as `[TAG ...]`, terminals as their text, remote
    /// edges as `[TAG* id]`.
    pub fn linearize(&self) -> String {
        let Some(root) = self.root else {
            return String::new();
        };

        let mut out = String::new();
        let mut stack = Vec::new();
        self.push_linearized_children(root, &mut stack);
        while let Some(step) = stack.pop() {
            let edge = match step {
                LinearStep::Text(text) => {
                    out.push_str(text);
                    continue;
                }
                LinearStep::Edge(edge) => edge,
            };
            if edge.remote {
                out.push_str(&format!("[{}* {}]", edge.tag, edge.child));
                continue;
            }
            match self.nodes.get(&edge.child).map(|n| &n.kind) {
                Some(NodeKind::Terminal(t)) => out.push_str(&t.text),
                _ => {
                    out.push_str(&format!("[{} ", edge.tag));
                    stack.push(LinearStep::Text("]"));
                    self.push_linearized_children(edge.child, &mut stack);
                }
            }
        }
        out
    }

    /// Push a node's outgoing edges so they pop in canonical order,
    /// separated by single spaces.
    fn push_linearized_children<'a>(&'a self, id: NodeId, stack: &mut Vec<LinearStep<'a>>) {
        for (i, edge) in self.outgoing_edges(id).into_iter().enumerate().rev() {
            stack.push(LinearStep::Edge(edge));
            if i > 0 {
                stack.push(LinearStep::Text(" "));
            }
        }
    }
}

enum LinearStep<'a> {
    Edge(&'a Edge),
    Text(&'static str),
}

/// Exported node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeExport {
    /// `layer.index` id.
    pub id: String,
    /// Node kind name.
    pub kind: String,
    /// Terminal position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Terminal text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Terminal punctuation flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punctuation: Option<bool>,
}

/// Exported edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeExport {
    /// Parent id.
    pub parent: String,
    /// Child id.
    pub child: String,
    /// Tag text.
    pub tag: String,
    /// Remote attachment.
    pub remote: bool,
}

/// Serializable snapshot of a passage for downstream writers.
///
/// Nodes are listed by id; edges by parent id, then in each parent's
/// canonical outgoing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageExport {
    /// Passage id.
    pub passage_id: String,
    /// Schema version.
    pub schema_version: String,
    /// Root id.
    pub root: Option<String>,
    /// Nodes.
    pub nodes: Vec<NodeExport>,
    /// Edges.
    pub edges: Vec<EdgeExport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ConvertPolicy;

    fn passage_with_terminals(words: &[&str]) -> Passage {
        let mut passage = Passage::new("test");
        for w in words {
            passage.add_terminal(*w, *w == ".").unwrap();
        }
        passage
    }

    #[test]
    fn test_from_tokens_checks_positions() {
        let classifier = ConvertPolicy::default().punctuation_classifier().unwrap();
        let tokens = vec![Token::new(1, "Hi", "INTJ"), Token::new(2, "!", "PUNCT")];
        let passage = Passage::from_tokens("p", &tokens, &classifier).unwrap();
        let terminals: Vec<_> = passage.terminals().collect();
        assert_eq!(terminals.len(), 2);
        assert!(!terminals[0].is_punctuation);
        assert!(terminals[1].is_punctuation);

        let gap = vec![Token::new(1, "Hi", "INTJ"), Token::new(3, "!", "PUNCT")];
        assert_eq!(
            Passage::from_tokens("p", &gap, &classifier),
            Err(PassageError::NonContiguousPosition { expected: 2, found: 3 })
        );
    }

    #[test]
    fn test_edge_lists_stay_symmetric() {
        let mut passage = passage_with_terminals(&["a", "b"]);
        let root = passage.create_root().unwrap();
        let x = passage.add_foundational();
        let e1 = passage.add_edge(root, x, EdgeTag::new("A")).unwrap();
        let e2 = passage.add_edge(x, NodeId::terminal(2), EdgeTag::new("Terminal")).unwrap();
        let e3 = passage.add_edge(x, NodeId::terminal(1), EdgeTag::new("Terminal")).unwrap();

        // Terminal 1 sorts before terminal 2 despite insertion order
        assert_eq!(passage.node(x).unwrap().outgoing(), &[e3, e2]);
        assert_eq!(passage.node(x).unwrap().incoming(), &[e1]);

        passage.remove_edge(e2).unwrap();
        assert_eq!(passage.node(x).unwrap().outgoing(), &[e3]);
        assert!(passage.node(NodeId::terminal(2)).unwrap().incoming().is_empty());
        assert_eq!(passage.remove_edge(e2), Err(PassageError::EdgeNotFound(e2)));
    }

    #[test]
    fn test_terminals_cannot_have_children() {
        let mut passage = passage_with_terminals(&["a", "b"]);
        let err = passage
            .add_edge(NodeId::terminal(1), NodeId::terminal(2), EdgeTag::new("X"))
            .unwrap_err();
        assert_eq!(err, PassageError::TerminalImmutable(NodeId::terminal(1)));
        assert!(passage.remove_node(NodeId::terminal(1)).is_err());
    }

    #[test]
    fn test_terminal_layer_sealed_after_root() {
        let mut passage = passage_with_terminals(&["a"]);
        let root = passage.create_root().unwrap();
        passage.add_edge(root, NodeId::terminal(1), EdgeTag::new("Terminal")).unwrap();

        assert_eq!(passage.add_terminal("b", false), Err(PassageError::TerminalLayerSealed));
        assert_eq!(passage.num_terminals(), 1);
        assert!(passage.validate(false).is_ok());
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut passage = Passage::new("p");
        let root = passage.create_root().unwrap();
        let a = passage.add_foundational();
        let b = passage.add_foundational();
        passage.add_edge(root, a, EdgeTag::new("A")).unwrap();
        let ab = passage.add_edge(a, b, EdgeTag::new("B")).unwrap();

        assert_eq!(
            passage.add_edge(b, a, EdgeTag::new("C")),
            Err(PassageError::WouldCycle { parent: b, child: a })
        );
        assert_eq!(
            passage.add_edge(b, b, EdgeTag::new("C")),
            Err(PassageError::WouldCycle { parent: b, child: b })
        );
        // Moving a->b under b itself is a self-loop
        assert!(passage.retarget_edge(ab, b).is_err());
        assert!(passage.validate(false).is_ok());
    }

    #[test]
    fn test_retarget_keeps_id_and_child() {
        let mut passage = passage_with_terminals(&["a"]);
        let root = passage.create_root().unwrap();
        let p = passage.add_foundational();
        let n = passage.add_foundational();
        passage.add_edge(root, p, EdgeTag::new("P")).unwrap();
        let e = passage.add_edge(p, n, EdgeTag::parse("X-down")).unwrap();
        passage.add_edge(n, NodeId::terminal(1), EdgeTag::new("Terminal")).unwrap();

        passage.retarget_edge(e, root).unwrap();
        passage.strip_suffix(e).unwrap();

        let edge = passage.edge(e).unwrap();
        assert_eq!(edge.parent, root);
        assert_eq!(edge.child, n);
        assert_eq!(edge.tag.to_string(), "X");
        assert!(passage.children(p).is_empty());
        assert_eq!(passage.children(root), vec![p, n]);
        assert_eq!(passage.node(n).unwrap().incoming(), &[e]);
    }

    #[test]
    fn test_insert_node_reuses_id() {
        let mut passage = Passage::new("p");
        let root = passage.create_root().unwrap();
        let x = passage.add_foundational();
        passage.add_edge(root, x, EdgeTag::new("U")).unwrap();

        let (old, removed) = passage.remove_node(x).unwrap();
        assert_eq!(old.id, x);
        assert_eq!(removed.len(), 1);
        assert!(passage.children(root).is_empty());

        passage.insert_node(x, NodeKind::Punctuation).unwrap();
        assert!(passage.node(x).unwrap().is_punctuation_node());
        assert_eq!(passage.insert_node(x, NodeKind::Foundational), Err(PassageError::NodeExists(x)));

        // Fresh ids never collide with reinserted ones
        let y = passage.add_foundational();
        assert!(y > x);
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut passage = passage_with_terminals(&["a", "b"]);
        assert_eq!(passage.validate(false), Err(PassageError::MissingRoot));

        let root = passage.create_root().unwrap();
        passage.add_edge(root, NodeId::terminal(1), EdgeTag::new("Terminal")).unwrap();
        assert_eq!(passage.validate(false), Err(PassageError::DetachedNode(NodeId::terminal(2))));

        let e = passage.add_edge(root, NodeId::terminal(2), EdgeTag::parse("Terminal-left")).unwrap();
        assert!(matches!(passage.validate(false), Err(PassageError::UnresolvedSuffix { edge, .. }) if edge == e));

        passage.strip_suffix(e).unwrap();
        assert_eq!(passage.validate(false), Ok(()));
    }

    #[test]
    fn test_remote_suffix_allowance() {
        let mut passage = passage_with_terminals(&["a"]);
        let root = passage.create_root().unwrap();
        let x = passage.add_foundational();
        passage.add_edge(root, x, EdgeTag::parse("A-remote")).unwrap();
        passage.add_edge(x, NodeId::terminal(1), EdgeTag::new("Terminal")).unwrap();

        assert!(passage.validate(false).is_err());
        assert!(passage.validate(true).is_ok());
    }

    #[test]
    fn test_terminal_span_and_first_position() {
        let mut passage = passage_with_terminals(&["a", "b", "c"]);
        let root = passage.create_root().unwrap();
        let x = passage.add_foundational();
        passage.add_edge(root, x, EdgeTag::new("A")).unwrap();
        passage.add_edge(x, NodeId::terminal(3), EdgeTag::new("Terminal")).unwrap();
        passage.add_edge(x, NodeId::terminal(2), EdgeTag::new("Terminal")).unwrap();
        passage.add_edge(root, NodeId::terminal(1), EdgeTag::new("Terminal")).unwrap();

        assert_eq!(passage.terminal_span(x), vec![2, 3]);
        assert_eq!(passage.first_terminal_position(root), Some(1));
        let empty = passage.add_foundational();
        assert_eq!(passage.first_terminal_position(empty), None);
    }

    #[test]
    fn test_linearize_and_fingerprint() {
        let mut passage = passage_with_terminals(&["John", "left", "."]);
        let root = passage.create_root().unwrap();
        let a = passage.add_foundational();
        let u = passage.add_foundational();
        passage.add_edge(root, a, EdgeTag::new("A")).unwrap();
        passage.add_edge(root, u, EdgeTag::new("U")).unwrap();
        passage.add_edge(a, NodeId::terminal(1), EdgeTag::new("Terminal")).unwrap();
        passage.add_edge(a, NodeId::terminal(2), EdgeTag::new("Terminal")).unwrap();
        passage.add_edge(u, NodeId::terminal(3), EdgeTag::new("Terminal")).unwrap();

        assert_eq!(passage.linearize(), "[A John left] [U .]");

        let copy = passage.clone();
        assert_eq!(passage.fingerprint(), copy.fingerprint());

        passage.add_remote_edge(u, NodeId::terminal(1), EdgeTag::new("R")).unwrap();
        // Terminal children order by position, remote or not
        assert_eq!(passage.linearize(), "[A John left] [U [R* 0.1] .]");
        assert_ne!(passage.fingerprint(), copy.fingerprint());
    }
}
