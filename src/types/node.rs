//! Node types for the annotation graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::edge::EdgeId;

/// Annotation layer a node belongs to.
///
/// Terminals order before foundational nodes, which is what makes
/// terminal children print ahead of constituent children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Token layer (`0.*`).
    Terminal,
    /// Constituent layer (`1.*`).
    Foundational,
}

impl Layer {
    /// Numeric layer prefix used in node identifiers.
    pub fn number(&self) -> u8 {
        match self {
            Self::Terminal => 0,
            Self::Foundational => 1,
        }
    }
}

/// Stable identifier of a node in a passage.
///
/// Rendered as `layer.index`, e.g. `0.3` for the third terminal and
/// `1.1` for the root. Implements `Ord` for deterministic ordering:
/// (layer, index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId {
    layer: Layer,
    index: u32,
}

impl NodeId {
    /// Identifier of the terminal at a 1-based position.
    pub fn terminal(position: u32) -> Self {
        Self {
            layer: Layer::Terminal,
            index: position,
        }
    }

    /// Identifier of a foundational node.
    pub fn foundational(index: u32) -> Self {
        Self {
            layer: Layer::Foundational,
            index,
        }
    }

    /// Layer of the node.
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Index within the layer.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Parse from the `layer.index` form.
    pub fn from_str(s: &str) -> Option<Self> {
        let (layer, index) = s.split_once('.')?;
        let index: u32 = index.parse().ok()?;
        match layer {
            "0" => Some(Self::terminal(index)),
            "1" => Some(Self::foundational(index)),
            _ => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.layer.number(), self.index)
    }
}

/// Leaf node bound to one input token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal {
    /// 1-based position in the sentence.
    pub position: u32,
    /// Surface text.
    pub text: String,
    /// Whether the token is punctuation.
    pub is_punctuation: bool,
}

/// What a node represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Token leaf.
    Terminal(Terminal),
    /// Linguistic constituent.
    Foundational,
    /// Constituent made purely of punctuation.
    Punctuation,
}

impl NodeKind {
    /// Short name used in exports and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Terminal(_) => "terminal",
            Self::Foundational => "foundational",
            Self::Punctuation => "punctuation",
        }
    }
}

/// Node in the passage arena.
///
/// Edges are referenced by id; the edge records themselves live in the
/// passage's edge table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Stable identifier.
    pub id: NodeId,
    /// Node kind.
    pub kind: NodeKind,
    /// Outgoing edges, kept sorted by [`crate::ordering`].
    pub(crate) outgoing: Vec<EdgeId>,
    /// Incoming edges. More than one only for remote attachments.
    pub(crate) incoming: Vec<EdgeId>,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    /// Outgoing edge ids in canonical order.
    pub fn outgoing(&self) -> &[EdgeId] {
        &self.outgoing
    }

    /// Incoming edge ids.
    pub fn incoming(&self) -> &[EdgeId] {
        &self.incoming
    }

    /// Terminal payload, if this is a terminal.
    pub fn as_terminal(&self) -> Option<&Terminal> {
        match &self.kind {
            NodeKind::Terminal(t) => Some(t),
            _ => None,
        }
    }

    /// True for terminals.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal(_))
    }

    /// True for punctuation terminals.
    pub fn is_punctuation_terminal(&self) -> bool {
        self.as_terminal().map(|t| t.is_punctuation).unwrap_or(false)
    }

    /// True for foundational nodes (not terminals, not punctuation nodes).
    pub fn is_foundational(&self) -> bool {
        matches!(self.kind, NodeKind::Foundational)
    }

    /// True for punctuation nodes.
    pub fn is_punctuation_node(&self) -> bool {
        matches!(self.kind, NodeKind::Punctuation)
    }
}
