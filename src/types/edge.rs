//! Edge types for the annotation graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::node::NodeId;

/// Identifier of an edge in a passage's edge table.
///
/// Edge ids are never reused and survive relocation, so they serve as the
/// final tie-break of the canonical ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(u64);

impl EdgeId {
    /// Create an edge id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Positional suffix carried by a parser-emitted tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum TagSuffix {
    /// Plain relation label.
    #[default]
    None,
    /// Child attaches one level higher (`-down`).
    Down,
    /// Child attaches to its nearest left sibling (`-left`).
    Left,
    /// Child has an additional remote parent (`-remote`).
    Remote,
}

impl TagSuffix {
    /// Parse suffix text without the leading dash.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "remote" => Some(Self::Remote),
            _ => None,
        }
    }

    /// Suffix text including the leading dash, empty for `None`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Down => "-down",
            Self::Left => "-left",
            Self::Remote => "-remote",
        }
    }

    /// Suffixes that request a structural move.
    pub fn is_positional(&self) -> bool {
        matches!(self, Self::Down | Self::Left)
    }
}

impl fmt::Display for TagSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relation tag of an edge.
///
/// The suffix is split off once when the tag is first materialized, so a
/// label that merely contains `down` or `left` is never mistaken for one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeTag {
    /// Semantic relation label.
    pub label: String,
    /// Pending positional suffix.
    pub suffix: TagSuffix,
}

impl EdgeTag {
    /// Plain tag with no suffix.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            suffix: TagSuffix::None,
        }
    }

    /// Tag with an explicit suffix.
    pub fn with_suffix(label: impl Into<String>, suffix: TagSuffix) -> Self {
        Self {
            label: label.into(),
            suffix,
        }
    }

    /// Parse a parser label such as `A-down`.
    ///
    /// Only an exact trailing `-down`, `-left` or `-remote` is recognised,
    /// and only when a non-empty label precedes it.
    pub fn parse(raw: &str) -> Self {
        if let Some((label, suffix)) = raw.rsplit_once('-') {
            if !label.is_empty() {
                if let Some(suffix) = TagSuffix::from_str(suffix) {
                    return Self::with_suffix(label, suffix);
                }
            }
        }
        Self::new(raw)
    }

    /// Drop the suffix.
    pub fn strip(&mut self) {
        self.suffix = TagSuffix::None;
    }

    /// Whether a suffix is still pending.
    pub fn has_suffix(&self) -> bool {
        self.suffix != TagSuffix::None
    }
}

impl fmt::Display for EdgeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.label, self.suffix)
    }
}

/// Edge in the annotation graph.
///
/// Represents a directed connection from parent to child. The parent lists
/// the edge among its outgoing edges, the child among its incoming edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Edge id.
    pub id: EdgeId,
    /// Parent node (source).
    pub parent: NodeId,
    /// Child node (target).
    pub child: NodeId,
    /// Relation tag.
    pub tag: EdgeTag,
    /// Remote (non-primary) attachment.
    pub remote: bool,
}

impl Edge {
    /// Create a primary edge.
    pub fn new(id: EdgeId, parent: NodeId, child: NodeId, tag: EdgeTag) -> Self {
        Self {
            id,
            parent,
            child,
            tag,
            remote: false,
        }
    }

    /// Create a remote edge.
    pub fn remote(id: EdgeId, parent: NodeId, child: NodeId, tag: EdgeTag) -> Self {
        Self {
            id,
            parent,
            child,
            tag,
            remote: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(EdgeTag::parse("A-down"), EdgeTag::with_suffix("A", TagSuffix::Down));
        assert_eq!(EdgeTag::parse("E-left"), EdgeTag::with_suffix("E", TagSuffix::Left));
        assert_eq!(EdgeTag::parse("A-remote"), EdgeTag::with_suffix("A", TagSuffix::Remote));
        assert_eq!(EdgeTag::parse("P"), EdgeTag::new("P"));
    }

    #[test]
    fn test_parse_ignores_embedded_words() {
        // Substrings are not suffixes
        assert_eq!(EdgeTag::parse("Lowdown"), EdgeTag::new("Lowdown"));
        assert_eq!(EdgeTag::parse("leftover"), EdgeTag::new("leftover"));
        assert_eq!(EdgeTag::parse("-down"), EdgeTag::new("-down"));
        assert_eq!(EdgeTag::parse("A-sideways"), EdgeTag::new("A-sideways"));
        // Only the last dash counts
        assert_eq!(
            EdgeTag::parse("Multi-word-left"),
            EdgeTag::with_suffix("Multi-word", TagSuffix::Left)
        );
    }

    #[test]
    fn test_strip_and_display() {
        let mut tag = EdgeTag::parse("C-down");
        assert_eq!(tag.to_string(), "C-down");
        assert!(tag.has_suffix());
        assert!(tag.suffix.is_positional());

        tag.strip();
        assert_eq!(tag.to_string(), "C");
        assert!(!tag.has_suffix());
    }
}
