//! Conversion outcomes that are recorded rather than raised.
//!
//! ## Warning Types
//!
//! | Warning | Raised by | Effect on graph |
//! |---------|-----------|-----------------|
//! | `LabelMismatch` | Tree Builder | none, conversion continues |
//! | `TokenMismatch` | Tree Builder | none, leaf bound by position |
//! | `RelocationSkipped` | Discontinuity Resolver | tag stripped, topology kept |
//! | `UnsupportedRemote` | Remote Edge Restorer | edge kept with its suffix |
//!
//! Every warning is logged through `tracing` when recorded, and the
//! whole report serializes to JSON for batch manifests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::edge::{EdgeId, TagSuffix};
use super::node::NodeId;

/// Why a `-down`/`-left` move was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The child already has more than one parent.
    MultiParentChild,
    /// The encoded parent does not have exactly one parent.
    MultiParentAncestor,
    /// The encoded parent is the root.
    NoGrandparent,
    /// The child is the leftmost of its siblings.
    LeftmostSibling,
    /// The left neighbour cannot take children.
    NeighborNotFoundational,
    /// The move would make the graph cyclic.
    WouldCreateCycle,
    /// The edge is a remote attachment, so the child has no sibling order
    /// under that parent.
    NotPrimaryChild,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultiParentChild => write!(f, "multi_parent_child"),
            Self::MultiParentAncestor => write!(f, "multi_parent_ancestor"),
            Self::NoGrandparent => write!(f, "no_grandparent"),
            Self::LeftmostSibling => write!(f, "leftmost_sibling"),
            Self::NeighborNotFoundational => write!(f, "neighbor_not_foundational"),
            Self::WouldCreateCycle => write!(f, "would_create_cycle"),
            Self::NotPrimaryChild => write!(f, "not_primary_child"),
        }
    }
}

/// Why a `-remote` edge was left unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteIssue {
    /// Restoration is disabled by policy.
    NotRestored,
    /// The encoded parent has no single parent to take the remote edge.
    NoSingleGrandparent,
    /// The remote edge would make the graph cyclic.
    WouldCreateCycle,
}

/// Outcome of one positional-suffix edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationRecord {
    /// Edge that carried the suffix.
    pub edge: EdgeId,
    /// Child of the edge.
    pub child: NodeId,
    /// Suffix that was resolved.
    pub suffix: TagSuffix,
    /// Parent before resolution.
    pub from: NodeId,
    /// Parent after the move, `None` when skipped.
    pub to: Option<NodeId>,
    /// Reason for skipping, `None` when moved.
    pub skipped: Option<SkipReason>,
}

impl RelocationRecord {
    /// Whether the structural move happened.
    pub fn moved(&self) -> bool {
        self.to.is_some()
    }
}

/// Non-fatal condition recorded during conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversionWarning {
    /// Top tree label differs from the expected root marker.
    LabelMismatch {
        /// Expected root label.
        expected: String,
        /// Label found at the top of the tree.
        found: String,
    },
    /// A leaf's printed text differs from the terminal it was bound to.
    TokenMismatch {
        /// Terminal position.
        position: u32,
        /// Text printed at the leaf.
        leaf: String,
        /// Terminal text.
        terminal: String,
    },
    /// A positional move's precondition was not met.
    RelocationSkipped {
        /// Edge that carried the suffix.
        edge: EdgeId,
        /// Child of the edge.
        child: NodeId,
        /// Suffix that was stripped.
        suffix: TagSuffix,
        /// Why the move was skipped.
        reason: SkipReason,
    },
    /// A `-remote` edge could not be turned into a remote attachment.
    UnsupportedRemote {
        /// The edge.
        edge: EdgeId,
        /// Encoded parent.
        parent: NodeId,
        /// Child.
        child: NodeId,
        /// Relation label without suffix.
        label: String,
        /// Why it stayed unresolved.
        reason: RemoteIssue,
    },
}

impl ConversionWarning {
    /// Short machine-readable name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LabelMismatch { .. } => "label_mismatch",
            Self::TokenMismatch { .. } => "token_mismatch",
            Self::RelocationSkipped { .. } => "relocation_skipped",
            Self::UnsupportedRemote { .. } => "unsupported_remote",
        }
    }

    /// Log this warning as a structured event.
    pub fn log(&self, passage_id: &str) {
        match self {
            Self::LabelMismatch { expected, found } => tracing::warn!(
                passage_id,
                expected = %expected,
                found = %found,
                "LABEL_MISMATCH: top label is not the root marker, continuing"
            ),
            Self::TokenMismatch { position, leaf, terminal } => tracing::warn!(
                passage_id,
                position,
                leaf = %leaf,
                terminal = %terminal,
                "TOKEN_MISMATCH: leaf text differs from terminal"
            ),
            Self::RelocationSkipped { edge, child, suffix, reason } => tracing::info!(
                passage_id,
                edge = %edge,
                child = %child,
                suffix = %suffix,
                reason = %reason,
                "RELOCATION_SKIPPED: tag stripped, topology kept"
            ),
            Self::UnsupportedRemote { edge, parent, child, label, reason } => tracing::warn!(
                passage_id,
                edge = %edge,
                parent = %parent,
                child = %child,
                label = %label,
                reason = ?reason,
                "UNSUPPORTED_REMOTE: remote edge left unresolved"
            ),
        }
    }
}

/// Everything recorded while converting one passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Passage that was converted.
    pub passage_id: String,
    /// Hash of the policy parameters in effect.
    pub policy_params_hash: String,
    /// When the conversion was committed; creation time until then.
    pub converted_at: DateTime<Utc>,
    /// Root node of the new layer.
    pub root: Option<NodeId>,
    /// Nodes replaced by punctuation nodes (same ids).
    pub collapsed: Vec<NodeId>,
    /// One record per positional-suffix edge.
    pub relocations: Vec<RelocationRecord>,
    /// Remote edges added by the restorer.
    pub restored_remotes: Vec<EdgeId>,
    /// Non-fatal warnings, in the order they were raised.
    pub warnings: Vec<ConversionWarning>,
    /// Fingerprint of the converted graph.
    pub fingerprint: String,
}

impl ConversionReport {
    /// Empty report for a passage.
    pub fn new(passage_id: impl Into<String>, policy_params_hash: impl Into<String>) -> Self {
        Self {
            passage_id: passage_id.into(),
            policy_params_hash: policy_params_hash.into(),
            converted_at: Utc::now(),
            root: None,
            collapsed: Vec::new(),
            relocations: Vec::new(),
            restored_remotes: Vec::new(),
            warnings: Vec::new(),
            fingerprint: String::new(),
        }
    }

    /// Stamp the fingerprint and commit time of a finished conversion.
    pub fn finish(&mut self, fingerprint: String) {
        self.fingerprint = fingerprint;
        self.converted_at = Utc::now();
    }

    /// Record and log a warning.
    pub fn warn(&mut self, warning: ConversionWarning) {
        warning.log(&self.passage_id);
        self.warnings.push(warning);
    }

    /// Whether anything was recorded as a warning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind.
    pub fn warnings_of(&self, kind: &str) -> Vec<&ConversionWarning> {
        self.warnings.iter().filter(|w| w.kind() == kind).collect()
    }

    /// Relocations whose move was skipped.
    pub fn skipped_relocations(&self) -> impl Iterator<Item = &RelocationRecord> {
        self.relocations.iter().filter(|r| !r.moved())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_serialization() {
        let w = ConversionWarning::LabelMismatch {
            expected: "ROOT".to_string(),
            found: "S".to_string(),
        };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["type"], "label_mismatch");
        assert_eq!(json["found"], "S");
    }

    #[test]
    fn test_report_filters() {
        let mut report = ConversionReport::new("p1", "hash");
        report.warn(ConversionWarning::TokenMismatch {
            position: 2,
            leaf: "a".to_string(),
            terminal: "b".to_string(),
        });
        report.relocations.push(RelocationRecord {
            edge: EdgeId::new(1),
            child: NodeId::foundational(3),
            suffix: TagSuffix::Left,
            from: NodeId::foundational(2),
            to: None,
            skipped: Some(SkipReason::LeftmostSibling),
        });

        assert!(report.has_warnings());
        assert_eq!(report.warnings_of("token_mismatch").len(), 1);
        assert!(report.warnings_of("label_mismatch").is_empty());
        assert_eq!(report.skipped_relocations().count(), 1);
    }

    #[test]
    fn test_finish_stamps_commit_time() {
        let mut report = ConversionReport::new("p1", "hash");
        let created = report.converted_at;

        report.finish("00000000deadbeef".to_string());

        assert_eq!(report.fingerprint, "00000000deadbeef");
        assert!(report.converted_at >= created);
    }
}
