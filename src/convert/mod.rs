//! Graph Converter: derivation tree → annotation graph.
//!
//! ## Passes
//!
//! ```text
//! DerivationTree → Tree Builder → Punctuation Collapser → Discontinuity Resolver → Remote Edge Restorer
//!                        ↓
//!                Passage (terminal layer supplied by the caller)
//! ```
//!
//! Each pass mutates the graph left by the previous one. The passes run on
//! a working copy that replaces the caller's passage only when every pass
//! and the final validation succeed.

pub mod builder;
pub mod punctuation;
pub mod discontinuity;
pub mod remote;

use crate::passage::{Passage, PassageError};
use crate::policy::{ConvertPolicy, PolicyError};
use crate::types::{ConversionReport, DerivationTree, EdgeId, NodeId, Token};

pub use builder::{build_tree, LeafCursor};
pub use discontinuity::resolve_discontinuities;
pub use punctuation::collapse_punctuation;
pub use remote::restore_remote_edges;

/// Error type for conversion.
///
/// Every variant aborts the current passage only; batch callers decide
/// whether to skip it or stop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    /// Tree leaves and terminals do not pair up.
    #[error("Structural mismatch in passage {passage_id}: tree has {leaves} leaves, passage has {terminals} terminals")]
    StructuralMismatch {
        /// Passage id.
        passage_id: String,
        /// Leaves in the tree.
        leaves: usize,
        /// Terminals in the passage.
        terminals: usize,
    },
    /// A move would have made the graph cyclic.
    #[error("Cycle violation: edge {edge} cannot attach {child} under its descendant {parent}")]
    CycleViolation {
        /// Edge being moved or added.
        edge: EdgeId,
        /// Proposed parent.
        parent: NodeId,
        /// Child.
        child: NodeId,
    },
    /// The tree is a bare leaf.
    #[error("Tree for passage {0} has a leaf at the top")]
    RootIsLeaf(String),
    /// The passage already has a foundational layer.
    #[error("Passage {0} already has a foundational layer")]
    AlreadyConverted(String),
    /// Graph operation failed.
    #[error("Graph error: {0}")]
    Passage(#[from] PassageError),
    /// Policy is unusable.
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),
}

/// Runs the four passes over one passage at a time.
///
/// Holds only the read-only policy, so one converter can serve many
/// passages, from many threads.
#[derive(Debug, Clone, Default)]
pub struct GraphConverter {
    policy: ConvertPolicy,
}

impl GraphConverter {
    /// Create a converter.
    pub fn new(policy: ConvertPolicy) -> Self {
        Self { policy }
    }

    /// Get the policy.
    pub fn policy(&self) -> &ConvertPolicy {
        &self.policy
    }

    /// Populate the foundational layer of `passage` from `tree`.
    ///
    /// On error the passage is left exactly as it was.
    pub fn convert(&self, passage: &mut Passage, tree: &DerivationTree) -> Result<ConversionReport, ConvertError> {
        let _span = tracing::debug_span!("convert_passage", passage_id = passage.id()).entered();

        let mut report = ConversionReport::new(passage.id(), self.policy.params_hash());
        let mut work = passage.clone();

        let root = build_tree(&mut work, tree, &self.policy, &mut report)?;
        report.root = Some(root);
        report.collapsed = collapse_punctuation(&mut work)?;
        resolve_discontinuities(&mut work, &self.policy, &mut report)?;
        restore_remote_edges(&mut work, &self.policy, &mut report)?;

        let unresolved_remotes = !report.warnings_of("unsupported_remote").is_empty();
        work.validate(unresolved_remotes)?;

        report.finish(work.fingerprint());
        tracing::debug!(
            passage_id = work.id(),
            nodes = work.num_nodes(),
            edges = work.num_edges(),
            collapsed = report.collapsed.len(),
            relocations = report.relocations.len(),
            warnings = report.warnings.len(),
            fingerprint = %report.fingerprint,
            "Converted passage"
        );

        *passage = work;
        Ok(report)
    }

    /// Build a passage from tokens and convert it in one step.
    pub fn convert_tokens(
        &self,
        passage_id: impl Into<String>,
        tokens: &[Token],
        tree: &DerivationTree,
    ) -> Result<(Passage, ConversionReport), ConvertError> {
        let classifier = self.policy.punctuation_classifier()?;
        let mut passage = Passage::from_tokens(passage_id, tokens, &classifier)?;
        let report = self.convert(&mut passage, tree)?;
        Ok((passage, report))
    }
}
