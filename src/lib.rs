//! # passage-graph
//!
//! Deterministic conversion of parser derivation trees into semantic
//! annotation graphs.
//!
//! The converter answers one question:
//!
//! > Given a labeled derivation tree and the sentence's terminals, what is
//! > the **annotation graph** the tree encodes?
//!
//! ## Core Contract
//!
//! 1. Bind every tree leaf to exactly one terminal, left to right
//! 2. Collapse all-punctuation constituents into punctuation nodes, keeping ids
//! 3. Apply the structural moves encoded by `-down`/`-left` tag suffixes
//! 4. Turn `-remote` edges into multi-parent attachments
//!
//! ## Architecture
//!
//! ```text
//! DerivationTree → Tree Builder → Punctuation → Discontinuity → Remote → Passage
//!                                                                          ↓
//!                                                            PassageExport → fingerprint
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same tree + same terminals + same policy → identical fingerprint
//! - Outgoing edges are ordered canonically (child id, remote, edge id)
//! - Node ids are stable across every pass

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod ordering;
pub mod passage;
pub mod policy;
pub mod convert;
pub mod batch;
pub mod canonical;
pub mod logging;

// Re-exports
pub use types::{
    Layer, NodeId, Terminal, NodeKind, Node,
    EdgeId, TagSuffix, EdgeTag, Edge,
    DerivationTree, TreeParseError, Token,
    ConversionReport, ConversionWarning, RelocationRecord, SkipReason, RemoteIssue,
};
pub use ordering::{edge_order_key, compare_edges};
pub use passage::{Passage, PassageError, PassageExport, NodeExport, EdgeExport};
pub use policy::{ConvertPolicy, RemotePolicy, CyclePolicy, PolicyError, PunctuationClassifier};
pub use convert::{GraphConverter, ConvertError, LeafCursor};
pub use batch::{
    BatchConverter, BatchResult, BatchFailure, ConversionJob, ConvertedPassage,
    PassageRegistry, PassageRegistryEntry,
};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};
pub use logging::{init_tracing, LogFormat};

/// Schema version of exported passages.
/// Increment on breaking changes to the export format.
pub const PASSAGE_GRAPH_SCHEMA_VERSION: &str = "1.0.0";

/// Default policy version identifier.
pub const DEFAULT_POLICY_VERSION: &str = "convert_policy_v1";
