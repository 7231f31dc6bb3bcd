//! Core types for the passage graph.

pub mod node;
pub mod edge;
pub mod tree;
pub mod token;
pub mod report;

pub use node::{Layer, NodeId, Terminal, NodeKind, Node};
pub use edge::{EdgeId, TagSuffix, EdgeTag, Edge};
pub use tree::{DerivationTree, TreeParseError};
pub use token::Token;
pub use report::{
    ConversionReport, ConversionWarning, RelocationRecord, SkipReason, RemoteIssue,
};
