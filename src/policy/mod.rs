//! Conversion policies.

pub mod v1;
pub mod punctuation;

pub use v1::{ConvertPolicy, RemotePolicy, CyclePolicy, PolicyError};
pub use punctuation::PunctuationClassifier;
