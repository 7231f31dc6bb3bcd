//! ConvertPolicy v1: knobs for the tree-to-graph conversion.
//!
//! The policy is stamped into every report through `params_hash`, so two
//! conversions of the same input are only comparable when their hashes
//! match.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::DEFAULT_POLICY_VERSION;
use super::punctuation::PunctuationClassifier;

/// Error type for invalid policy values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// The punctuation pattern does not compile.
    #[error("Invalid punctuation pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },
    /// An enum-valued setting could not be parsed.
    #[error("Invalid value `{value}` for {setting}")]
    InvalidValue {
        /// Setting name.
        setting: &'static str,
        /// Offending value.
        value: String,
    },
    /// JSON could not be parsed.
    #[error("Invalid policy JSON: {0}")]
    Json(String),
}

/// What to do with `-remote` edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RemotePolicy {
    /// Keep the encoded parent as primary and add a remote edge from its parent.
    #[default]
    Restore,
    /// Leave every `-remote` edge untouched and report it.
    Report,
}

impl RemotePolicy {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "restore" => Some(Self::Restore),
            "report" => Some(Self::Report),
            _ => None,
        }
    }
}

/// What to do when a relocation would create a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Reject the move, strip the tag, keep going.
    #[default]
    Skip,
    /// Fail the passage.
    Abort,
}

impl CyclePolicy {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "skip" => Some(Self::Skip),
            "abort" => Some(Self::Abort),
            _ => None,
        }
    }
}

/// Conversion policy version 1.
///
/// ## Parameters
///
/// - `root_label`: Top label the parser is expected to emit
/// - `terminal_tag`: Tag on edges into terminals
/// - `punctuation_pos_tags`: Part-of-speech tags marking punctuation
/// - `punctuation_pattern`: Text pattern used for untagged tokens
/// - `remote_policy`: Handling of `-remote` edges
/// - `cycle_policy`: Handling of relocations that would cycle
/// - `check_leaf_text`: Compare printed leaf text against terminals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertPolicy {
    /// Policy version identifier.
    pub version: String,
    /// Expected top label of the derivation tree.
    pub root_label: String,
    /// Tag for edges into terminals.
    pub terminal_tag: String,
    /// Part-of-speech tags that mark punctuation.
    pub punctuation_pos_tags: Vec<String>,
    /// Pattern matched against untagged token text.
    pub punctuation_pattern: String,
    /// Remote edge handling.
    pub remote_policy: RemotePolicy,
    /// Cycle handling.
    pub cycle_policy: CyclePolicy,
    /// Whether to report leaf/terminal text disagreements.
    pub check_leaf_text: bool,
}

impl ConvertPolicy {
    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Compute a hash of the policy parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }

    /// Build the punctuation classifier described by this policy.
    pub fn punctuation_classifier(&self) -> Result<PunctuationClassifier, PolicyError> {
        PunctuationClassifier::new(&self.punctuation_pos_tags, &self.punctuation_pattern)
    }

    /// Parse a policy from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let policy: Self = serde_json::from_str(json).map_err(|e| PolicyError::Json(e.to_string()))?;
        policy.punctuation_classifier()?;
        Ok(policy)
    }

    /// Load the default policy with environment overrides.
    ///
    /// Reads `CONVERT_ROOT_LABEL`, `CONVERT_REMOTE_POLICY` and
    /// `CONVERT_CYCLE_POLICY`.
    pub fn from_env() -> Result<Self, PolicyError> {
        let mut policy = Self::default();
        if let Ok(label) = std::env::var("CONVERT_ROOT_LABEL") {
            policy.root_label = label;
        }
        if let Ok(value) = std::env::var("CONVERT_REMOTE_POLICY") {
            policy.remote_policy = RemotePolicy::from_str(&value)
                .ok_or(PolicyError::InvalidValue { setting: "CONVERT_REMOTE_POLICY", value })?;
        }
        if let Ok(value) = std::env::var("CONVERT_CYCLE_POLICY") {
            policy.cycle_policy = CyclePolicy::from_str(&value)
                .ok_or(PolicyError::InvalidValue { setting: "CONVERT_CYCLE_POLICY", value })?;
        }
        Ok(policy)
    }
}

impl Default for ConvertPolicy {
    fn default() -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            root_label: "ROOT".to_string(),
            terminal_tag: "Terminal".to_string(),
            punctuation_pos_tags: [
                "PUNCT", ".", ",", ":", "``", "''", "-LRB-", "-RRB-", "HYPH", "NFP",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            punctuation_pattern: r"^[[:punct:]]+$".to_string(),
            remote_policy: RemotePolicy::Restore,
            cycle_policy: CyclePolicy::Skip,
            check_leaf_text: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_hash_determinism() {
        let policy1 = ConvertPolicy::default();
        let policy2 = ConvertPolicy::default();

        assert_eq!(policy1.params_hash(), policy2.params_hash());
    }

    #[test]
    fn test_params_hash_changes() {
        let policy1 = ConvertPolicy::default();
        let mut policy2 = ConvertPolicy::default();
        policy2.remote_policy = RemotePolicy::Report;

        assert_ne!(policy1.params_hash(), policy2.params_hash());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let policy = ConvertPolicy::from_json(r#"{"root_label": "TOP", "cycle_policy": "abort"}"#).unwrap();
        assert_eq!(policy.root_label, "TOP");
        assert_eq!(policy.cycle_policy, CyclePolicy::Abort);
        assert_eq!(policy.terminal_tag, "Terminal");
        assert_eq!(policy.remote_policy, RemotePolicy::Restore);
    }

    #[test]
    fn test_from_json_rejects_bad_pattern() {
        let err = ConvertPolicy::from_json(r#"{"punctuation_pattern": "("}"#).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPattern { .. }));

        let err = ConvertPolicy::from_json(r#"{"remote_policy": "sometimes"}"#).unwrap_err();
        assert!(matches!(err, PolicyError::Json(_)));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!(RemotePolicy::from_str("REPORT"), Some(RemotePolicy::Report));
        assert_eq!(CyclePolicy::from_str("skip"), Some(CyclePolicy::Skip));
        assert_eq!(CyclePolicy::from_str("retry"), None);
    }
}
