//! Punctuation classification for input tokens.

use regex_lite::Regex;
use std::collections::BTreeSet;

use crate::types::Token;
use super::v1::PolicyError;

/// Decides whether a token is punctuation.
///
/// Tagged tokens are judged by their part-of-speech alone; untagged tokens
/// fall back to the text pattern.
#[derive(Debug, Clone)]
pub struct PunctuationClassifier {
    pos_tags: BTreeSet<String>,
    pattern: Regex,
}

impl PunctuationClassifier {
    /// Build a classifier from tag names and a text pattern.
    pub fn new(pos_tags: &[String], pattern: &str) -> Result<Self, PolicyError> {
        let pattern = Regex::new(pattern).map_err(|e| PolicyError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pos_tags: pos_tags.iter().cloned().collect(),
            pattern,
        })
    }

    /// Classify a token.
    pub fn is_punctuation(&self, token: &Token) -> bool {
        match &token.pos {
            Some(pos) => self.pos_tags.contains(pos),
            None => self.pattern.is_match(&token.text),
        }
    }
}
