//! Input tokens aligned with tree leaves.

use serde::{Deserialize, Serialize};

/// One input token, as supplied by the tokenizer/tagger upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// 1-based position in the sentence.
    pub position: u32,
    /// Surface text.
    pub text: String,
    /// Part-of-speech tag, if tagged.
    pub pos: Option<String>,
}

impl Token {
    /// Create a tagged token.
    pub fn new(position: u32, text: impl Into<String>, pos: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
            pos: Some(pos.into()),
        }
    }

    /// Create an untagged token.
    pub fn untagged(position: u32, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
            pos: None,
        }
    }

    /// Tokenize whitespace-separated text into untagged tokens.
    pub fn from_whitespace(sentence: &str) -> Vec<Self> {
        sentence
            .split_whitespace()
            .enumerate()
            .map(|(i, w)| Self::untagged(i as u32 + 1, w))
            .collect()
    }
}
