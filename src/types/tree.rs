//! Labeled derivation trees as emitted by the constituency parser.
//!
//! Internal nodes carry the relation label used for the edge to their
//! parent; leaves are positional placeholders bound to terminals left to
//! right. The bracketed text form is the parser's printed form:
//!
//! ```text
//! (ROOT (A (B word1) (C word2 word3)))
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for bracketed tree parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeParseError {
    /// Input ended inside a bracket.
    #[error("Unexpected end of input, {0} bracket(s) still open")]
    UnexpectedEof(usize),
    /// A token appeared where it is not allowed.
    #[error("Unexpected `{found}` at byte {offset}")]
    UnexpectedToken {
        /// Offending token.
        found: String,
        /// Byte offset in the input.
        offset: usize,
    },
    /// An opening bracket was not followed by a label.
    #[error("Missing label after `(` at byte {0}")]
    MissingLabel(usize),
    /// Input contained no tree.
    #[error("Empty input")]
    Empty,
}

/// Node of a derivation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivationTree {
    /// Positional placeholder for the next terminal.
    Leaf {
        /// Word text, when the parser printed it.
        text: Option<String>,
    },
    /// Labeled constituent.
    Internal {
        /// Relation label (possibly with a positional suffix).
        label: String,
        /// Children in surface order.
        children: Vec<DerivationTree>,
    },
}

impl DerivationTree {
    /// Leaf without text.
    pub fn leaf() -> Self {
        Self::Leaf { text: None }
    }

    /// Leaf carrying its word.
    pub fn word(text: impl Into<String>) -> Self {
        Self::Leaf {
            text: Some(text.into()),
        }
    }

    /// Internal node.
    pub fn node(label: impl Into<String>, children: Vec<DerivationTree>) -> Self {
        Self::Internal {
            label: label.into(),
            children,
        }
    }

    /// Whether this is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// Label of an internal node.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Internal { label, .. } => Some(label),
            Self::Leaf { .. } => None,
        }
    }

    /// Children of an internal node, empty for leaves.
    pub fn children(&self) -> &[DerivationTree] {
        match self {
            Self::Internal { children, .. } => children,
            Self::Leaf { .. } => &[],
        }
    }

    /// Number of leaves under this node.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Leaf { .. } => count += 1,
                Self::Internal { children, .. } => stack.extend(children.iter()),
            }
        }
        count
    }

    /// Number of internal nodes under this node, itself included.
    pub fn internal_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Self::Internal { children, .. } = node {
                count += 1;
                stack.extend(children.iter());
            }
        }
        count
    }

    /// Bracketed text form. Text-less leaves print as `*`.
    pub fn linearize(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![WriteStep::Node(self)];
        while let Some(step) = stack.pop() {
            match step {
                WriteStep::Text(text) => out.push_str(text),
                WriteStep::Node(Self::Leaf { text }) => out.push_str(text.as_deref().unwrap_or("*")),
                WriteStep::Node(Self::Internal { label, children }) => {
                    out.push('(');
                    out.push_str(label);
                    stack.push(WriteStep::Text(")"));
                    for child in children.iter().rev() {
                        stack.push(WriteStep::Node(child));
                        stack.push(WriteStep::Text(" "));
                    }
                }
            }
        }
        out
    }

    /// Parse the bracketed text form.
    ///
    /// Nesting depth is bounded only by memory.
    pub fn parse(input: &str) -> Result<Self, TreeParseError> {
        let tokens = tokenize(input);
        // Labels and children of brackets opened but not yet closed
        let mut open: Vec<(String, Vec<DerivationTree>)> = Vec::new();
        let mut pos = 0;

        let tree = loop {
            let tok = tokens.get(pos).ok_or(if open.is_empty() {
                TreeParseError::Empty
            } else {
                TreeParseError::UnexpectedEof(open.len())
            })?;
            pos += 1;

            let finished = match tok.text {
                "(" => {
                    let label = match tokens.get(pos) {
                        Some(t) if t.text != "(" && t.text != ")" => t.text.to_string(),
                        Some(_) => return Err(TreeParseError::MissingLabel(tok.offset)),
                        None => return Err(TreeParseError::UnexpectedEof(open.len() + 1)),
                    };
                    pos += 1;
                    open.push((label, Vec::new()));
                    continue;
                }
                ")" => match open.pop() {
                    Some((label, children)) => DerivationTree::Internal { label, children },
                    None => {
                        return Err(TreeParseError::UnexpectedToken {
                            found: ")".to_string(),
                            offset: tok.offset,
                        })
                    }
                },
                word => DerivationTree::word(word),
            };

            match open.last_mut() {
                Some((_, children)) => children.push(finished),
                None => break finished,
            }
        };

        match tokens.get(pos) {
            None => Ok(tree),
            Some(tok) => Err(TreeParseError::UnexpectedToken {
                found: tok.text.to_string(),
                offset: tok.offset,
            }),
        }
    }
}

enum WriteStep<'a> {
    Node(&'a DerivationTree),
    Text(&'static str),
}

// Children are detached onto a heap stack before they drop, so freeing a
// deep unary chain never nests drop calls.
impl Drop for DerivationTree {
    fn drop(&mut self) {
        let Self::Internal { children, .. } = self else {
            return;
        };
        let mut stack = std::mem::take(children);
        while let Some(mut node) = stack.pop() {
            if let Self::Internal { children, .. } = &mut node {
                stack.append(children);
            }
        }
    }
}

impl fmt::Display for DerivationTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.linearize())
    }
}

impl std::str::FromStr for DerivationTree {
    type Err = TreeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

struct Token<'a> {
    text: &'a str,
    offset: usize,
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in input.char_indices() {
        if c == '(' || c == ')' || c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token { text: &input[s..i], offset: s });
            }
            if !c.is_whitespace() {
                tokens.push(Token { text: &input[i..i + 1], offset: i });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(Token { text: &input[s..], offset: s });
    }
    tokens
}
