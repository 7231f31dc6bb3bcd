//! Tree Builder: derivation tree → initial foundational layer.
//!
//! Internal tree nodes become foundational nodes attached to their parent
//! by an edge carrying the tree node's label. Leaves bind to terminals left
//! to right through a single [`LeafCursor`] threaded through the descent.

use crate::passage::Passage;
use crate::policy::ConvertPolicy;
use crate::types::{ConversionReport, ConversionWarning, DerivationTree, EdgeTag, NodeId};
use super::ConvertError;

/// Left-to-right cursor over the passage's terminals.
#[derive(Debug)]
pub struct LeafCursor<'a> {
    terminals: &'a [NodeId],
    next: usize,
}

impl<'a> LeafCursor<'a> {
    /// Cursor positioned before the first terminal.
    pub fn new(terminals: &'a [NodeId]) -> Self {
        Self { terminals, next: 0 }
    }

    /// Consume the next terminal.
    pub fn advance(&mut self) -> Option<NodeId> {
        let id = self.terminals.get(self.next).copied()?;
        self.next += 1;
        Some(id)
    }

    /// Number of terminals consumed so far.
    pub fn consumed(&self) -> usize {
        self.next
    }

    /// Whether every terminal has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.next == self.terminals.len()
    }
}

/// Build the foundational layer of `passage` from `tree`.
///
/// Fails before touching the passage when the leaf count differs from the
/// terminal count. Returns the new root.
pub fn build_tree(
    passage: &mut Passage,
    tree: &DerivationTree,
    policy: &ConvertPolicy,
    report: &mut ConversionReport,
) -> Result<NodeId, ConvertError> {
    if passage.root().is_some() || passage.num_foundational() > 0 {
        return Err(ConvertError::AlreadyConverted(passage.id().to_string()));
    }

    let DerivationTree::Internal { label, children } = tree else {
        return Err(ConvertError::RootIsLeaf(passage.id().to_string()));
    };

    let leaves = tree.leaf_count();
    let terminals = passage.num_terminals();
    if leaves != terminals {
        return Err(ConvertError::StructuralMismatch {
            passage_id: passage.id().to_string(),
            leaves,
            terminals,
        });
    }

    if *label != policy.root_label {
        report.warn(ConversionWarning::LabelMismatch {
            expected: policy.root_label.clone(),
            found: label.clone(),
        });
    }

    let root = passage.create_root()?;
    let terminal_ids = passage.terminal_ids();
    let mut cursor = LeafCursor::new(&terminal_ids);

    // Preorder over (parent, subtree): children are pushed in reverse so
    // ids and terminals are assigned left to right.
    let mut stack: Vec<(NodeId, &DerivationTree)> = children.iter().rev().map(|c| (root, c)).collect();
    while let Some((parent, subtree)) = stack.pop() {
        match subtree {
            DerivationTree::Leaf { text } => {
                attach_leaf(passage, parent, text.as_deref(), &mut cursor, policy, report)?;
            }
            DerivationTree::Internal { label, children } => {
                let node = passage.add_foundational();
                passage.add_edge(parent, node, EdgeTag::parse(label))?;
                stack.extend(children.iter().rev().map(|c| (node, c)));
            }
        }
    }

    tracing::debug!(
        passage_id = passage.id(),
        nodes = passage.num_foundational(),
        terminals = cursor.consumed(),
        "Built foundational layer"
    );
    Ok(root)
}

fn attach_leaf(
    passage: &mut Passage,
    parent: NodeId,
    text: Option<&str>,
    cursor: &mut LeafCursor<'_>,
    policy: &ConvertPolicy,
    report: &mut ConversionReport,
) -> Result<(), ConvertError> {
    let terminal = cursor.advance().ok_or_else(|| ConvertError::StructuralMismatch {
        passage_id: passage.id().to_string(),
        leaves: cursor.consumed() + 1,
        terminals: passage.num_terminals(),
    })?;

    if policy.check_leaf_text {
        if let (Some(leaf), Some(t)) = (text, passage.node(terminal).and_then(|n| n.as_terminal())) {
            if leaf != t.text {
                report.warn(ConversionWarning::TokenMismatch {
                    position: t.position,
                    leaf: leaf.to_string(),
                    terminal: t.text.clone(),
                });
            }
        }
    }

    passage.add_edge(parent, terminal, EdgeTag::new(policy.terminal_tag.as_str()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagSuffix;

    fn passage(words: &[&str]) -> Passage {
        let mut passage = Passage::new("builder");
        for w in words {
            passage.add_terminal(*w, false).unwrap();
        }
        passage
    }

    fn build(passage: &mut Passage, tree: &str) -> Result<(NodeId, ConversionReport), ConvertError> {
        let tree = DerivationTree::parse(tree).unwrap();
        let policy = ConvertPolicy::default();
        let mut report = ConversionReport::new(passage.id(), policy.params_hash());
        let root = build_tree(passage, &tree, &policy, &mut report)?;
        Ok((root, report))
    }

    #[test]
    fn test_leaves_bind_in_order() {
        let mut p = passage(&["w1", "w2", "w3"]);
        let (root, report) = build(&mut p, "(ROOT (A (B w1) (C w2 w3)))").unwrap();

        assert!(!report.has_warnings());
        let a = p.children(root);
        assert_eq!(a.len(), 1);
        let bc = p.children(a[0]);
        assert_eq!(p.children(bc[0]), vec![NodeId::terminal(1)]);
        assert_eq!(p.children(bc[1]), vec![NodeId::terminal(2), NodeId::terminal(3)]);
        for t in p.terminal_ids() {
            assert_eq!(p.parents(t).len(), 1);
        }
    }

    #[test]
    fn test_suffix_parsed_once() {
        let mut p = passage(&["w1", "w2"]);
        let (root, _) = build(&mut p, "(ROOT (A-down w1) (Lowdown w2))").unwrap();
        let tags: Vec<_> = p.outgoing_edges(root).iter().map(|e| e.tag.clone()).collect();
        assert_eq!(tags[0].suffix, TagSuffix::Down);
        assert_eq!(tags[0].label, "A");
        assert_eq!(tags[1].suffix, TagSuffix::None);
    }

    #[test]
    fn test_leaf_count_mismatch_leaves_passage_untouched() {
        let mut p = passage(&["w1", "w2"]);
        let err = build(&mut p, "(ROOT (A w1 w2 w3))").unwrap_err();
        assert!(matches!(err, ConvertError::StructuralMismatch { leaves: 3, terminals: 2, .. }));
        assert_eq!(p.num_foundational(), 0);
        assert_eq!(p.root(), None);
    }

    #[test]
    fn test_root_label_mismatch_is_a_warning() {
        let mut p = passage(&["w1"]);
        let (_, report) = build(&mut p, "(S (A w1))").unwrap();
        assert_eq!(
            report.warnings,
            vec![ConversionWarning::LabelMismatch {
                expected: "ROOT".to_string(),
                found: "S".to_string(),
            }]
        );
    }

    #[test]
    fn test_token_mismatch_is_a_warning() {
        let mut p = passage(&["(", "x", ")"]);
        let (_, report) = build(&mut p, "(ROOT (U -LRB-) (A x) (U -RRB-))").unwrap();
        assert_eq!(report.warnings_of("token_mismatch").len(), 2);
    }

    #[test]
    fn test_leaf_top_and_second_build_fail() {
        let mut p = passage(&["w1"]);
        let tree = DerivationTree::word("w1");
        let policy = ConvertPolicy::default();
        let mut report = ConversionReport::new("builder", "h");
        assert!(matches!(
            build_tree(&mut p, &tree, &policy, &mut report),
            Err(ConvertError::RootIsLeaf(_))
        ));

        build(&mut p, "(ROOT w1)").unwrap();
        assert!(matches!(build(&mut p, "(ROOT w1)"), Err(ConvertError::AlreadyConverted(_))));
    }

    #[test]
    fn test_cursor() {
        let ids = [NodeId::terminal(1), NodeId::terminal(2)];
        let mut cursor = LeafCursor::new(&ids);
        assert_eq!(cursor.advance(), Some(ids[0]));
        assert!(!cursor.is_exhausted());
        assert_eq!(cursor.advance(), Some(ids[1]));
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.consumed(), 2);
    }
}
