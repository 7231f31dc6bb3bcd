//! Punctuation Collapser.
//!
//! A foundational node whose children are all punctuation terminals is
//! replaced by a punctuation node with the same id, hanging from the same
//! parent under the same tag. Punctuation nodes are never matched again,
//! so a second run finds nothing to do.

use crate::passage::{Passage, PassageError};
use crate::types::{NodeId, NodeKind};
use super::ConvertError;

/// Collapse every all-punctuation constituent. Returns the replaced ids.
pub fn collapse_punctuation(passage: &mut Passage) -> Result<Vec<NodeId>, ConvertError> {
    let punctuation: Vec<NodeId> = passage
        .terminals()
        .filter(|t| t.is_punctuation)
        .map(|t| NodeId::terminal(t.position))
        .collect();

    let mut collapsed = Vec::new();
    for terminal in punctuation {
        let parents = passage.parents(terminal);
        let [parent] = parents.as_slice() else { continue };
        let parent = *parent;
        if !is_collapsible(passage, parent) {
            continue;
        }

        replace_with_punctuation(passage, parent)?;
        tracing::debug!(
            passage_id = passage.id(),
            node = %parent,
            "Collapsed punctuation cluster"
        );
        collapsed.push(parent);
    }
    Ok(collapsed)
}

fn is_collapsible(passage: &Passage, id: NodeId) -> bool {
    let Some(node) = passage.node(id) else { return false };
    if !node.is_foundational() || passage.root() == Some(id) || node.incoming().len() != 1 {
        return false;
    }
    let children = passage.children(id);
    !children.is_empty()
        && children
            .iter()
            .all(|c| passage.node(*c).map(|n| n.is_punctuation_terminal()).unwrap_or(false))
}

fn replace_with_punctuation(passage: &mut Passage, id: NodeId) -> Result<(), ConvertError> {
    let (grandparent, tag) = passage
        .incoming_edges(id)
        .first()
        .map(|e| (e.parent, e.tag.clone()))
        .ok_or(PassageError::DetachedNode(id))?;

    let (_, removed) = passage.remove_node(id)?;
    passage.insert_node(id, NodeKind::Punctuation)?;
    passage.add_edge(grandparent, id, tag)?;
    for edge in removed.into_iter().filter(|e| e.parent == id) {
        passage.add_edge(id, edge.child, edge.tag)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeTag;

    /// root -A-> x -> {t1}, x -C-> y -> {t2 ".", t3 "!"}
    fn scenario() -> (Passage, NodeId, NodeId) {
        let mut passage = Passage::new("punct");
        passage.add_terminal("Hi", false).unwrap();
        passage.add_terminal(".", true).unwrap();
        passage.add_terminal("!", true).unwrap();
        let root = passage.create_root().unwrap();
        let x = passage.add_foundational();
        let y = passage.add_foundational();
        passage.add_edge(root, x, EdgeTag::new("A")).unwrap();
        passage.add_edge(x, NodeId::terminal(1), EdgeTag::new("Terminal")).unwrap();
        passage.add_edge(x, y, EdgeTag::new("C")).unwrap();
        passage.add_edge(y, NodeId::terminal(2), EdgeTag::new("Terminal")).unwrap();
        passage.add_edge(y, NodeId::terminal(3), EdgeTag::new("Terminal")).unwrap();
        (passage, x, y)
    }

    #[test]
    fn test_replacement_keeps_id_and_tag() {
        let (mut passage, x, y) = scenario();
        let collapsed = collapse_punctuation(&mut passage).unwrap();

        assert_eq!(collapsed, vec![y]);
        assert!(passage.node(y).unwrap().is_punctuation_node());
        let incoming = passage.incoming_edges(y);
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].parent, x);
        assert_eq!(incoming[0].tag, EdgeTag::new("C"));
        assert_eq!(passage.children(y), vec![NodeId::terminal(2), NodeId::terminal(3)]);
        assert_eq!(passage.children(x), vec![NodeId::terminal(1), y]);
        assert!(passage.validate(false).is_ok());
    }

    #[test]
    fn test_second_run_is_noop() {
        let (mut passage, _, _) = scenario();
        collapse_punctuation(&mut passage).unwrap();
        let once = passage.clone();

        let collapsed = collapse_punctuation(&mut passage).unwrap();
        assert!(collapsed.is_empty());
        assert_eq!(passage, once);
    }

    #[test]
    fn test_mixed_parent_not_collapsed() {
        let (mut passage, x, _) = scenario();
        // x holds a word next to y
        let collapsed = collapse_punctuation(&mut passage).unwrap();
        assert!(!collapsed.contains(&x));
        assert!(passage.node(x).unwrap().is_foundational());
    }

    #[test]
    fn test_root_is_never_collapsed() {
        let mut passage = Passage::new("punct");
        passage.add_terminal(".", true).unwrap();
        let root = passage.create_root().unwrap();
        passage.add_edge(root, NodeId::terminal(1), EdgeTag::new("Terminal")).unwrap();

        assert!(collapse_punctuation(&mut passage).unwrap().is_empty());
        assert!(passage.node(root).unwrap().is_foundational());
    }
}
