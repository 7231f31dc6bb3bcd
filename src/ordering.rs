//! Canonical ordering of a node's outgoing edges.
//!
//! ## Determinism Guarantees
//!
//! - The key depends only on the edge itself: (child id, remote flag, edge id)
//! - Child ids order by (layer, index), so terminals come first in position
//!   order, then constituents in creation order
//! - Edge ids are never reused, so removing and reinserting an edge at a
//!   parent any number of times yields the same order
//! - Tags are not part of the key; stripping a suffix never unsorts a list

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::types::{Edge, EdgeId, NodeId};

/// Sort key of an edge among its siblings.
pub fn edge_order_key(edge: &Edge) -> (NodeId, bool, EdgeId) {
    (edge.child, edge.remote, edge.id)
}

/// Compare two edges sharing a parent.
pub fn compare_edges(a: &Edge, b: &Edge) -> Ordering {
    edge_order_key(a).cmp(&edge_order_key(b))
}

/// Compare two edge ids through an edge table.
///
/// Ids missing from the table sort after present ones, by id.
pub fn compare_edge_ids(edges: &BTreeMap<EdgeId, Edge>, a: EdgeId, b: EdgeId) -> Ordering {
    match (edges.get(&a), edges.get(&b)) {
        (Some(ea), Some(eb)) => compare_edges(ea, eb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(&b),
    }
}

/// Sort a list of edge ids into canonical order.
pub fn sort_edge_ids(ids: &mut [EdgeId], edges: &BTreeMap<EdgeId, Edge>) {
    ids.sort_by(|a, b| compare_edge_ids(edges, *a, *b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeTag;

    fn edge(id: u64, child: NodeId) -> Edge {
        Edge::new(EdgeId::new(id), NodeId::foundational(1), child, EdgeTag::new("A"))
    }

    #[test]
    fn test_terminals_before_constituents() {
        let t = edge(5, NodeId::terminal(9));
        let f = edge(1, NodeId::foundational(2));
        assert_eq!(compare_edges(&t, &f), Ordering::Less);
    }

    #[test]
    fn test_order_ignores_insertion_history() {
        let mut table = BTreeMap::new();
        for (id, child) in [(7, NodeId::foundational(4)), (2, NodeId::terminal(3)), (9, NodeId::foundational(2))] {
            table.insert(EdgeId::new(id), edge(id, child));
        }

        let mut forward: Vec<EdgeId> = table.keys().copied().collect();
        let mut backward: Vec<EdgeId> = table.keys().rev().copied().collect();
        sort_edge_ids(&mut forward, &table);
        sort_edge_ids(&mut backward, &table);

        assert_eq!(forward, backward);
        assert_eq!(forward, vec![EdgeId::new(2), EdgeId::new(9), EdgeId::new(7)]);
    }

    #[test]
    fn test_tag_change_does_not_reorder() {
        let mut a = edge(1, NodeId::foundational(3));
        let b = edge(2, NodeId::foundational(4));
        a.tag = EdgeTag::parse("Z-down");
        assert_eq!(compare_edges(&a, &b), Ordering::Less);
        a.tag.strip();
        assert_eq!(compare_edges(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_remote_after_primary_for_same_child() {
        let child = NodeId::foundational(5);
        let primary = edge(8, child);
        let mut remote = edge(3, child);
        remote.remote = true;
        assert_eq!(compare_edges(&primary, &remote), Ordering::Less);
    }
}
