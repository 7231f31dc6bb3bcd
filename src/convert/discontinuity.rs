//! Discontinuity Resolver.
//!
//! Edges tagged `-down` or `-left` encode a discontinuous constituent. The
//! resolver moves each such edge to its intended parent when the move is
//! well-defined, then strips the suffix whether or not it moved:
//!
//! - `-down`: the child attaches to the grandparent. Requires the child to
//!   have one parent and that parent to have one parent.
//! - `-left`: the child attaches to its nearest left sibling, siblings being
//!   ordered by their first terminal. Requires a foundational left neighbour.
//!
//! The work-list of (node, incoming edge) pairs is snapshotted before the
//! first move and never re-derived mid-pass.

use crate::passage::Passage;
use crate::policy::{ConvertPolicy, CyclePolicy};
use crate::types::{
    ConversionReport, ConversionWarning, EdgeId, NodeId, RelocationRecord, SkipReason, TagSuffix,
};
use super::ConvertError;

/// Resolve every positional-suffix edge in the passage.
pub fn resolve_discontinuities(
    passage: &mut Passage,
    policy: &ConvertPolicy,
    report: &mut ConversionReport,
) -> Result<(), ConvertError> {
    let work: Vec<(NodeId, EdgeId)> = passage
        .nodes()
        .flat_map(|node| node.incoming().iter().map(move |edge| (node.id, *edge)))
        .collect();

    for (node, edge_id) in work {
        let Some(edge) = passage.edge(edge_id) else { continue };
        let (child, from, suffix) = (edge.child, edge.parent, edge.tag.suffix);
        if child != node || !suffix.is_positional() {
            continue;
        }

        let target = match suffix {
            TagSuffix::Down => down_target(passage, child, from),
            _ => left_target(passage, child, from),
        };
        let target = match target {
            Ok(to) if passage.reaches(child, to) => match policy.cycle_policy {
                CyclePolicy::Abort => {
                    return Err(ConvertError::CycleViolation {
                        edge: edge_id,
                        parent: to,
                        child,
                    })
                }
                CyclePolicy::Skip => Err(SkipReason::WouldCreateCycle),
            },
            other => other,
        };

        let record = match target {
            Ok(to) => {
                passage.retarget_edge(edge_id, to)?;
                tracing::debug!(
                    passage_id = passage.id(),
                    edge = %edge_id,
                    child = %child,
                    from = %from,
                    to = %to,
                    suffix = %suffix,
                    "Relocated discontinuous edge"
                );
                RelocationRecord {
                    edge: edge_id,
                    child,
                    suffix,
                    from,
                    to: Some(to),
                    skipped: None,
                }
            }
            Err(reason) => {
                report.warn(ConversionWarning::RelocationSkipped {
                    edge: edge_id,
                    child,
                    suffix,
                    reason,
                });
                RelocationRecord {
                    edge: edge_id,
                    child,
                    suffix,
                    from,
                    to: None,
                    skipped: Some(reason),
                }
            }
        };
        report.relocations.push(record);

        passage.strip_suffix(edge_id)?;
    }
    Ok(())
}

fn down_target(passage: &Passage, child: NodeId, parent: NodeId) -> Result<NodeId, SkipReason> {
    if passage.incoming_edges(child).len() != 1 {
        return Err(SkipReason::MultiParentChild);
    }
    match passage.parents(parent).as_slice() {
        [grandparent] => Ok(*grandparent),
        [] => Err(SkipReason::NoGrandparent),
        _ => Err(SkipReason::MultiParentAncestor),
    }
}

fn left_target(passage: &Passage, child: NodeId, parent: NodeId) -> Result<NodeId, SkipReason> {
    let mut siblings: Vec<(Option<u32>, NodeId)> = passage
        .primary_children(parent)
        .into_iter()
        .map(|id| (passage.first_terminal_position(id), id))
        .collect();
    // Empty constituents sort last
    siblings.sort_by_key(|(pos, id)| (pos.is_none(), *pos, *id));

    let index = siblings
        .iter()
        .position(|(_, id)| *id == child)
        .ok_or(SkipReason::NotPrimaryChild)?;
    if index == 0 {
        return Err(SkipReason::LeftmostSibling);
    }

    let neighbor = siblings[index - 1].1;
    match passage.node(neighbor) {
        Some(node) if node.is_foundational() => Ok(neighbor),
        _ => Err(SkipReason::NeighborNotFoundational),
    }
}
