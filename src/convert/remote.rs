//! Remote Edge Restorer.
//!
//! Under [`RemotePolicy::Restore`], an edge `P -(X-remote)-> N` keeps `P` as
//! N's primary parent with tag `X`, and gains a remote edge `G -(X)-> N`
//! from P's primary parent `G`. N ends up with two incoming edges.
//!
//! Under [`RemotePolicy::Report`] every `-remote` edge is left as emitted
//! and reported, never dropped.
//!
//! `Restore` is a placeholder. G is already an ancestor of N through P, so
//! the remote edge repeats a relation the primary tree encodes. Which
//! parent a `-remote` label should really point to is still unsettled;
//! until it is, the pass only guarantees that N gains a second incoming
//! edge and that no suffix is silently dropped.

use crate::passage::Passage;
use crate::policy::{ConvertPolicy, CyclePolicy, RemotePolicy};
use crate::types::{ConversionReport, ConversionWarning, EdgeId, EdgeTag, NodeId, RemoteIssue, TagSuffix};
use super::ConvertError;

/// Resolve every `-remote` edge according to the policy.
pub fn restore_remote_edges(
    passage: &mut Passage,
    policy: &ConvertPolicy,
    report: &mut ConversionReport,
) -> Result<(), ConvertError> {
    let pending: Vec<EdgeId> = passage
        .edges()
        .filter(|e| e.tag.suffix == TagSuffix::Remote)
        .map(|e| e.id)
        .collect();

    for edge_id in pending {
        let Some(edge) = passage.edge(edge_id) else { continue };
        let (parent, child, label) = (edge.parent, edge.child, edge.tag.label.clone());

        let issue = match policy.remote_policy {
            RemotePolicy::Report => Some(RemoteIssue::NotRestored),
            RemotePolicy::Restore => match primary_parent(passage, parent) {
                None => Some(RemoteIssue::NoSingleGrandparent),
                // Not reachable while the graph is acyclic (G -> P -> N exists)
                Some(grandparent) if passage.reaches(child, grandparent) => {
                    if policy.cycle_policy == CyclePolicy::Abort {
                        return Err(ConvertError::CycleViolation {
                            edge: edge_id,
                            parent: grandparent,
                            child,
                        });
                    }
                    Some(RemoteIssue::WouldCreateCycle)
                }
                Some(grandparent) => {
                    let remote = passage.add_remote_edge(grandparent, child, EdgeTag::new(label.clone()))?;
                    passage.strip_suffix(edge_id)?;
                    tracing::debug!(
                        passage_id = passage.id(),
                        edge = %edge_id,
                        remote = %remote,
                        parent = %grandparent,
                        child = %child,
                        "Restored remote edge"
                    );
                    report.restored_remotes.push(remote);
                    None
                }
            },
        };

        if let Some(reason) = issue {
            report.warn(ConversionWarning::UnsupportedRemote {
                edge: edge_id,
                parent,
                child,
                label,
                reason,
            });
        }
    }
    Ok(())
}

/// The single primary parent of a node, if it has exactly one.
fn primary_parent(passage: &Passage, id: NodeId) -> Option<NodeId> {
    let parents: Vec<NodeId> = passage
        .incoming_edges(id)
        .into_iter()
        .filter(|e| !e.remote)
        .map(|e| e.parent)
        .collect();
    match parents.as_slice() {
        [parent] => Some(*parent),
        _ => None,
    }
}
