//! Completion propagation (leaf to root)
//!
//! Finishing one node can complete its ancestors: an ancestor is complete
//! once every one of its children is done. Children already queued by the
//! current call count as done, so a single completion can cascade through
//! several levels in one pass.

use super::navigation::get_parents;
use super::tree::{MindmapTree, NodeId, ProgressState};

/// Ids that become `DONE` when `id` is completed
///
/// Returns `id` first, then ancestors from closest to farthest. The cascade
/// stops at the first ancestor that still has an unfinished child. An id
/// that is not in the tree yields `[id]`.
pub fn get_entities_to_complete(tree: &MindmapTree, id: &NodeId) -> Vec<NodeId> {
    let mut to_complete = vec![*id];

    for ancestor in get_parents(tree, id).into_iter().rev() {
        let all_children_done = ancestor
            .children
            .iter()
            .filter(|child| !to_complete.contains(&child.id))
            .all(|child| child.state() == ProgressState::Done);

        if !all_children_done {
            break;
        }
        to_complete.push(ancestor.id);
    }

    to_complete
}
