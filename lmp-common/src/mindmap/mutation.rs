//! Tree mutation helper
//!
//! Produces the tree as it will look after a batch of completions, so the
//! unlock scan can run against the post-completion state before anything
//! is written to storage.

use super::tree::{MindmapTree, NodeId, ProgressState};
use std::collections::{HashSet, VecDeque};

/// Copy of `tree` with every node in `ids_to_complete` marked `DONE`
///
/// The input tree is not modified. Nodes not listed keep their state and
/// all other attributes.
pub fn compute_tree_with_completed_nodes(
    tree: &MindmapTree,
    ids_to_complete: &[NodeId],
) -> MindmapTree {
    let ids: HashSet<NodeId> = ids_to_complete.iter().copied().collect();
    let mut updated = tree.clone();

    let mut queue: VecDeque<&mut MindmapTree> = VecDeque::new();
    queue.push_back(&mut updated);

    while let Some(node) = queue.pop_front() {
        if ids.contains(&node.id) {
            node.attributes.state = ProgressState::Done;
        }
        queue.extend(node.children.iter_mut());
    }

    updated
}
