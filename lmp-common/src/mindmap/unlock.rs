//! Unlock propagation
//!
//! Searches over a tree: a whole-tree scan that collects the locked nodes
//! along the single active path, a successor lookup that finds where to
//! route the learner after one node is completed, and the lookup of the
//! unfinished node the learner is already working on.

use super::navigation::{find_node, get_closest_parent};
use super::tree::{MindmapTree, NodeId, ProgressState};
use serde::{Deserialize, Serialize};

/// Result of [`find_next_in_progress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextInProgress {
    /// Pass-through node skipped on the way, to be marked done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<NodeId>,
    /// Node the learner should work on next
    pub next_in_progress: Option<NodeId>,
}

/// Locked nodes on the path from the root to the current frontier
///
/// Walks a single path: at each node, continue into the first in-progress
/// child, otherwise the first locked child, and stop at a leaf or when all
/// children are done. Every locked node passed on the way is returned, in
/// root-to-leaf order.
pub fn get_next_in_progress_nodes(tree: &MindmapTree) -> Vec<NodeId> {
    let mut to_unlock = Vec::new();
    let mut current = Some(tree);

    while let Some(node) = current {
        if node.state() == ProgressState::Locked {
            to_unlock.push(node.id);
        }

        current = next_on_active_path(node);
    }

    to_unlock
}

/// Last node of the active path of `tree`
///
/// Follows the same path as [`get_next_in_progress_nodes`]. `None` when
/// the path ends on a done node, i.e. nothing below `tree` is left to do.
pub fn active_frontier(tree: &MindmapTree) -> Option<&MindmapTree> {
    let mut node = tree;
    while let Some(next) = next_on_active_path(node) {
        node = next;
    }

    (node.state() != ProgressState::Done).then_some(node)
}

/// Unfinished node closest to `from`
///
/// Tries the active path below `from` first, then below each ancestor,
/// closest first. `None` when the whole tree is done or `from` is not in
/// the tree.
pub fn find_active_node<'a>(tree: &'a MindmapTree, from: &NodeId) -> Option<&'a MindmapTree> {
    let mut current = find_node(tree, from);

    while let Some(node) = current {
        if let Some(active) = active_frontier(node) {
            return Some(active);
        }
        current = get_closest_parent(tree, &node.id);
    }

    None
}

/// Next node to put in progress after `completed` was finished
///
/// Looks at the first locked child of `completed`. A pass-through child
/// (`no_popup`) is reported as `completed` and its first child becomes the
/// target; only one such level is skipped. When there is no locked child
/// the search moves up to the parent, ending with no target at the root.
pub fn find_next_in_progress(
    tree: &MindmapTree,
    completed: Option<&MindmapTree>,
) -> NextInProgress {
    let mut current = completed;

    while let Some(node) = current {
        if let Some(candidate) = first_child_in_state(node, ProgressState::Locked) {
            if candidate.attributes.no_popup {
                return NextInProgress {
                    completed: Some(candidate.id),
                    next_in_progress: candidate.children.first().map(|child| child.id),
                };
            }
            return NextInProgress {
                completed: None,
                next_in_progress: Some(candidate.id),
            };
        }

        current = get_closest_parent(tree, &node.id);
    }

    NextInProgress::default()
}

fn next_on_active_path(node: &MindmapTree) -> Option<&MindmapTree> {
    first_child_in_state(node, ProgressState::InProgress)
        .or_else(|| first_child_in_state(node, ProgressState::Locked))
}

fn first_child_in_state(node: &MindmapTree, state: ProgressState) -> Option<&MindmapTree> {
    node.children.iter().find(|child| child.state() == state)
}
