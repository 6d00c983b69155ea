//! Tree navigation primitives
//!
//! Stateless lookups over a `MindmapTree`. All functions are total: an id
//! that is not in the tree yields `None` or an empty list, never an error.

use super::tree::{MindmapTree, NodeId};

/// Find a node by id (depth-first, root first, children left to right)
pub fn find_node<'a>(tree: &'a MindmapTree, id: &NodeId) -> Option<&'a MindmapTree> {
    if tree.id == *id {
        return Some(tree);
    }
    tree.children.iter().find_map(|child| find_node(child, id))
}

/// Ancestor path of `id`, root first, excluding the node itself
///
/// Empty when `id` is the root or is not in the tree; use [`is_root`] to
/// tell the two apart.
pub fn get_parents<'a>(tree: &'a MindmapTree, id: &NodeId) -> Vec<&'a MindmapTree> {
    let mut path = Vec::new();
    if collect_path(tree, id, &mut path) {
        path
    } else {
        Vec::new()
    }
}

fn collect_path<'a>(node: &'a MindmapTree, id: &NodeId, path: &mut Vec<&'a MindmapTree>) -> bool {
    if node.id == *id {
        return true;
    }

    path.push(node);
    for child in &node.children {
        if collect_path(child, id, path) {
            return true;
        }
    }
    path.pop();

    false
}

pub fn is_root(tree: &MindmapTree, id: &NodeId) -> bool {
    tree.id == *id
}

/// Immediate parent of `id`, `None` for the root or an unknown id
pub fn get_closest_parent<'a>(tree: &'a MindmapTree, id: &NodeId) -> Option<&'a MindmapTree> {
    get_parents(tree, id).pop()
}

/// Full child list of the parent of `id`, including `id` itself
pub fn siblings<'a>(tree: &'a MindmapTree, id: &NodeId) -> Option<&'a [MindmapTree]> {
    if is_root(tree, id) {
        return None;
    }
    get_closest_parent(tree, id).map(|parent| parent.children.as_slice())
}

/// Sibling immediately following `id`
pub fn next_sibling<'a>(tree: &'a MindmapTree, id: &NodeId) -> Option<&'a MindmapTree> {
    let siblings = siblings(tree, id)?;
    if siblings.len() <= 1 {
        return None;
    }

    let position = siblings.iter().position(|node| node.id == *id)?;
    siblings.get(position + 1)
}
