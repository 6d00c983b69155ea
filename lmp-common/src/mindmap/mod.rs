//! Mindmap progress engine
//!
//! Pure functions over in-memory progress trees. Nothing in this module
//! performs I/O; the builders in [`crate::builders`] produce the trees and
//! callers persist the resulting ids.

pub mod codec;
pub mod completion;
pub mod mutation;
pub mod navigation;
pub mod tree;
pub mod unlock;

pub use codec::{db_ids_from_nodes, mindmap_ids_to_db_ids, DbIds};
pub use completion::get_entities_to_complete;
pub use mutation::compute_tree_with_completed_nodes;
pub use navigation::{
    find_node, get_closest_parent, get_parents, is_root, next_sibling, siblings,
};
pub use tree::{EntityKind, MindmapTree, NodeAttributes, NodeId, ProgressState, ID_SEPARATOR};
pub use unlock::{
    active_frontier, find_active_node, find_next_in_progress, get_next_in_progress_nodes,
    NextInProgress,
};
