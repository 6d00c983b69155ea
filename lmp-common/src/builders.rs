//! Tree builders
//!
//! Assemble a learner's `MindmapTree` from flat progress rows. Builders are
//! the only part of the engine that awaits storage; they finish before any
//! propagation runs.
//!
//! Content data must form a single connected tree. A subchapter whose
//! lessons do not is a data-integrity problem and fails the build.

use crate::db::models::{ChapterProgressRow, LessonProgressRow, SubchapterProgressRow};
use crate::db::progress::{fetch_chapter_row, fetch_lesson_rows, fetch_subchapter_rows};
use crate::mindmap::{MindmapTree, NodeAttributes, NodeId, ProgressState};
use crate::{Error, Result};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// Build the lesson tree of one subchapter for a learner
///
/// The root is the single lesson without a parent lesson. Siblings keep the
/// order of the fetched rows.
pub async fn build_subchapter_tree(
    pool: &SqlitePool,
    learner: Uuid,
    subchapter_id: i64,
) -> Result<MindmapTree> {
    let rows = fetch_lesson_rows(pool, learner, subchapter_id).await?;
    let tree = assemble_lesson_tree(subchapter_id, rows)?;

    debug!(
        "Built lesson tree for subchapter {} (root {}, {} nodes)",
        subchapter_id,
        tree.id,
        tree.node_count()
    );
    Ok(tree)
}

/// Build the two-level chapter tree (chapter root, subchapter leaves)
///
/// # Errors
/// [`Error::NotFound`] if the chapter does not exist.
pub async fn build_chapter_tree(
    pool: &SqlitePool,
    learner: Uuid,
    chapter_id: i64,
) -> Result<MindmapTree> {
    let chapter = fetch_chapter_row(pool, learner, chapter_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("chapter {}", chapter_id)))?;
    let subchapters = fetch_subchapter_rows(pool, learner, chapter_id).await?;

    let tree = assemble_chapter_tree(chapter, subchapters);

    debug!(
        "Built chapter tree for chapter {} ({} subchapters)",
        chapter_id,
        tree.children.len()
    );
    Ok(tree)
}

/// Link lesson rows into a tree by their parent references
pub fn assemble_lesson_tree(
    subchapter_id: i64,
    rows: Vec<LessonProgressRow>,
) -> Result<MindmapTree> {
    let known: HashSet<i64> = rows.iter().map(|row| row.id).collect();

    let mut roots = Vec::new();
    let mut children_of: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut nodes: HashMap<i64, MindmapTree> = HashMap::with_capacity(rows.len());

    for row in rows {
        match row.parent_lesson_id {
            None => roots.push(row.id),
            Some(parent_id) if known.contains(&parent_id) => {
                children_of.entry(parent_id).or_default().push(row.id);
            }
            Some(parent_id) => {
                return Err(Error::DanglingParent {
                    lesson_id: row.id,
                    parent_id,
                });
            }
        }
        nodes.insert(row.id, lesson_node(row));
    }

    let root_id = match roots.as_slice() {
        [] => return Err(Error::MissingRoot { subchapter_id }),
        [root_id] => *root_id,
        _ => {
            return Err(Error::MultipleRoots {
                subchapter_id,
                count: roots.len(),
            })
        }
    };

    let tree = attach_children(root_id, &mut nodes, &children_of)
        .ok_or(Error::MissingRoot { subchapter_id })?;

    // Anything left was never reached from the root (parent cycle)
    if !nodes.is_empty() {
        return Err(Error::DisconnectedLessons {
            subchapter_id,
            count: nodes.len(),
        });
    }

    Ok(tree)
}

fn attach_children(
    id: i64,
    nodes: &mut HashMap<i64, MindmapTree>,
    children_of: &HashMap<i64, Vec<i64>>,
) -> Option<MindmapTree> {
    let mut node = nodes.remove(&id)?;

    if let Some(child_ids) = children_of.get(&id) {
        node.children = child_ids
            .iter()
            .filter_map(|child_id| attach_children(*child_id, nodes, children_of))
            .collect();
    }
    node.attributes.is_parent = Some(!node.children.is_empty());

    Some(node)
}

/// Chapter root with one leaf per subchapter
pub fn assemble_chapter_tree(
    chapter: ChapterProgressRow,
    subchapters: Vec<SubchapterProgressRow>,
) -> MindmapTree {
    let children = subchapters.into_iter().map(subchapter_node).collect();

    MindmapTree {
        id: NodeId::chapter(chapter.id),
        name: chapter.name,
        attributes: NodeAttributes {
            state: ProgressState::resolve(chapter.state.as_deref()),
            id: chapter.id,
            description: chapter.description,
            image_url: chapter.image_url,
            is_parent: Some(true),
            ..NodeAttributes::default()
        },
        children,
    }
}

fn lesson_node(row: LessonProgressRow) -> MindmapTree {
    MindmapTree {
        id: NodeId::lesson(row.id),
        name: row.name,
        attributes: NodeAttributes {
            state: ProgressState::resolve(row.state.as_deref()),
            no_popup: row.no_popup,
            id: row.id,
            description: row.description,
            image_url: row.image_url,
            ..NodeAttributes::default()
        },
        children: Vec::new(),
    }
}

fn subchapter_node(row: SubchapterProgressRow) -> MindmapTree {
    MindmapTree {
        id: NodeId::subchapter(row.id),
        name: row.name,
        attributes: NodeAttributes {
            state: ProgressState::resolve(row.state.as_deref()),
            no_popup: row.no_popup,
            id: row.id,
            description: row.description,
            image_url: row.image_url,
            is_parent: Some(false),
            ..NodeAttributes::default()
        },
        children: Vec::new(),
    }
}
