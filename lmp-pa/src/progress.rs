//! Progress application flows
//!
//! Each flow reads the learner's current trees, computes every state change
//! in memory, then writes all "mark DONE" and "mark IN_PROGRESS" rows in a
//! single transaction. A partial write would leave done nodes under locked
//! ancestors.

use lmp_common::builders::{build_chapter_tree, build_subchapter_tree};
use lmp_common::db::{fetch_subchapter_chapter_id, mark_entities};
use lmp_common::mindmap::{
    active_frontier, compute_tree_with_completed_nodes, db_ids_from_nodes, find_active_node,
    find_next_in_progress, find_node, get_entities_to_complete, get_next_in_progress_nodes,
    EntityKind, MindmapTree, NextInProgress, NodeId, ProgressState,
};
use lmp_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// State changes produced by completing a lesson
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    /// Nodes marked `DONE`, the lesson first
    pub completed: Vec<NodeId>,
    /// Nodes marked `IN_PROGRESS`
    pub unlocked: Vec<NodeId>,
    /// Lesson the learner should be routed to next
    pub next_in_progress: Option<NodeId>,
}

/// Progress application bound to one database
#[derive(Clone)]
pub struct ProgressApp {
    db: SqlitePool,
}

impl ProgressApp {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Lesson tree of a subchapter for a learner
    pub async fn subchapter_tree(&self, learner: Uuid, subchapter_id: i64) -> Result<MindmapTree> {
        build_subchapter_tree(&self.db, learner, subchapter_id).await
    }

    /// Chapter tree (chapter root, subchapter leaves) for a learner
    pub async fn chapter_tree(&self, learner: Uuid, chapter_id: i64) -> Result<MindmapTree> {
        build_chapter_tree(&self.db, learner, chapter_id).await
    }

    /// Open a chapter for a learner
    ///
    /// Unlocks the frontier of the chapter tree and, for every subchapter on
    /// it, the frontier of its lesson tree. Returns the ids marked
    /// `IN_PROGRESS`.
    pub async fn start_chapter(&self, learner: Uuid, chapter_id: i64) -> Result<Vec<NodeId>> {
        let chapter_tree = build_chapter_tree(&self.db, learner, chapter_id).await?;

        let mut unlocked = get_next_in_progress_nodes(&chapter_tree);
        self.extend_into_lessons(learner, &mut unlocked).await?;

        self.persist(learner, &[], &unlocked).await?;

        info!(
            "Learner {} started chapter {}: {} nodes unlocked",
            learner,
            chapter_id,
            unlocked.len()
        );
        Ok(unlocked)
    }

    /// Where the learner goes after `lesson_id`, without writing anything
    pub async fn next_lesson(
        &self,
        learner: Uuid,
        subchapter_id: i64,
        lesson_id: i64,
    ) -> Result<NextInProgress> {
        let tree = build_subchapter_tree(&self.db, learner, subchapter_id).await?;
        let lesson = lesson_in_tree(&tree, subchapter_id, lesson_id)?;

        Ok(find_next_in_progress(&tree, Some(lesson)))
    }

    /// Record that a learner finished a lesson
    ///
    /// Completion cascades through the lesson tree. Once every lesson of the
    /// subchapter is done the subchapter is complete, and the cascade
    /// continues in the chapter tree, unlocking the next subchapter and its
    /// first lesson.
    ///
    /// The successor of the lesson is always unlocked, even when another
    /// branch of the lesson tree is already in progress. The learner is
    /// routed to that successor, else to the deepest lesson unlocked by this
    /// event, else to the unfinished lesson closest to the completed one.
    /// `next_in_progress` is `None` only once the chapter is finished.
    pub async fn complete_lesson(
        &self,
        learner: Uuid,
        subchapter_id: i64,
        lesson_id: i64,
    ) -> Result<CompletionOutcome> {
        let lesson_tree = build_subchapter_tree(&self.db, learner, subchapter_id).await?;
        let lesson = lesson_in_tree(&lesson_tree, subchapter_id, lesson_id)?;
        if lesson.state() == ProgressState::Locked {
            warn!("Learner {} completed locked lesson {}", learner, lesson_id);
        }
        let lesson_node_id = lesson.id;

        let mut completed = get_entities_to_complete(&lesson_tree, &lesson_node_id);
        let mut preview = compute_tree_with_completed_nodes(&lesson_tree, &completed);

        let next = find_next_in_progress(&preview, find_node(&preview, &lesson_node_id));
        if let Some(pass_through) = next.completed {
            debug!("Skipping pass-through lesson {}", pass_through);
            push_unique(&mut completed, pass_through);
            preview = compute_tree_with_completed_nodes(&lesson_tree, &completed);
        }

        let mut unlocked = get_next_in_progress_nodes(&preview);
        if let Some(next_id) = next.next_in_progress {
            push_unique(&mut unlocked, next_id);
        }

        let active_lesson = if all_done(&preview) {
            self.complete_subchapter(learner, subchapter_id, &mut completed, &mut unlocked)
                .await?
        } else {
            find_active_node(&preview, &lesson_node_id).map(|node| node.id)
        };

        unlocked.retain(|id| !completed.contains(id));

        let next_in_progress = next
            .next_in_progress
            .filter(|id| unlocked.contains(id))
            .or_else(|| {
                unlocked
                    .iter()
                    .rev()
                    .find(|id| id.kind == EntityKind::Lesson)
                    .copied()
            })
            .or(active_lesson);

        self.persist(learner, &completed, &unlocked).await?;

        info!(
            "Learner {} completed lesson {}: {} done, {} unlocked, next {:?}",
            learner,
            lesson_id,
            completed.len(),
            unlocked.len(),
            next_in_progress.map(|id| id.to_string())
        );

        Ok(CompletionOutcome {
            completed,
            unlocked,
            next_in_progress,
        })
    }

    /// Continue a finished subchapter's cascade in the chapter tree
    ///
    /// Returns the unfinished lesson of the chapter's active subchapter, or
    /// `None` when the chapter is done.
    async fn complete_subchapter(
        &self,
        learner: Uuid,
        subchapter_id: i64,
        completed: &mut Vec<NodeId>,
        unlocked: &mut Vec<NodeId>,
    ) -> Result<Option<NodeId>> {
        let chapter_id = fetch_subchapter_chapter_id(&self.db, subchapter_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("subchapter {}", subchapter_id)))?;
        let chapter_tree = build_chapter_tree(&self.db, learner, chapter_id).await?;

        let chapter_completed =
            get_entities_to_complete(&chapter_tree, &NodeId::subchapter(subchapter_id));
        let preview = compute_tree_with_completed_nodes(&chapter_tree, &chapter_completed);

        let mut chapter_unlocked = get_next_in_progress_nodes(&preview);
        self.extend_into_lessons(learner, &mut chapter_unlocked).await?;

        // Next subchapter already in progress: its lessons were not scanned above
        let mut active_lesson = None;
        if let Some(frontier) = active_frontier(&preview) {
            let already_started = frontier.id.kind == EntityKind::Subchapter
                && !chapter_unlocked.contains(&frontier.id);
            if already_started {
                let lesson_tree = build_subchapter_tree(&self.db, learner, frontier.id.id).await?;
                for id in get_next_in_progress_nodes(&lesson_tree) {
                    push_unique(&mut chapter_unlocked, id);
                }
                active_lesson = active_frontier(&lesson_tree).map(|node| node.id);
            }
        }

        info!(
            "Learner {} completed subchapter {} (chapter {} {})",
            learner,
            subchapter_id,
            chapter_id,
            if chapter_completed.contains(&chapter_tree.id) {
                "completed"
            } else {
                "continues"
            }
        );

        for id in chapter_completed {
            push_unique(completed, id);
        }
        for id in chapter_unlocked {
            push_unique(unlocked, id);
        }
        Ok(active_lesson)
    }

    /// Append the lesson-tree frontier of every subchapter in `unlocked`
    async fn extend_into_lessons(&self, learner: Uuid, unlocked: &mut Vec<NodeId>) -> Result<()> {
        let subchapters: Vec<i64> = unlocked
            .iter()
            .filter(|id| id.kind == EntityKind::Subchapter)
            .map(|id| id.id)
            .collect();

        for subchapter_id in subchapters {
            let lesson_tree = build_subchapter_tree(&self.db, learner, subchapter_id).await?;
            for id in get_next_in_progress_nodes(&lesson_tree) {
                push_unique(unlocked, id);
            }
        }
        Ok(())
    }

    async fn persist(
        &self,
        learner: Uuid,
        completed: &[NodeId],
        unlocked: &[NodeId],
    ) -> Result<()> {
        let done_ids = db_ids_from_nodes(completed)?;
        let in_progress_ids = db_ids_from_nodes(unlocked)?;

        let mut tx = self.db.begin().await?;
        let done = mark_entities(&mut *tx, learner, &done_ids, ProgressState::Done).await?;
        let started =
            mark_entities(&mut *tx, learner, &in_progress_ids, ProgressState::InProgress).await?;
        tx.commit().await?;

        debug!(
            "Persisted {} DONE and {} IN_PROGRESS rows for learner {}",
            done, started, learner
        );
        Ok(())
    }
}

fn lesson_in_tree(tree: &MindmapTree, subchapter_id: i64, lesson_id: i64) -> Result<&MindmapTree> {
    find_node(tree, &NodeId::lesson(lesson_id)).ok_or_else(|| {
        Error::NotFound(format!("lesson {} in subchapter {}", lesson_id, subchapter_id))
    })
}

fn all_done(tree: &MindmapTree) -> bool {
    tree.state() == ProgressState::Done && tree.children.iter().all(all_done)
}

fn push_unique(ids: &mut Vec<NodeId>, id: NodeId) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}
