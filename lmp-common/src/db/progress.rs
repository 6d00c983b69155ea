//! Progress queries
//!
//! Reads content rows joined with one learner's progress, and batch writes
//! of progress states. Writes take a connection so callers can group them
//! in one transaction.

use super::models::{ChapterProgressRow, LessonProgressRow, SubchapterProgressRow};
use crate::mindmap::{DbIds, EntityKind, NodeId, ProgressState};
use crate::{Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

/// Progress table and entity column for a kind, `None` for subjects
pub fn progress_table(kind: EntityKind) -> Option<(&'static str, &'static str)> {
    match kind {
        EntityKind::Lesson => Some(("lesson_progress", "lesson_id")),
        EntityKind::Subchapter => Some(("subchapter_progress", "subchapter_id")),
        EntityKind::Chapter => Some(("chapter_progress", "chapter_id")),
        EntityKind::Subject => None,
    }
}

/// Register a learner (no-op if the guid already exists)
pub async fn ensure_learner(pool: &SqlitePool, learner: Uuid, display_name: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO learners (guid, display_name) VALUES (?, ?)")
        .bind(learner.to_string())
        .bind(display_name)
        .execute(pool)
        .await?;

    Ok(())
}

/// All lessons of a subchapter with the learner's progress
///
/// Ordered by `position`, then `id`; the tree builder keeps this order for
/// siblings.
pub async fn fetch_lesson_rows(
    pool: &SqlitePool,
    learner: Uuid,
    subchapter_id: i64,
) -> Result<Vec<LessonProgressRow>> {
    let rows = sqlx::query_as::<_, LessonProgressRow>(
        r#"
        SELECT l.id, l.parent_lesson_id, l.name, l.description, l.image_url, l.no_popup,
               lp.state
        FROM lessons l
        LEFT JOIN lesson_progress lp
               ON lp.lesson_id = l.id AND lp.learner_guid = ?
        WHERE l.subchapter_id = ?
        ORDER BY l.position ASC, l.id ASC
        "#,
    )
    .bind(learner.to_string())
    .bind(subchapter_id)
    .fetch_all(pool)
    .await?;

    debug!("Fetched {} lesson rows for subchapter {}", rows.len(), subchapter_id);
    Ok(rows)
}

/// A chapter with the learner's progress, `None` if the chapter does not exist
pub async fn fetch_chapter_row(
    pool: &SqlitePool,
    learner: Uuid,
    chapter_id: i64,
) -> Result<Option<ChapterProgressRow>> {
    let row = sqlx::query_as::<_, ChapterProgressRow>(
        r#"
        SELECT c.id, c.name, c.description, c.image_url, cp.state
        FROM chapters c
        LEFT JOIN chapter_progress cp
               ON cp.chapter_id = c.id AND cp.learner_guid = ?
        WHERE c.id = ?
        "#,
    )
    .bind(learner.to_string())
    .bind(chapter_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Subchapters of a chapter with the learner's progress, in display order
pub async fn fetch_subchapter_rows(
    pool: &SqlitePool,
    learner: Uuid,
    chapter_id: i64,
) -> Result<Vec<SubchapterProgressRow>> {
    let rows = sqlx::query_as::<_, SubchapterProgressRow>(
        r#"
        SELECT s.id, s.name, s.description, s.image_url, s.no_popup, sp.state
        FROM subchapters s
        LEFT JOIN subchapter_progress sp
               ON sp.subchapter_id = s.id AND sp.learner_guid = ?
        WHERE s.chapter_id = ?
        ORDER BY s.position ASC, s.id ASC
        "#,
    )
    .bind(learner.to_string())
    .bind(chapter_id)
    .fetch_all(pool)
    .await?;

    debug!("Fetched {} subchapter rows for chapter {}", rows.len(), chapter_id);
    Ok(rows)
}

/// Stored state of one node for a learner (resolved, so never-visited is `Locked`)
pub async fn fetch_state(pool: &SqlitePool, learner: Uuid, node: NodeId) -> Result<ProgressState> {
    let (table, column) =
        progress_table(node.kind).ok_or_else(|| Error::UnknownEntityKind(node.to_string()))?;

    let raw: Option<String> = sqlx::query_scalar(&format!(
        "SELECT state FROM {} WHERE learner_guid = ? AND {} = ?",
        table, column
    ))
    .bind(learner.to_string())
    .bind(node.id)
    .fetch_optional(pool)
    .await?;

    Ok(ProgressState::resolve(raw.as_deref()))
}

/// Upsert `state` for every id in `ids`, scoped to one learner
///
/// Returns the number of rows written.
pub async fn mark_entities(
    conn: &mut SqliteConnection,
    learner: Uuid,
    ids: &DbIds,
    state: ProgressState,
) -> Result<u64> {
    let buckets = [
        (EntityKind::Lesson, &ids.lessons),
        (EntityKind::Subchapter, &ids.subchapters),
        (EntityKind::Chapter, &ids.chapters),
    ];

    let learner_guid = learner.to_string();
    let now = chrono::Utc::now();
    let mut written = 0;

    for (kind, entity_ids) in buckets {
        let Some((table, column)) = progress_table(kind) else {
            continue;
        };

        let sql = format!(
            r#"
            INSERT INTO {table} (learner_guid, {column}, state, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (learner_guid, {column})
            DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at
            "#
        );

        for entity_id in entity_ids {
            let result = sqlx::query(&sql)
                .bind(&learner_guid)
                .bind(*entity_id)
                .bind(state.to_db_string())
                .bind(now)
                .execute(&mut *conn)
                .await?;
            written += result.rows_affected();
        }
    }

    debug!("Marked {} progress rows {} for learner {}", written, state, learner);
    Ok(written)
}

/// Chapter a subchapter belongs to, `None` if the subchapter does not exist
pub async fn fetch_subchapter_chapter_id(
    pool: &SqlitePool,
    subchapter_id: i64,
) -> Result<Option<i64>> {
    let chapter_id: Option<i64> =
        sqlx::query_scalar("SELECT chapter_id FROM subchapters WHERE id = ?")
            .bind(subchapter_id)
            .fetch_optional(pool)
            .await?;

    Ok(chapter_id)
}
