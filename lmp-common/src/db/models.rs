//! Database row models
//!
//! Flat rows joined with one learner's progress. `state` is the raw stored
//! value (or NULL when the learner has no row); the builders resolve it.

use serde::{Deserialize, Serialize};

/// Lesson joined with the learner's `lesson_progress` row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LessonProgressRow {
    pub id: i64,
    pub parent_lesson_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub no_popup: bool,
    pub state: Option<String>,
}

/// Subchapter joined with the learner's `subchapter_progress` row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubchapterProgressRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub no_popup: bool,
    pub state: Option<String>,
}

/// Chapter joined with the learner's `chapter_progress` row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChapterProgressRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub state: Option<String>,
}
