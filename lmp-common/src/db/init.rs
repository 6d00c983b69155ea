//! Database initialization
//!
//! Creates the content and per-learner progress tables. Every statement is
//! idempotent, so opening an existing database runs the same path.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every connection
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// Open (creating if needed) the database and ensure the schema exists
///
/// Journal mode, busy timeout and foreign key enforcement are connection
/// options, so every pooled connection gets them.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent)
///
/// Split out from [`init_database`] so in-memory test pools can share it.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_learners_table(pool).await?;

    // Curriculum content
    create_subjects_table(pool).await?;
    create_chapters_table(pool).await?;
    create_subchapters_table(pool).await?;
    create_lessons_table(pool).await?;

    // Per-learner progress
    create_progress_table(pool, "chapter_progress", "chapter_id", "chapters").await?;
    create_progress_table(pool, "subchapter_progress", "subchapter_id", "subchapters").await?;
    create_progress_table(pool, "lesson_progress", "lesson_id", "lessons").await?;

    Ok(())
}

async fn create_learners_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS learners (
            guid TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_subjects_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subjects (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            image_url TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_chapters_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chapters (
            id INTEGER PRIMARY KEY,
            subject_id INTEGER REFERENCES subjects(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            image_url TEXT,
            position INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_subchapters_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subchapters (
            id INTEGER PRIMARY KEY,
            chapter_id INTEGER NOT NULL REFERENCES chapters(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            image_url TEXT,
            position INTEGER NOT NULL DEFAULT 0,
            no_popup INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_subchapters_chapter ON subchapters(chapter_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_lessons_table(pool: &SqlitePool) -> Result<()> {
    // parent_lesson_id is not a foreign key: a dangling reference must reach
    // the tree builder, which rejects it
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lessons (
            id INTEGER PRIMARY KEY,
            subchapter_id INTEGER NOT NULL REFERENCES subchapters(id) ON DELETE CASCADE,
            parent_lesson_id INTEGER,
            name TEXT NOT NULL,
            description TEXT,
            image_url TEXT,
            position INTEGER NOT NULL DEFAULT 0,
            no_popup INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_lessons_subchapter ON lessons(subchapter_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_progress_table(
    pool: &SqlitePool,
    table: &str,
    entity_column: &str,
    entity_table: &str,
) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            learner_guid TEXT NOT NULL REFERENCES learners(guid) ON DELETE CASCADE,
            {entity_column} INTEGER NOT NULL REFERENCES {entity_table}(id) ON DELETE CASCADE,
            state TEXT NOT NULL DEFAULT 'LOCKED',
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (learner_guid, {entity_column})
        )
        "#
    );
    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}
