//! Integration tests for lmp-pa progress flows
//!
//! Content used by most tests:
//!
//! chapter 1
//!   subchapter 10: lesson 100 -> [lesson 101 (pass-through) -> [lesson 103], lesson 102]
//!   subchapter 11: lesson 110
//! chapter 2
//!   subchapter 20: lesson 200 -> [lesson 204, lesson 201 (pass-through) -> [lesson 202]]
//! chapter 3
//!   subchapter 30: lesson 300 -> [lesson 301 -> [lesson 303], lesson 302]

use lmp_common::db::{create_schema, ensure_learner, fetch_state, init_database, mark_entities};
use lmp_common::mindmap::{DbIds, NodeId, ProgressState};
use lmp_common::Error;
use lmp_pa::{CompletionOutcome, ProgressApp};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

async fn seed_content(pool: &SqlitePool) {
    sqlx::query("INSERT INTO subjects (id, name) VALUES (1, 'Mathematics')")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        r#"
        INSERT INTO chapters (id, subject_id, name, position) VALUES
            (1, 1, 'Algebra', 1),
            (2, 1, 'Geometry', 2),
            (3, 1, 'Statistics', 3)
        "#,
    )
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        r#"
        INSERT INTO subchapters (id, chapter_id, name, position) VALUES
            (10, 1, 'Basics', 1),
            (11, 1, 'Systems', 2),
            (20, 2, 'Shapes', 1),
            (30, 3, 'Averages', 1)
        "#,
    )
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        r#"
        INSERT INTO lessons (id, subchapter_id, parent_lesson_id, name, position, no_popup) VALUES
            (100, 10, NULL, 'Variables', 0, 0),
            (101, 10, 100, 'Balancing', 1, 1),
            (102, 10, 100, 'Substitution', 2, 0),
            (103, 10, 101, 'Both sides', 0, 0),
            (110, 11, NULL, 'Two unknowns', 0, 0),
            (200, 20, NULL, 'Points', 0, 0),
            (204, 20, 200, 'Lines', 1, 0),
            (201, 20, 200, 'Angles', 2, 1),
            (202, 20, 201, 'Right angles', 0, 0),
            (300, 30, NULL, 'Mean', 0, 0),
            (301, 30, 300, 'Median', 1, 0),
            (302, 30, 300, 'Mode', 2, 0),
            (303, 30, 301, 'Quartiles', 0, 0)
        "#,
    )
    .execute(pool)
    .await
    .unwrap();
}

/// Test helper: in-memory database with schema, content and one learner
async fn setup_app() -> (ProgressApp, Uuid) {
    // Single connection: every connection to sqlite::memory: is a separate database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    create_schema(&pool).await.unwrap();
    seed_content(&pool).await;

    let learner = Uuid::new_v4();
    ensure_learner(&pool, learner, "Ada").await.unwrap();

    (ProgressApp::new(pool), learner)
}

fn ids(list: &[&str]) -> Vec<NodeId> {
    list.iter().map(|s| s.parse().unwrap()).collect()
}

async fn state_of(app: &ProgressApp, learner: Uuid, id: &str) -> ProgressState {
    fetch_state(app.pool(), learner, id.parse().unwrap()).await.unwrap()
}

// =============================================================================
// Starting a chapter
// =============================================================================

#[tokio::test]
async fn test_start_chapter_unlocks_frontier() {
    let (app, learner) = setup_app().await;

    let unlocked = app.start_chapter(learner, 1).await.unwrap();

    assert_eq!(
        unlocked,
        ids(&["chapter|1", "subchapter|10", "lesson|100", "lesson|101", "lesson|103"])
    );
    for id in &unlocked {
        assert_eq!(state_of(&app, learner, &id.to_string()).await, ProgressState::InProgress);
    }
    assert_eq!(state_of(&app, learner, "subchapter|11").await, ProgressState::Locked);
    assert_eq!(state_of(&app, learner, "lesson|102").await, ProgressState::Locked);
}

#[tokio::test]
async fn test_start_chapter_twice_is_stable() {
    let (app, learner) = setup_app().await;

    app.start_chapter(learner, 1).await.unwrap();
    let second = app.start_chapter(learner, 1).await.unwrap();

    // Everything on the path is already in progress
    assert!(second.is_empty());
}

#[tokio::test]
async fn test_start_missing_chapter_fails() {
    let (app, learner) = setup_app().await;

    let result = app.start_chapter(learner, 99).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

// =============================================================================
// Completing lessons
// =============================================================================

#[tokio::test]
async fn test_walk_through_chapter() {
    let (app, learner) = setup_app().await;
    app.start_chapter(learner, 1).await.unwrap();

    // Root lesson first: lesson 101 is already in progress, 102 is next
    let outcome = app.complete_lesson(learner, 10, 100).await.unwrap();
    assert_eq!(
        outcome,
        CompletionOutcome {
            completed: ids(&["lesson|100"]),
            unlocked: ids(&["lesson|102"]),
            next_in_progress: Some(NodeId::lesson(102)),
        }
    );

    // Finishing 103 completes its parent 101 but not the root's other branch
    let outcome = app.complete_lesson(learner, 10, 103).await.unwrap();
    assert_eq!(outcome.completed, ids(&["lesson|103", "lesson|101"]));
    assert!(outcome.unlocked.is_empty());
    // Nothing new to unlock: back to the branch already in progress
    assert_eq!(outcome.next_in_progress, Some(NodeId::lesson(102)));
    assert_eq!(state_of(&app, learner, "lesson|101").await, ProgressState::Done);
    assert_eq!(state_of(&app, learner, "subchapter|10").await, ProgressState::InProgress);

    // Last lesson of subchapter 10 moves the learner into subchapter 11
    let outcome = app.complete_lesson(learner, 10, 102).await.unwrap();
    assert_eq!(outcome.completed, ids(&["lesson|102", "lesson|100", "subchapter|10"]));
    assert_eq!(outcome.unlocked, ids(&["subchapter|11", "lesson|110"]));
    assert_eq!(outcome.next_in_progress, Some(NodeId::lesson(110)));
    assert_eq!(state_of(&app, learner, "subchapter|10").await, ProgressState::Done);
    assert_eq!(state_of(&app, learner, "subchapter|11").await, ProgressState::InProgress);
    assert_eq!(state_of(&app, learner, "chapter|1").await, ProgressState::InProgress);

    // Last lesson of the chapter completes the chapter
    let outcome = app.complete_lesson(learner, 11, 110).await.unwrap();
    assert_eq!(outcome.completed, ids(&["lesson|110", "subchapter|11", "chapter|1"]));
    assert!(outcome.unlocked.is_empty());
    assert_eq!(outcome.next_in_progress, None);
    assert_eq!(state_of(&app, learner, "chapter|1").await, ProgressState::Done);
}

#[tokio::test]
async fn test_complete_skips_pass_through_lesson() {
    let (app, learner) = setup_app().await;
    let unlocked = app.start_chapter(learner, 2).await.unwrap();
    assert_eq!(unlocked, ids(&["chapter|2", "subchapter|20", "lesson|200", "lesson|204"]));

    let outcome = app.complete_lesson(learner, 20, 200).await.unwrap();

    assert_eq!(outcome.completed, ids(&["lesson|200", "lesson|201"]));
    assert_eq!(outcome.unlocked, ids(&["lesson|202"]));
    assert_eq!(outcome.next_in_progress, Some(NodeId::lesson(202)));
    assert_eq!(state_of(&app, learner, "lesson|201").await, ProgressState::Done);
    assert_eq!(state_of(&app, learner, "lesson|202").await, ProgressState::InProgress);
    assert_eq!(state_of(&app, learner, "lesson|204").await, ProgressState::InProgress);
}

#[tokio::test]
async fn test_complete_routes_to_lesson_already_in_progress() {
    let (app, learner) = setup_app().await;
    let unlocked = app.start_chapter(learner, 3).await.unwrap();
    assert_eq!(
        unlocked,
        ids(&["chapter|3", "subchapter|30", "lesson|300", "lesson|301", "lesson|303"])
    );

    // Successor is unlocked next to the branch started with the chapter
    let outcome = app.complete_lesson(learner, 30, 300).await.unwrap();
    assert_eq!(outcome.unlocked, ids(&["lesson|302"]));
    assert_eq!(outcome.next_in_progress, Some(NodeId::lesson(302)));

    // 301 has no locked child and no locked sibling, but its child is open
    let outcome = app.complete_lesson(learner, 30, 301).await.unwrap();
    assert_eq!(outcome.completed, ids(&["lesson|301"]));
    assert!(outcome.unlocked.is_empty());
    assert_eq!(outcome.next_in_progress, Some(NodeId::lesson(303)));
    assert_eq!(state_of(&app, learner, "lesson|303").await, ProgressState::InProgress);

    let outcome = app.complete_lesson(learner, 30, 303).await.unwrap();
    assert_eq!(outcome.next_in_progress, Some(NodeId::lesson(302)));

    // Only the end of the chapter leaves nowhere to go
    let outcome = app.complete_lesson(learner, 30, 302).await.unwrap();
    assert_eq!(
        outcome.completed,
        ids(&["lesson|302", "lesson|300", "subchapter|30", "chapter|3"])
    );
    assert_eq!(outcome.next_in_progress, None);
}

#[tokio::test]
async fn test_complete_subchapter_routes_into_started_subchapter() {
    let (app, learner) = setup_app().await;
    app.start_chapter(learner, 1).await.unwrap();

    // Subchapter 11 and its lesson were opened before subchapter 10 was finished
    let mut conn = app.pool().acquire().await.unwrap();
    let started = DbIds {
        subchapters: vec![11],
        lessons: vec![110],
        ..DbIds::default()
    };
    mark_entities(&mut *conn, learner, &started, ProgressState::InProgress)
        .await
        .unwrap();
    drop(conn);

    app.complete_lesson(learner, 10, 100).await.unwrap();
    app.complete_lesson(learner, 10, 103).await.unwrap();
    let outcome = app.complete_lesson(learner, 10, 102).await.unwrap();

    assert_eq!(
        outcome.completed,
        ids(&["lesson|102", "lesson|100", "subchapter|10"])
    );
    assert!(outcome.unlocked.is_empty());
    assert_eq!(outcome.next_in_progress, Some(NodeId::lesson(110)));
}

#[tokio::test]
async fn test_next_lesson_does_not_write() {
    let (app, learner) = setup_app().await;
    app.start_chapter(learner, 2).await.unwrap();

    let next = app.next_lesson(learner, 20, 200).await.unwrap();

    assert_eq!(next.completed, Some(NodeId::lesson(201)));
    assert_eq!(next.next_in_progress, Some(NodeId::lesson(202)));
    assert_eq!(state_of(&app, learner, "lesson|200").await, ProgressState::InProgress);
    assert_eq!(state_of(&app, learner, "lesson|201").await, ProgressState::Locked);
}

#[tokio::test]
async fn test_complete_lesson_outside_subchapter_fails() {
    let (app, learner) = setup_app().await;
    app.start_chapter(learner, 1).await.unwrap();

    let result = app.complete_lesson(learner, 10, 110).await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    // Nothing was written
    assert_eq!(state_of(&app, learner, "lesson|110").await, ProgressState::Locked);
}

#[tokio::test]
async fn test_progress_is_per_learner() {
    let (app, learner) = setup_app().await;
    let other = Uuid::new_v4();
    ensure_learner(app.pool(), other, "Grace").await.unwrap();

    app.start_chapter(learner, 1).await.unwrap();
    app.complete_lesson(learner, 10, 100).await.unwrap();

    let tree = app.subchapter_tree(other, 10).await.unwrap();
    assert_eq!(tree.state(), ProgressState::Locked);

    let tree = app.subchapter_tree(learner, 10).await.unwrap();
    assert_eq!(tree.state(), ProgressState::Done);
}

#[tokio::test]
async fn test_chapter_tree_view() {
    let (app, learner) = setup_app().await;
    app.start_chapter(learner, 1).await.unwrap();

    let tree = app.chapter_tree(learner, 1).await.unwrap();

    assert_eq!(tree.state(), ProgressState::InProgress);
    assert_eq!(tree.children.len(), 2);
    assert_eq!(tree.children[0].state(), ProgressState::InProgress);
    assert_eq!(tree.children[1].state(), ProgressState::Locked);
}

#[tokio::test]
async fn test_flow_on_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("lmp.db")).await.unwrap();
    seed_content(&pool).await;

    let learner = Uuid::new_v4();
    ensure_learner(&pool, learner, "Ada").await.unwrap();

    let app = ProgressApp::new(pool);
    app.start_chapter(learner, 1).await.unwrap();
    let outcome = app.complete_lesson(learner, 10, 100).await.unwrap();

    assert_eq!(outcome.next_in_progress, Some(NodeId::lesson(102)));
    assert_eq!(state_of(&app, learner, "lesson|100").await, ProgressState::Done);
}
