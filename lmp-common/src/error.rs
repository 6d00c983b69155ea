//! Common error types for LMP

use thiserror::Error;

/// Common result type for LMP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across LMP crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input, e.g. a composite id with a non-numeric suffix
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Composite id whose kind has no storage bucket
    #[error("Unknown entity kind in mindmap id: {0}")]
    UnknownEntityKind(String),

    /// Subchapter has lessons but none of them is parentless
    #[error("No root lesson found for subchapter {subchapter_id}")]
    MissingRoot { subchapter_id: i64 },

    /// Subchapter has more than one parentless lesson
    #[error("Subchapter {subchapter_id} has {count} root lessons, expected exactly one")]
    MultipleRoots { subchapter_id: i64, count: usize },

    /// Lesson references a parent outside its subchapter
    #[error("Lesson {lesson_id} has parent lesson {parent_id} outside its subchapter")]
    DanglingParent { lesson_id: i64, parent_id: i64 },

    /// Lessons that cannot be reached from the root (parent cycle)
    #[error("Subchapter {subchapter_id} has {count} lessons unreachable from the root lesson")]
    DisconnectedLessons { subchapter_id: i64, count: usize },
}
