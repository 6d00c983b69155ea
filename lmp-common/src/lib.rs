//! # LMP Common Library
//!
//! Shared code for the learning mindmap progress services:
//! - Mindmap progress engine (tree model, navigation, propagation, id codec)
//! - Tree builders over the progress database
//! - Database schema, models and progress writes
//! - Configuration loading
//! - Error types

pub mod builders;
pub mod config;
pub mod db;
pub mod error;
pub mod mindmap;

pub use error::{Error, Result};
pub use mindmap::{EntityKind, MindmapTree, NodeId, ProgressState};
