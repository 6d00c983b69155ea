//! lmp-pa library - Progress Application
//!
//! Drives the mindmap progress engine against the progress database: builds
//! a learner's trees, runs completion and unlock propagation, and persists
//! the resulting states in one transaction per event.

pub mod progress;

pub use progress::{CompletionOutcome, ProgressApp};
