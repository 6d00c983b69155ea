//! Database schema, models and progress queries

pub mod init;
pub mod models;
pub mod progress;

pub use init::*;
pub use models::*;
pub use progress::*;
