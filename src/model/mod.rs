//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod error;
pub mod identifiers;
pub mod report;
pub mod session;
pub mod task;

// Re-export for convenience
pub use identifiers::{
    InvalidLevelId, InvalidSessionId, InvalidTaskId, LevelId, SessionId, TaskId,
};
pub use report::Report;
pub use session::Session;
pub use task::{TaskRecord, CORRECT_MATCH_LABEL, INCORRECT_MATCH_LABEL, UNKNOWN_VALUE};
