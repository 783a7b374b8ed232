//! Task records: one per observed match attempt.

use crate::model::{LevelId, TaskId};
use serde::Serialize;

/// Sentinel used for any item attribute the host could not provide.
pub const UNKNOWN_VALUE: &str = "unknown";

/// Label of a task produced by a correct match.
pub const CORRECT_MATCH_LABEL: &str = "correct_match";

/// Label of a task produced by an incorrect match.
pub const INCORRECT_MATCH_LABEL: &str = "incorrect_match";

/// Structured representation of one match attempt within a level run.
///
/// Immutable once created; handed to the sink and not retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    /// Level the attempt belongs to.
    pub level_id: LevelId,
    /// `task_<n>`, strictly increasing within the level run.
    pub task_id: TaskId,
    /// `correct_match` or `incorrect_match`.
    pub label: String,
    /// Value the player should have matched.
    pub expected: String,
    /// Value the player actually revealed.
    pub actual: String,
    /// Time since the previous task (or the level start for the first task).
    pub time_taken_ms: u64,
    /// XP the host awarded for this attempt, 0 when unknown.
    pub xp_earned: u64,
}
