//! Level life-cycle tracking.
//!
//! LevelState is a sum type over the two possible states:
//! - Idle: no level is being played
//! - Running: a level run is live
//!
//! An outcome always returns to Idle; nothing about an ended run is retained.

use crate::host::elapsed_ms;
use crate::model::{LevelId, TaskId};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

// ===== LevelRun =====

/// The level currently being played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRun {
    level_id: LevelId,
    started_at: DateTime<Utc>,
    task_count: u32,
    last_activity_at: DateTime<Utc>,
}

impl LevelRun {
    fn new(level_id: LevelId, started_at: DateTime<Utc>) -> Self {
        Self {
            level_id,
            started_at,
            task_count: 0,
            last_activity_at: started_at,
        }
    }

    /// Level identity.
    pub fn level_id(&self) -> &LevelId {
        &self.level_id
    }

    /// When the start signal was observed.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Tasks recorded so far in this run.
    pub fn task_count(&self) -> u32 {
        self.task_count
    }
}

// ===== LevelState =====

/// Tracker state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LevelState {
    /// No level is live.
    #[default]
    Idle,
    /// A level run is live.
    Running(LevelRun),
}

// ===== Outputs =====

/// Slot allocated for one task of the running level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSlot {
    /// Level the task belongs to.
    pub level_id: LevelId,
    /// Next id in the run's sequence.
    pub task_id: TaskId,
    /// Gap since the previous task, or since the level start.
    pub time_taken_ms: u64,
}

/// Report skeleton produced when a run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelOutcome {
    /// Level that ended.
    pub level_id: LevelId,
    /// Win or failure.
    pub success: bool,
    /// `now - started_at`, clamped at zero.
    pub duration_ms: u64,
    /// XP read from the host.
    pub xp: u64,
}

// ===== LevelTracker =====

/// Owns "the level currently being played".
#[derive(Debug, Clone, Default)]
pub struct LevelTracker {
    state: LevelState,
}

impl LevelTracker {
    /// Idle tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a run. Any live run is discarded (last start wins) and returned.
    pub fn start(&mut self, level_id: LevelId, now: DateTime<Utc>) -> Option<LevelRun> {
        let previous = std::mem::replace(
            &mut self.state,
            LevelState::Running(LevelRun::new(level_id, now)),
        );
        match previous {
            LevelState::Running(run) => {
                debug!(
                    level_id = %run.level_id,
                    tasks = run.task_count,
                    "Discarding unterminated level run"
                );
                Some(run)
            }
            LevelState::Idle => None,
        }
    }

    /// Allocate the next task id of the running level.
    ///
    /// Returns `None` (and logs) when idle.
    pub fn record_task(&mut self, now: DateTime<Utc>) -> Option<TaskSlot> {
        let LevelState::Running(run) = &mut self.state else {
            warn!("Task observed while no level is running");
            return None;
        };

        let sequence = run.task_count.saturating_add(1);
        let task_id = TaskId::from_sequence(sequence).ok()?;
        let time_taken_ms = elapsed_ms(run.last_activity_at, now);
        run.task_count = sequence;
        run.last_activity_at = now;

        Some(TaskSlot {
            level_id: run.level_id.clone(),
            task_id,
            time_taken_ms,
        })
    }

    /// Close the running level and return to Idle.
    ///
    /// Returns `None` (and logs) when idle.
    pub fn end(&mut self, success: bool, xp: u64, now: DateTime<Utc>) -> Option<LevelOutcome> {
        match std::mem::take(&mut self.state) {
            LevelState::Running(run) => Some(LevelOutcome {
                duration_ms: elapsed_ms(run.started_at, now),
                level_id: run.level_id,
                success,
                xp,
            }),
            LevelState::Idle => {
                warn!(success, "Level end observed while no level is running");
                None
            }
        }
    }

    // ===== Accessors (read-only) =====

    /// Current state.
    pub fn state(&self) -> &LevelState {
        &self.state
    }

    /// The live run, if any.
    pub fn current(&self) -> Option<&LevelRun> {
        match &self.state {
            LevelState::Running(run) => Some(run),
            LevelState::Idle => None,
        }
    }

    /// True while a run is live.
    pub fn is_running(&self) -> bool {
        matches!(self.state, LevelState::Running(_))
    }
}
