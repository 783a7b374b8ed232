//! Match attempt → task record conversion.

use super::level::LevelTracker;
use crate::host::{FlippedItem, GameView};
use crate::model::{TaskRecord, CORRECT_MATCH_LABEL, INCORRECT_MATCH_LABEL, UNKNOWN_VALUE};
use crate::sink::AnalyticsSink;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Derive `(expected, actual)` from the flipped items of one match attempt.
///
/// Correct match: both come from the observed values (equal by definition).
/// Incorrect match: the first item's declared target against the second item's value.
/// Anything unreadable becomes [`UNKNOWN_VALUE`].
pub fn derive_expected_actual(items: &[FlippedItem], correct: bool) -> (String, String) {
    let first = items.first();
    let second = items.get(1);

    let observed = |item: Option<&FlippedItem>| {
        item.and_then(|i| i.value.clone())
            .unwrap_or_else(|| UNKNOWN_VALUE.to_string())
    };

    if correct {
        (observed(first), observed(second))
    } else {
        let expected = first
            .and_then(|i| i.match_target.clone())
            .unwrap_or_else(|| UNKNOWN_VALUE.to_string());
        (expected, observed(second))
    }
}

/// Turns match attempts into [`TaskRecord`]s and forwards them to the sink.
#[derive(Debug, Clone, Default)]
pub struct TaskRecorder {
    forwarded: u64,
    sink_failures: u64,
}

impl TaskRecorder {
    /// Recorder with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one match attempt against the running level.
    ///
    /// Returns `None` when no level is running. A sink failure is logged and
    /// swallowed; the record is still returned.
    pub fn record(
        &mut self,
        tracker: &mut LevelTracker,
        view: &dyn GameView,
        correct: bool,
        now: DateTime<Utc>,
        sink: &mut dyn AnalyticsSink,
    ) -> Option<TaskRecord> {
        let items = view.flipped_items();
        if items.len() != 2 {
            warn!(
                flipped = items.len(),
                "Expected exactly two flipped items for a match attempt"
            );
        }

        let slot = tracker.record_task(now)?;
        let (expected, actual) = derive_expected_actual(&items, correct);
        let label = if correct {
            CORRECT_MATCH_LABEL
        } else {
            INCORRECT_MATCH_LABEL
        };

        let record = TaskRecord {
            level_id: slot.level_id,
            task_id: slot.task_id,
            label: label.to_string(),
            expected,
            actual,
            time_taken_ms: slot.time_taken_ms,
            xp_earned: view.match_xp(correct).unwrap_or(0),
        };

        match sink.record_task(&record) {
            Ok(()) => {
                self.forwarded += 1;
                debug!(
                    level_id = %record.level_id,
                    task_id = %record.task_id,
                    correct,
                    "Task recorded"
                );
            }
            Err(err) => {
                self.sink_failures += 1;
                warn!(task_id = %record.task_id, error = %err, "Sink rejected task record");
            }
        }

        Some(record)
    }

    /// Task records accepted by the sink.
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    /// Task records the sink rejected.
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures
    }
}
