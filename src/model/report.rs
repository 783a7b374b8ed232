//! Finalized level reports.

use crate::instrument::metrics::MetricSet;
use crate::model::LevelId;
use serde::Serialize;

/// Terminal artifact of one level run.
///
/// Created and handed to the sink exactly once per observed outcome,
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Level the run belonged to.
    pub level_id: LevelId,
    /// Win (`true`) or failure (`false`).
    pub success: bool,
    /// Outcome timestamp minus start timestamp, never negative.
    pub duration_ms: u64,
    /// XP read from the host, 0 when unavailable.
    pub xp: u64,
    /// Metrics accumulated during this report cycle.
    pub metrics: MetricSet,
}
