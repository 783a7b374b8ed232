//! Analytics sink boundary.
//!
//! The sink is the only external system the instrumentation talks to. Transport
//! is up to the implementor. This module provides the interface plus two sinks:
//! - [`RecordingSink`] keeps every call in memory (tests, embedding hosts)
//! - [`JsonlSink`] writes every call as one JSON line

use crate::model::error::SinkError;
use crate::model::{LevelId, SessionId, TaskRecord};
use serde::Serialize;

pub mod jsonl;
pub mod recording;

pub use jsonl::JsonlSink;
pub use recording::RecordingSink;

/// External analytics sink.
///
/// Per outcome the instrumentation calls `end_level`, then `add_raw_metric`
/// once per metric, then `submit_report`.
pub trait AnalyticsSink {
    /// Announce the application and the session id of this attach.
    fn initialize(&mut self, app_name: &str, session_id: &SessionId) -> Result<(), SinkError>;

    /// A level run began.
    fn start_level(&mut self, level_id: &LevelId) -> Result<(), SinkError>;

    /// One match attempt inside the current level.
    fn record_task(&mut self, task: &TaskRecord) -> Result<(), SinkError>;

    /// The current level run ended.
    fn end_level(
        &mut self,
        level_id: &LevelId,
        success: bool,
        duration_ms: u64,
        xp: u64,
    ) -> Result<(), SinkError>;

    /// Attach a free-form metric to the pending report.
    fn add_raw_metric(&mut self, key: &str, value: &str) -> Result<(), SinkError>;

    /// Finalize and hand off the pending report.
    fn submit_report(&mut self) -> Result<(), SinkError>;
}

/// One sink call, as recorded or serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum SinkRecord {
    /// `initialize(appName, sessionId)`
    Initialize {
        /// Application name.
        app_name: String,
        /// Session of this attach.
        session_id: SessionId,
    },
    /// `startLevel(levelId)`
    StartLevel {
        /// Level that began.
        level_id: LevelId,
    },
    /// `recordTask(...)`
    RecordTask(TaskRecord),
    /// `endLevel(levelId, success, durationMs, xp)`
    EndLevel {
        /// Level that ended.
        level_id: LevelId,
        /// Win or failure.
        success: bool,
        /// Run duration.
        duration_ms: u64,
        /// XP read from the host.
        xp: u64,
    },
    /// `addRawMetric(key, value)`
    AddRawMetric {
        /// Metric name.
        key: String,
        /// Stringified value.
        value: String,
    },
    /// `submitReport()`
    SubmitReport,
}

impl SinkRecord {
    /// Method name of the call this record stands for.
    pub fn call_name(&self) -> &'static str {
        match self {
            SinkRecord::Initialize { .. } => "initialize",
            SinkRecord::StartLevel { .. } => "start_level",
            SinkRecord::RecordTask(_) => "record_task",
            SinkRecord::EndLevel { .. } => "end_level",
            SinkRecord::AddRawMetric { .. } => "add_raw_metric",
            SinkRecord::SubmitReport => "submit_report",
        }
    }
}
