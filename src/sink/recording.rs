//! In-memory sink.
//!
//! Clones share the same log, so a test can keep one handle while the
//! instrumentation owns another.

use super::{AnalyticsSink, SinkRecord};
use crate::instrument::metrics::MetricSet;
use crate::model::error::SinkError;
use crate::model::{LevelId, Report, SessionId, TaskRecord};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Default)]
struct RecordingState {
    records: Vec<SinkRecord>,
    failing_calls: HashSet<&'static str>,
}

/// Sink that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    state: Rc<RefCell<RecordingState>>,
}

impl RecordingSink {
    /// Empty sink accepting every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `call` (e.g. `"record_task"`) fail from now on. Failed calls are not recorded.
    pub fn fail_on(&self, call: &'static str) {
        self.state.borrow_mut().failing_calls.insert(call);
    }

    /// Every accepted call, in order.
    pub fn records(&self) -> Vec<SinkRecord> {
        self.state.borrow().records.clone()
    }

    /// Task records received so far.
    pub fn tasks(&self) -> Vec<TaskRecord> {
        self.state
            .borrow()
            .records
            .iter()
            .filter_map(|r| match r {
                SinkRecord::RecordTask(task) => Some(task.clone()),
                _ => None,
            })
            .collect()
    }

    /// Reports reassembled from `end_level` / `add_raw_metric` / `submit_report` sequences.
    ///
    /// A report counts once `submit_report` is seen after an `end_level`.
    pub fn submitted_reports(&self) -> Vec<Report> {
        let state = self.state.borrow();
        let mut reports = Vec::new();
        let mut pending: Option<Report> = None;

        for record in &state.records {
            match record {
                SinkRecord::EndLevel {
                    level_id,
                    success,
                    duration_ms,
                    xp,
                } => {
                    pending = Some(Report {
                        level_id: level_id.clone(),
                        success: *success,
                        duration_ms: *duration_ms,
                        xp: *xp,
                        metrics: MetricSet::new(),
                    });
                }
                SinkRecord::AddRawMetric { key, value } => {
                    if let Some(report) = pending.as_mut() {
                        report.metrics.set(key.clone(), value);
                    }
                }
                SinkRecord::SubmitReport => {
                    if let Some(report) = pending.take() {
                        reports.push(report);
                    }
                }
                _ => {}
            }
        }

        reports
    }

    fn push(&mut self, record: SinkRecord) -> Result<(), SinkError> {
        let mut state = self.state.borrow_mut();
        let call = record.call_name();
        if state.failing_calls.contains(call) {
            return Err(SinkError::Rejected {
                call,
                reason: "configured to fail".to_string(),
            });
        }
        state.records.push(record);
        Ok(())
    }
}

impl AnalyticsSink for RecordingSink {
    fn initialize(&mut self, app_name: &str, session_id: &SessionId) -> Result<(), SinkError> {
        self.push(SinkRecord::Initialize {
            app_name: app_name.to_string(),
            session_id: session_id.clone(),
        })
    }

    fn start_level(&mut self, level_id: &LevelId) -> Result<(), SinkError> {
        self.push(SinkRecord::StartLevel {
            level_id: level_id.clone(),
        })
    }

    fn record_task(&mut self, task: &TaskRecord) -> Result<(), SinkError> {
        self.push(SinkRecord::RecordTask(task.clone()))
    }

    fn end_level(
        &mut self,
        level_id: &LevelId,
        success: bool,
        duration_ms: u64,
        xp: u64,
    ) -> Result<(), SinkError> {
        self.push(SinkRecord::EndLevel {
            level_id: level_id.clone(),
            success,
            duration_ms,
            xp,
        })
    }

    fn add_raw_metric(&mut self, key: &str, value: &str) -> Result<(), SinkError> {
        self.push(SinkRecord::AddRawMetric {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn submit_report(&mut self) -> Result<(), SinkError> {
        self.push(SinkRecord::SubmitReport)
    }
}
