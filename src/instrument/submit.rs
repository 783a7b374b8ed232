//! Report finalization and hand-off.

use super::level::LevelOutcome;
use super::metrics::MetricSet;
use crate::model::Report;
use crate::sink::AnalyticsSink;
use tracing::{info, warn};

/// Assembles reports and hands them to the sink at most once per level run.
///
/// The "already submitted" flag is reset by [`ReportSubmitter::begin_run`], which
/// the context calls on every level start.
#[derive(Debug, Clone, Default)]
pub struct ReportSubmitter {
    pending: Option<LevelOutcome>,
    submitted_for_run: bool,
    submitted_total: u64,
}

impl ReportSubmitter {
    /// Submitter with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new level run began: forget any staged outcome and re-arm submission.
    pub fn begin_run(&mut self) {
        if let Some(stale) = self.pending.take() {
            warn!(level_id = %stale.level_id, "Dropping staged outcome that was never submitted");
        }
        self.submitted_for_run = false;
    }

    /// Stage the outcome the next [`submit`](Self::submit) will report.
    pub fn stage(&mut self, outcome: LevelOutcome) {
        self.pending = Some(outcome);
    }

    /// Build the report from the staged outcome and `metrics`, and hand it off.
    ///
    /// Returns `None` without touching the sink if this run was already
    /// reported or nothing is staged. Sink failures are logged; the report
    /// still counts as handed off.
    pub fn submit(
        &mut self,
        metrics: &mut MetricSet,
        sink: &mut dyn AnalyticsSink,
    ) -> Option<Report> {
        if self.submitted_for_run {
            warn!("Report already submitted for this level run; ignoring duplicate");
            return None;
        }
        let Some(outcome) = self.pending.take() else {
            warn!("Submit requested with no level outcome staged");
            return None;
        };

        let report = Report {
            level_id: outcome.level_id,
            success: outcome.success,
            duration_ms: outcome.duration_ms,
            xp: outcome.xp,
            metrics: metrics.take(),
        };

        hand_off(&report, sink);
        self.submitted_for_run = true;
        self.submitted_total += 1;

        info!(
            level_id = %report.level_id,
            success = report.success,
            duration_ms = report.duration_ms,
            xp = report.xp,
            metrics = report.metrics.len(),
            "Level report submitted"
        );

        Some(report)
    }

    /// Whether the current run already produced its report.
    pub fn has_submitted_for_run(&self) -> bool {
        self.submitted_for_run
    }

    /// Reports handed off since attach.
    pub fn submitted_total(&self) -> u64 {
        self.submitted_total
    }
}

fn hand_off(report: &Report, sink: &mut dyn AnalyticsSink) {
    if let Err(err) = sink.end_level(
        &report.level_id,
        report.success,
        report.duration_ms,
        report.xp,
    ) {
        warn!(error = %err, "Sink rejected end_level");
    }

    for (key, value) in report.metrics.iter() {
        if let Err(err) = sink.add_raw_metric(key, value) {
            warn!(key, error = %err, "Sink rejected metric");
        }
    }

    if let Err(err) = sink.submit_report() {
        warn!(error = %err, "Sink rejected submit_report");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LevelId;
    use crate::sink::{RecordingSink, SinkRecord};

    fn win(xp: u64) -> LevelOutcome {
        LevelOutcome {
            level_id: LevelId::campaign(1),
            success: true,
            duration_ms: 1_000,
            xp,
        }
    }

    #[test]
    fn submit_hands_off_once_per_run() {
        let sink = RecordingSink::new();
        let mut owned = sink.clone();
        let mut submitter = ReportSubmitter::new();
        let mut metrics = MetricSet::new();

        submitter.stage(win(50));
        let first = submitter.submit(&mut metrics, &mut owned);
        let second = submitter.submit(&mut metrics, &mut owned);

        let report = first.expect("first submit produces a report");
        assert!(report.success);
        assert_eq!(report.xp, 50);
        assert!(second.is_none());
        assert_eq!(sink.submitted_reports().len(), 1);
        assert_eq!(submitter.submitted_total(), 1);
    }

    #[test]
    fn restaging_in_same_run_is_still_blocked() {
        let sink = RecordingSink::new();
        let mut owned = sink.clone();
        let mut submitter = ReportSubmitter::new();
        let mut metrics = MetricSet::new();

        submitter.stage(win(10));
        submitter.submit(&mut metrics, &mut owned);
        submitter.stage(win(20));

        assert!(submitter.submit(&mut metrics, &mut owned).is_none());
        assert_eq!(sink.submitted_reports().len(), 1);
    }

    #[test]
    fn begin_run_rearms_submission() {
        let sink = RecordingSink::new();
        let mut owned = sink.clone();
        let mut submitter = ReportSubmitter::new();
        let mut metrics = MetricSet::new();

        submitter.stage(win(10));
        submitter.submit(&mut metrics, &mut owned);
        submitter.begin_run();
        submitter.stage(win(20));

        assert!(submitter.submit(&mut metrics, &mut owned).is_some());
        assert_eq!(sink.submitted_reports().len(), 2);
    }

    #[test]
    fn metrics_are_merged_in_key_order_and_cleared() {
        let sink = RecordingSink::new();
        let mut owned = sink.clone();
        let mut submitter = ReportSubmitter::new();
        let mut metrics = MetricSet::new();
        metrics.set("moves", 12);
        metrics.set("mode", "campaign");

        submitter.stage(win(0));
        submitter.submit(&mut metrics, &mut owned);

        assert!(metrics.is_empty());
        let calls: Vec<_> = sink.records().iter().map(SinkRecord::call_name).collect();
        assert_eq!(
            calls,
            vec!["end_level", "add_raw_metric", "add_raw_metric", "submit_report"]
        );
        match &sink.records()[1] {
            SinkRecord::AddRawMetric { key, .. } => assert_eq!(key, "mode"),
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn submit_with_nothing_staged_is_a_noop() {
        let sink = RecordingSink::new();
        let mut owned = sink.clone();
        let mut submitter = ReportSubmitter::new();

        assert!(submitter
            .submit(&mut MetricSet::new(), &mut owned)
            .is_none());
        assert!(sink.records().is_empty());
    }

    #[test]
    fn sink_failure_still_counts_as_submitted() {
        let sink = RecordingSink::new();
        sink.fail_on("end_level");
        let mut owned = sink.clone();
        let mut submitter = ReportSubmitter::new();

        submitter.stage(win(5));
        let report = submitter.submit(&mut MetricSet::new(), &mut owned);

        assert!(report.is_some());
        assert!(submitter.has_submitted_for_run());
        assert_eq!(sink.records(), vec![SinkRecord::SubmitReport]);
    }
}
