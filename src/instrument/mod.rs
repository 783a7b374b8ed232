//! Hook-and-aggregate engine.
//!
//! [`Instrumentation`] is the explicit context object owning all mutable
//! instrumentation state: the session, the level tracker, the task recorder,
//! the metric set of the current report cycle and the report submitter.
//! Lifecycle signals arrive through [`Instrumentation::observe`], either called
//! directly by an event-emitting host or by the hooks installed with
//! [`crate::hook::attach`].
//!
//! Nothing in here returns an error to the host. Inconsistencies (outcome
//! without a running level, missing host state, sink failures) are logged and
//! the engine keeps going.

pub mod level;
pub mod metrics;
pub mod submit;
pub mod task;

pub use level::{LevelOutcome, LevelRun, LevelState, LevelTracker, TaskSlot};
pub use metrics::MetricSet;
pub use submit::ReportSubmitter;
pub use task::{derive_expected_actual, TaskRecorder};

use crate::config::ResolvedConfig;
use crate::host::{Clock, GameView, IdProvider};
use crate::model::error::InstrumentError;
use crate::model::{LevelId, Report, Session, TaskRecord};
use crate::sink::AnalyticsSink;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Metric keys set by the engine.
pub mod metric_keys {
    /// `campaign` or `reflex`.
    pub const MODE: &str = "mode";
    /// Host level index of a campaign level.
    pub const LEVEL: &str = "level";
    /// Moves taken during the run.
    pub const MOVES: &str = "moves";
    /// Stars awarded by the host.
    pub const STARS: &str = "stars";
    /// Failure reason.
    pub const REASON: &str = "reason";
}

/// Context shared by hooks. Single-threaded.
pub type SharedInstrumentation = Rc<RefCell<Instrumentation>>;

// ===== Events =====

/// Why a level run failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The host's level timer ran out.
    Timeout,
    /// Any other host-declared reason.
    Other(String),
}

impl FailureReason {
    /// Value of the `reason` metric.
    pub fn as_metric(&self) -> &str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::Other(reason) => reason,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_metric())
    }
}

/// Lifecycle signal observed from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A campaign level began.
    LevelStarted {
        /// Host level index.
        level_index: u32,
    },
    /// Reflex mode began.
    ReflexStarted,
    /// The host resolved the two flipped items.
    MatchResolved {
        /// Whether they matched.
        correct: bool,
    },
    /// The campaign level was won.
    LevelCompleted,
    /// Reflex mode finished.
    ReflexCompleted,
    /// The host started its level timer.
    TimerStarted {
        /// Timer length in seconds.
        duration_secs: u64,
    },
    /// The host showed a user-facing notification.
    Notification {
        /// Human-readable message.
        message: String,
    },
    /// The host declared the level failed.
    LevelFailed {
        /// Structured reason.
        reason: FailureReason,
    },
}

/// Which kind of run is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Numbered campaign level.
    Campaign,
    /// Reflex mode.
    Reflex,
}

impl GameMode {
    /// Value of the `mode` metric.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Campaign => "campaign",
            GameMode::Reflex => "reflex",
        }
    }
}

// ===== Settings =====

/// Knobs of the engine, usually derived from [`ResolvedConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentSettings {
    /// Name passed to `sink.initialize`.
    pub app_name: String,
    /// Substring identifying a timeout notification.
    pub timeout_marker: String,
    /// Only treat notifications as timeouts after the host started its timer.
    pub require_timer_for_timeout: bool,
}

impl Default for InstrumentSettings {
    fn default() -> Self {
        Self::from(&ResolvedConfig::default())
    }
}

impl From<&ResolvedConfig> for InstrumentSettings {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
            timeout_marker: config.timeout_marker.clone(),
            require_timer_for_timeout: config.require_timer_for_timeout,
        }
    }
}

// ===== Instrumentation =====

/// All instrumentation state for one attach.
pub struct Instrumentation {
    settings: InstrumentSettings,
    session: Session,
    tracker: LevelTracker,
    tasks: TaskRecorder,
    metrics: MetricSet,
    submitter: ReportSubmitter,
    mode: Option<GameMode>,
    timer_armed: bool,
    clock: Rc<dyn Clock>,
    sink: Box<dyn AnalyticsSink>,
}

impl fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumentation")
            .field("session", &self.session)
            .field("tracker", &self.tracker)
            .field("metrics", &self.metrics)
            .field("mode", &self.mode)
            .field("timer_armed", &self.timer_armed)
            .finish_non_exhaustive()
    }
}

impl Instrumentation {
    /// Create the session and announce it to the sink.
    ///
    /// A failing `initialize` is logged; the context is usable regardless.
    pub fn attach(
        settings: InstrumentSettings,
        mut sink: Box<dyn AnalyticsSink>,
        clock: Rc<dyn Clock>,
        ids: &dyn IdProvider,
    ) -> Self {
        let session = Session::new(ids.next_session_id(), clock.now());

        if let Err(err) = sink.initialize(&settings.app_name, session.id()) {
            warn!(error = %err, "Sink rejected initialize");
        }
        info!(
            session_id = %session.id(),
            app_name = %settings.app_name,
            "Instrumentation attached"
        );

        Self {
            settings,
            session,
            tracker: LevelTracker::new(),
            tasks: TaskRecorder::new(),
            metrics: MetricSet::new(),
            submitter: ReportSubmitter::new(),
            mode: None,
            timer_armed: false,
            clock,
            sink,
        }
    }

    /// Wrap in the shared handle hooks expect.
    pub fn into_shared(self) -> SharedInstrumentation {
        Rc::new(RefCell::new(self))
    }

    /// Handle one lifecycle signal.
    ///
    /// Returns the report when the event closed a level run.
    pub fn observe(&mut self, view: &dyn GameView, event: &GameEvent) -> Option<Report> {
        match event {
            GameEvent::LevelStarted { level_index } => {
                self.begin_run(LevelId::campaign(*level_index), GameMode::Campaign);
                None
            }
            GameEvent::ReflexStarted => {
                self.begin_run(LevelId::reflex(), GameMode::Reflex);
                None
            }
            GameEvent::MatchResolved { correct } => {
                self.record_match(view, *correct);
                None
            }
            GameEvent::LevelCompleted => self.complete_campaign(view),
            GameEvent::ReflexCompleted => self.complete_reflex(view),
            GameEvent::TimerStarted { duration_secs } => {
                debug!(duration_secs, "Timer started; timeout detection armed");
                self.timer_armed = true;
                None
            }
            GameEvent::Notification { message } => self.check_notification(view, message),
            GameEvent::LevelFailed { reason } => self.fail(view, reason),
        }
    }

    /// Whether `message` carries the timeout marker.
    pub fn is_timeout_message(&self, message: &str) -> bool {
        !self.settings.timeout_marker.is_empty() && message.contains(&self.settings.timeout_marker)
    }

    // ===== Handlers =====

    fn begin_run(&mut self, level_id: LevelId, mode: GameMode) {
        let now = self.clock.now();
        if let Some(discarded) = self.tracker.start(level_id.clone(), now) {
            info!(
                level_id = %discarded.level_id(),
                "Level restarted before an outcome; previous run abandoned without report"
            );
        }
        self.submitter.begin_run();
        self.metrics.clear();
        self.mode = Some(mode);
        self.timer_armed = false;

        if let Err(err) = self.sink.start_level(&level_id) {
            warn!(level_id = %level_id, error = %err, "Sink rejected start_level");
        }
        debug!(level_id = %level_id, mode = mode.as_str(), "Level run started");
    }

    fn record_match(&mut self, view: &dyn GameView, correct: bool) -> Option<TaskRecord> {
        let now = self.clock.now();
        self.tasks
            .record(&mut self.tracker, view, correct, now, self.sink.as_mut())
    }

    fn complete_campaign(&mut self, view: &dyn GameView) -> Option<Report> {
        let level_index = read_host(view.current_level(), "current_level");
        let moves = read_host(view.moves(), "moves");

        if let (Some(index), Some(run)) = (level_index, self.tracker.current()) {
            let reported = LevelId::campaign(index);
            if run.level_id() != &reported {
                warn!(
                    tracked = %run.level_id(),
                    host = %reported,
                    "Host level index disagrees with the tracked level run"
                );
            }
        }

        let (xp, stars) = match (level_index, moves) {
            (Some(index), Some(moves)) => (
                view.campaign_xp(index, moves).unwrap_or(0),
                view.campaign_stars(index, moves),
            ),
            _ => (0, None),
        };

        self.metrics.set(metric_keys::MODE, GameMode::Campaign.as_str());
        if let Some(index) = level_index {
            self.metrics.set(metric_keys::LEVEL, index);
        }
        if let Some(moves) = moves {
            self.metrics.set(metric_keys::MOVES, moves);
        }
        if let Some(stars) = stars {
            self.metrics.set(metric_keys::STARS, stars);
        }

        let fallback = level_index.map_or_else(LevelId::unknown, LevelId::campaign);
        self.finish(true, xp, fallback)
    }

    fn complete_reflex(&mut self, view: &dyn GameView) -> Option<Report> {
        let moves = read_host(view.moves(), "moves");

        self.metrics.set(metric_keys::MODE, GameMode::Reflex.as_str());
        if let Some(moves) = moves {
            self.metrics.set(metric_keys::MOVES, moves);
            if let Some(stars) = view.reflex_stars(moves) {
                self.metrics.set(metric_keys::STARS, stars);
            }
        }

        self.finish(true, 0, LevelId::reflex())
    }

    fn check_notification(&mut self, view: &dyn GameView, message: &str) -> Option<Report> {
        if !self.is_timeout_message(message) {
            return None;
        }
        if self.settings.require_timer_for_timeout && !self.timer_armed {
            debug!(message, "Timeout-like notification ignored; no timer running");
            return None;
        }
        self.fail(view, &FailureReason::Timeout)
    }

    fn fail(&mut self, view: &dyn GameView, reason: &FailureReason) -> Option<Report> {
        self.timer_armed = false;

        if let Some(mode) = self.mode {
            self.metrics.set(metric_keys::MODE, mode.as_str());
        }
        self.metrics.set(metric_keys::REASON, reason.as_metric());

        let fallback = match self.mode {
            Some(GameMode::Reflex) => LevelId::reflex(),
            _ => view
                .current_level()
                .map_or_else(LevelId::unknown, LevelId::campaign),
        };
        self.finish(false, 0, fallback)
    }

    /// Close the run and submit. Exactly one report per run; a run that was
    /// never observed yields a zero-duration report for `fallback`.
    fn finish(&mut self, success: bool, xp: u64, fallback: LevelId) -> Option<Report> {
        let now = self.clock.now();
        match self.tracker.end(success, xp, now) {
            Some(outcome) => self.submitter.stage(outcome),
            None if self.submitter.has_submitted_for_run() => {
                warn!(success, "Duplicate outcome for an already reported level run");
                self.metrics.clear();
                return None;
            }
            None => {
                warn!(
                    level_id = %fallback,
                    "Outcome without an observed level start; reporting zero duration"
                );
                self.submitter.stage(LevelOutcome {
                    level_id: fallback,
                    success,
                    duration_ms: 0,
                    xp,
                });
            }
        }
        self.mode = None;
        self.submitter.submit(&mut self.metrics, self.sink.as_mut())
    }

    // ===== Accessors (read-only) =====

    /// Session created at attach.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Engine settings.
    pub fn settings(&self) -> &InstrumentSettings {
        &self.settings
    }

    /// Level tracker.
    pub fn tracker(&self) -> &LevelTracker {
        &self.tracker
    }

    /// Task recorder counters.
    pub fn tasks(&self) -> &TaskRecorder {
        &self.tasks
    }

    /// Metrics of the current report cycle.
    pub fn metrics(&self) -> &MetricSet {
        &self.metrics
    }

    /// Report submitter.
    pub fn submitter(&self) -> &ReportSubmitter {
        &self.submitter
    }

    /// Mode of the live run.
    pub fn mode(&self) -> Option<GameMode> {
        self.mode
    }

    /// Whether a timeout notification would currently be honored.
    pub fn timer_armed(&self) -> bool {
        self.timer_armed
    }
}

fn read_host<T>(value: Option<T>, what: &'static str) -> Option<T> {
    if value.is_none() {
        let err = InstrumentError::MissingHostState { what };
        warn!(error = %err, "Reading host state");
    }
    value
}
