//! Script-driven replay of a play session.
//!
//! A script is JSON Lines, one [`ScriptStep`] per line:
//!
//! ```text
//! # level 1, one miss then a pair
//! {"op":"begin_level","level":1}
//! {"op":"flip","first":{"value":"A","target":"A"},"second":{"value":"B","target":"B"}}
//! {"op":"advance","ms":1200}
//! {"op":"resolve_match","correct":false}
//! {"op":"complete_level"}
//! ```
//!
//! [`run_replay`] drives a [`ScriptedGame`] whose operations are hooked by
//! [`crate::hook::attach`], so every step flows through the same wrappers a
//! real host would.

pub mod game;

pub use game::{GameState, ScriptedGame};

use crate::config::ResolvedConfig;
use crate::hook::{attach, ops};
use crate::host::{Clock, FlippedItem, IdProvider, ManualClock, UuidProvider};
use crate::instrument::{InstrumentSettings, Instrumentation};
use crate::model::error::ReplayError;
use crate::model::SessionId;
use crate::sink::AnalyticsSink;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::BufRead;
use std::rc::Rc;
use tracing::{debug, info};

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Call `begin_level(level)`.
    BeginLevel {
        /// Host level index.
        level: u32,
    },
    /// Call `begin_reflex()`.
    BeginReflex,
    /// Turn two cards face up. Not a hooked operation.
    Flip {
        /// First card.
        first: FlippedItem,
        /// Second card.
        second: FlippedItem,
    },
    /// Call `resolve_correct_match()` or `resolve_incorrect_match()`.
    ResolveMatch {
        /// Which of the two to call.
        correct: bool,
    },
    /// Call `complete_level()`.
    CompleteLevel,
    /// Call `complete_reflex()`.
    CompleteReflex,
    /// Call `start_timer(seconds)`.
    StartTimer {
        /// Timer length.
        seconds: u64,
    },
    /// Call `notify(message)`.
    Notify {
        /// Notification text.
        message: String,
    },
    /// Move the replay clock forward.
    Advance {
        /// Milliseconds to advance.
        ms: u64,
    },
}

/// Parse a JSONL script. Blank lines and `#` comments are skipped.
///
/// # Errors
///
/// `ReplayError::InvalidStep` with the 1-based line number of the first bad
/// line, or `ReplayError::Io` if reading fails.
pub fn parse_script<R: BufRead>(reader: R) -> Result<Vec<ScriptStep>, ReplayError> {
    let mut steps = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let step = serde_json::from_str(trimmed).map_err(|e| ReplayError::InvalidStep {
            line: index + 1,
            message: e.to_string(),
        })?;
        steps.push(step);
    }

    debug!(steps = steps.len(), "Replay script parsed");
    Ok(steps)
}

/// What a replay did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Session created for the replay.
    pub session_id: SessionId,
    /// Steps executed.
    pub steps_run: usize,
    /// Operations hooked.
    pub hooks_installed: Vec<&'static str>,
    /// Operations the game did not expose.
    pub hooks_skipped: Vec<&'static str>,
    /// Task records forwarded to the sink.
    pub tasks_recorded: u64,
    /// Reports handed to the sink.
    pub reports_submitted: u64,
}

/// Replay `steps` against a fresh [`ScriptedGame`] with a random session id.
///
/// # Errors
///
/// `ReplayError::Host` if a host operation fails, or
/// `ReplayError::ClockOverflow` if an `advance` step would push the replay
/// clock out of range. Instrumentation failures never abort a replay.
pub fn run_replay(
    steps: &[ScriptStep],
    config: &ResolvedConfig,
    sink: Box<dyn AnalyticsSink>,
) -> Result<ReplaySummary, ReplayError> {
    run_replay_with_ids(steps, config, sink, &UuidProvider)
}

/// [`run_replay`] with an explicit session id source.
///
/// # Errors
///
/// See [`run_replay`].
pub fn run_replay_with_ids(
    steps: &[ScriptStep],
    config: &ResolvedConfig,
    sink: Box<dyn AnalyticsSink>,
    ids: &dyn IdProvider,
) -> Result<ReplaySummary, ReplayError> {
    let clock = Rc::new(ManualClock::new(Utc::now()));
    let clock_handle: Rc<dyn Clock> = clock.clone();
    let ctx = Instrumentation::attach(InstrumentSettings::from(config), sink, clock_handle, ids)
        .into_shared();

    let mut game = ScriptedGame::new();
    let attached = attach(game.operations_mut(), &ctx);

    for (index, step) in steps.iter().enumerate() {
        debug!(step = index + 1, ?step, "Replaying step");
        match step {
            ScriptStep::Flip { first, second } => {
                game.state_mut().flip(first.clone(), second.clone());
            }
            ScriptStep::Advance { ms } => {
                let advanced = i64::try_from(*ms)
                    .ok()
                    .and_then(|delta| clock.advance_ms(delta));
                if advanced.is_none() {
                    return Err(ReplayError::ClockOverflow {
                        step: index + 1,
                        ms: *ms,
                    });
                }
            }
            other => {
                if let Some((name, args)) = operation_for(other) {
                    game.invoke(name, &args)?;
                }
            }
        }
    }

    let engine = ctx.borrow();
    let summary = ReplaySummary {
        session_id: engine.session().id().clone(),
        steps_run: steps.len(),
        hooks_installed: attached.installed,
        hooks_skipped: attached.skipped,
        tasks_recorded: engine.tasks().forwarded(),
        reports_submitted: engine.submitter().submitted_total(),
    };

    info!(
        session_id = %summary.session_id,
        steps = summary.steps_run,
        tasks = summary.tasks_recorded,
        reports = summary.reports_submitted,
        "Replay finished"
    );
    Ok(summary)
}

/// Host operation and arguments a step calls, `None` for non-operation steps.
fn operation_for(step: &ScriptStep) -> Option<(&'static str, Vec<Value>)> {
    let call = match step {
        ScriptStep::BeginLevel { level } => (ops::BEGIN_LEVEL, vec![json!(level)]),
        ScriptStep::BeginReflex => (ops::BEGIN_REFLEX, Vec::new()),
        ScriptStep::ResolveMatch { correct: true } => (ops::RESOLVE_CORRECT_MATCH, Vec::new()),
        ScriptStep::ResolveMatch { correct: false } => (ops::RESOLVE_INCORRECT_MATCH, Vec::new()),
        ScriptStep::CompleteLevel => (ops::COMPLETE_LEVEL, Vec::new()),
        ScriptStep::CompleteReflex => (ops::COMPLETE_REFLEX, Vec::new()),
        ScriptStep::StartTimer { seconds } => (ops::START_TIMER, vec![json!(seconds)]),
        ScriptStep::Notify { message } => (ops::NOTIFY, vec![json!(message)]),
        ScriptStep::Flip { .. } | ScriptStep::Advance { .. } => return None,
    };
    Some(call)
}
