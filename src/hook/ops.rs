//! The host operations the instrumentation hooks, and attach.

use super::OperationTable;
use crate::host::GameView;
use crate::instrument::{GameEvent, SharedInstrumentation};
use crate::model::error::InstrumentError;
use serde_json::Value;
use std::rc::Rc;
use tracing::{info, warn};

/// `begin_level(levelIndex)`
pub const BEGIN_LEVEL: &str = "begin_level";
/// `begin_reflex()`
pub const BEGIN_REFLEX: &str = "begin_reflex";
/// `resolve_correct_match()`
pub const RESOLVE_CORRECT_MATCH: &str = "resolve_correct_match";
/// `resolve_incorrect_match()`
pub const RESOLVE_INCORRECT_MATCH: &str = "resolve_incorrect_match";
/// `complete_level()`
pub const COMPLETE_LEVEL: &str = "complete_level";
/// `complete_reflex()`
pub const COMPLETE_REFLEX: &str = "complete_reflex";
/// `start_timer(seconds)`
pub const START_TIMER: &str = "start_timer";
/// `notify(message)`
pub const NOTIFY: &str = "notify";

/// A host operation the instrumentation observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum HookPoint {
    BeginLevel,
    BeginReflex,
    ResolveCorrectMatch,
    ResolveIncorrectMatch,
    CompleteLevel,
    CompleteReflex,
    StartTimer,
    Notify,
}

impl HookPoint {
    /// Every hook point, in installation order.
    pub const ALL: [HookPoint; 8] = [
        HookPoint::BeginLevel,
        HookPoint::BeginReflex,
        HookPoint::ResolveCorrectMatch,
        HookPoint::ResolveIncorrectMatch,
        HookPoint::CompleteLevel,
        HookPoint::CompleteReflex,
        HookPoint::StartTimer,
        HookPoint::Notify,
    ];

    /// Operation name on the host.
    pub fn name(&self) -> &'static str {
        match self {
            HookPoint::BeginLevel => BEGIN_LEVEL,
            HookPoint::BeginReflex => BEGIN_REFLEX,
            HookPoint::ResolveCorrectMatch => RESOLVE_CORRECT_MATCH,
            HookPoint::ResolveIncorrectMatch => RESOLVE_INCORRECT_MATCH,
            HookPoint::CompleteLevel => COMPLETE_LEVEL,
            HookPoint::CompleteReflex => COMPLETE_REFLEX,
            HookPoint::StartTimer => START_TIMER,
            HookPoint::Notify => NOTIFY,
        }
    }

    /// Translate one invocation into the lifecycle event it signals.
    ///
    /// # Errors
    ///
    /// `InstrumentError::MalformedArgument` when a required argument is missing
    /// or has the wrong type.
    pub fn decode(&self, args: &[Value]) -> Result<GameEvent, InstrumentError> {
        let malformed = |index| InstrumentError::MalformedArgument {
            operation: self.name(),
            index,
        };

        match self {
            HookPoint::BeginLevel => {
                let level_index = args
                    .first()
                    .and_then(Value::as_u64)
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| malformed(0))?;
                Ok(GameEvent::LevelStarted { level_index })
            }
            HookPoint::BeginReflex => Ok(GameEvent::ReflexStarted),
            HookPoint::ResolveCorrectMatch => Ok(GameEvent::MatchResolved { correct: true }),
            HookPoint::ResolveIncorrectMatch => Ok(GameEvent::MatchResolved { correct: false }),
            HookPoint::CompleteLevel => Ok(GameEvent::LevelCompleted),
            HookPoint::CompleteReflex => Ok(GameEvent::ReflexCompleted),
            HookPoint::StartTimer => {
                let duration_secs = args
                    .first()
                    .and_then(Value::as_u64)
                    .ok_or_else(|| malformed(0))?;
                Ok(GameEvent::TimerStarted { duration_secs })
            }
            HookPoint::Notify => {
                let message = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed(0))?;
                Ok(GameEvent::Notification {
                    message: message.to_string(),
                })
            }
        }
    }
}

/// What [`attach`] managed to hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachSummary {
    /// Operations now wrapped.
    pub installed: Vec<&'static str>,
    /// Operations the host does not expose.
    pub skipped: Vec<&'static str>,
}

/// Install one hook per [`HookPoint`] on `table`, all feeding `ctx`.
///
/// Absent operations are logged and skipped. Call once per table: a second
/// attach would chain a second set of wrappers.
pub fn attach<H>(table: &mut OperationTable<H>, ctx: &SharedInstrumentation) -> AttachSummary
where
    H: GameView + 'static,
{
    let mut summary = AttachSummary::default();

    for point in HookPoint::ALL {
        let ctx = Rc::clone(ctx);
        let installed = table.install_hook(point.name(), move |host: &H, args: &[Value]| {
            let event = point.decode(args)?;
            let mut engine = ctx
                .try_borrow_mut()
                .map_err(|_| InstrumentError::Reentrant {
                    operation: point.name(),
                })?;
            engine.observe(host, &event);
            Ok(())
        });

        match installed {
            Ok(()) => summary.installed.push(point.name()),
            Err(err) => {
                warn!(error = %err, "Skipping hook");
                summary.skipped.push(point.name());
            }
        }
    }

    info!(
        installed = summary.installed.len(),
        skipped = summary.skipped.len(),
        "Hooks attached"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = HookPoint::ALL.iter().map(HookPoint::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), HookPoint::ALL.len());
    }

    #[test]
    fn begin_level_decodes_index() {
        assert_eq!(
            HookPoint::BeginLevel.decode(&[json!(4)]).unwrap(),
            GameEvent::LevelStarted { level_index: 4 }
        );
    }

    #[test]
    fn begin_level_rejects_missing_or_negative_index() {
        for args in [vec![], vec![json!(-1)], vec![json!("four")]] {
            assert!(matches!(
                HookPoint::BeginLevel.decode(&args),
                Err(InstrumentError::MalformedArgument {
                    operation: "begin_level",
                    index: 0
                })
            ));
        }
    }

    #[test]
    fn notify_decodes_message() {
        assert_eq!(
            HookPoint::Notify.decode(&[json!("Time's Up!")]).unwrap(),
            GameEvent::Notification {
                message: "Time's Up!".to_string()
            }
        );
    }

    #[test]
    fn resolve_points_carry_correctness() {
        assert_eq!(
            HookPoint::ResolveCorrectMatch.decode(&[]).unwrap(),
            GameEvent::MatchResolved { correct: true }
        );
        assert_eq!(
            HookPoint::ResolveIncorrectMatch.decode(&[]).unwrap(),
            GameEvent::MatchResolved { correct: false }
        );
    }

    #[test]
    fn start_timer_requires_seconds() {
        assert_eq!(
            HookPoint::StartTimer.decode(&[json!(90)]).unwrap(),
            GameEvent::TimerStarted { duration_secs: 90 }
        );
        assert!(HookPoint::StartTimer.decode(&[]).is_err());
    }
}
