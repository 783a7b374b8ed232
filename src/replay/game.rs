//! A minimal memory-match host driven by replay scripts.

use crate::hook::ops;
use crate::hook::OperationTable;
use crate::host::{FlippedItem, GameView};
use crate::model::error::HostError;
use serde_json::{json, Value};

/// XP a campaign level is worth before move penalties.
pub const BASE_LEVEL_XP: u64 = 100;

/// XP lost per move taken.
pub const XP_PER_MOVE: u64 = 5;

/// Floor of the campaign XP award.
pub const MIN_LEVEL_XP: u64 = 10;

/// XP for a single correct match.
pub const MATCH_XP: u64 = 10;

/// Host state the scripted operations mutate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    level: Option<u32>,
    moves: u32,
    flipped: Vec<FlippedItem>,
    timer_secs: Option<u64>,
    notifications: Vec<String>,
    completed_levels: Vec<u32>,
    reflex_runs: u32,
}

impl GameState {
    /// Fresh, pre-game state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Face up two cards.
    pub fn flip(&mut self, first: FlippedItem, second: FlippedItem) {
        self.flipped = vec![first, second];
    }

    /// Seconds on the running timer, if any.
    pub fn timer_secs(&self) -> Option<u64> {
        self.timer_secs
    }

    /// Every notification shown so far.
    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    /// Campaign levels the host considers beaten.
    pub fn completed_levels(&self) -> &[u32] {
        &self.completed_levels
    }

    /// Finished reflex runs.
    pub fn reflex_runs(&self) -> u32 {
        self.reflex_runs
    }

    fn reset_board(&mut self, level: Option<u32>) {
        self.level = level;
        self.moves = 0;
        self.flipped.clear();
        self.timer_secs = None;
    }

    fn resolve(&mut self) -> Value {
        self.moves += 1;
        self.flipped.clear();
        json!({ "moves": self.moves })
    }
}

fn stars_for(moves: u32, three: u32, two: u32) -> u32 {
    if moves <= three {
        3
    } else if moves <= two {
        2
    } else {
        1
    }
}

impl GameView for GameState {
    fn flipped_items(&self) -> Vec<FlippedItem> {
        self.flipped.clone()
    }

    fn current_level(&self) -> Option<u32> {
        self.level
    }

    fn moves(&self) -> Option<u32> {
        Some(self.moves)
    }

    fn campaign_xp(&self, _level_index: u32, moves: u32) -> Option<u64> {
        let penalty = u64::from(moves).saturating_mul(XP_PER_MOVE);
        Some(BASE_LEVEL_XP.saturating_sub(penalty).max(MIN_LEVEL_XP))
    }

    fn campaign_stars(&self, level_index: u32, moves: u32) -> Option<u32> {
        // Later levels have more pairs, so the thresholds grow with the index.
        let pairs = 4 + level_index.saturating_mul(2);
        Some(stars_for(moves, pairs, pairs.saturating_mul(2)))
    }

    fn reflex_stars(&self, moves: u32) -> Option<u32> {
        Some(stars_for(moves, 20, 35))
    }

    fn match_xp(&self, correct: bool) -> Option<u64> {
        Some(if correct { MATCH_XP } else { 0 })
    }
}

fn arg_error(operation: &str, what: &str) -> HostError {
    HostError::Failed {
        operation: operation.to_string(),
        reason: format!("expected {what} as first argument"),
    }
}

/// Host game: state plus the table of its original operations.
#[derive(Debug)]
pub struct ScriptedGame {
    state: GameState,
    table: OperationTable<GameState>,
}

impl Default for ScriptedGame {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGame {
    /// Game with every lifecycle operation registered.
    pub fn new() -> Self {
        let mut table = OperationTable::new();

        table.register(ops::BEGIN_LEVEL, |state: &mut GameState, args: &[Value]| {
            let level = args
                .first()
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| arg_error(ops::BEGIN_LEVEL, "a level index"))?;
            state.reset_board(Some(level));
            Ok(json!({ "level": level }))
        });
        table.register(ops::BEGIN_REFLEX, |state: &mut GameState, _args: &[Value]| {
            state.reset_board(None);
            Ok(Value::Null)
        });
        table.register(
            ops::RESOLVE_CORRECT_MATCH,
            |state: &mut GameState, _args: &[Value]| Ok(state.resolve()),
        );
        table.register(
            ops::RESOLVE_INCORRECT_MATCH,
            |state: &mut GameState, _args: &[Value]| Ok(state.resolve()),
        );
        table.register(ops::COMPLETE_LEVEL, |state: &mut GameState, _args: &[Value]| {
            state.timer_secs = None;
            if let Some(level) = state.level {
                state.completed_levels.push(level);
            }
            Ok(json!({ "level": state.level, "moves": state.moves }))
        });
        table.register(ops::COMPLETE_REFLEX, |state: &mut GameState, _args: &[Value]| {
            state.timer_secs = None;
            state.reflex_runs += 1;
            Ok(json!({ "moves": state.moves }))
        });
        table.register(ops::START_TIMER, |state: &mut GameState, args: &[Value]| {
            let seconds = args
                .first()
                .and_then(Value::as_u64)
                .ok_or_else(|| arg_error(ops::START_TIMER, "seconds"))?;
            state.timer_secs = Some(seconds);
            Ok(Value::Null)
        });
        table.register(ops::NOTIFY, |state: &mut GameState, args: &[Value]| {
            let message = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| arg_error(ops::NOTIFY, "a message"))?;
            state.notifications.push(message.to_string());
            Ok(Value::Null)
        });

        Self {
            state: GameState::new(),
            table,
        }
    }

    /// Call a host operation the way the game's own code would.
    ///
    /// # Errors
    ///
    /// Whatever the operation returns, unchanged by any installed hook.
    pub fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, HostError> {
        self.table.call(&mut self.state, name, args)
    }

    /// Host state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable host state, for steps that are not operations (flipping cards).
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// The operation table, for installing hooks.
    pub fn operations_mut(&mut self) -> &mut OperationTable<GameState> {
        &mut self.table
    }
}
