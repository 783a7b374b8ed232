//! Host game boundary.
//!
//! The instrumentation only ever reads the host through [`GameView`]. Everything
//! on it is optional: a host that cannot answer returns `None`, and the
//! instrumentation falls back to sentinels instead of failing.

pub mod clock;

pub use clock::{
    elapsed_ms, Clock, IdProvider, ManualClock, SequentialIdProvider, SystemClock, UuidProvider,
};

use serde::Deserialize;

/// One face-up card as the host exposes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FlippedItem {
    /// Value shown on the card.
    #[serde(default)]
    pub value: Option<String>,
    /// Value this card is declared to match with.
    #[serde(default, rename = "target")]
    pub match_target: Option<String>,
}

impl FlippedItem {
    /// Card showing `value` and declaring `target` as its pair.
    pub fn new(value: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            match_target: Some(target.into()),
        }
    }

    /// Card whose pair target is unreadable.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            match_target: None,
        }
    }
}

/// Read-only view of host game state.
///
/// Required accessors return `Option` because the host may not be in a state
/// where the value exists. Calculators default to absent.
pub trait GameView {
    /// Currently flipped items. The instrumentation expects exactly two.
    fn flipped_items(&self) -> Vec<FlippedItem>;

    /// Index of the campaign level being played.
    fn current_level(&self) -> Option<u32>;

    /// Moves (turns) taken so far in the current level or mode.
    fn moves(&self) -> Option<u32>;

    /// Host XP calculator for a finished campaign level.
    fn campaign_xp(&self, _level_index: u32, _moves: u32) -> Option<u64> {
        None
    }

    /// Host star calculator for a finished campaign level.
    fn campaign_stars(&self, _level_index: u32, _moves: u32) -> Option<u32> {
        None
    }

    /// Host star calculator for a finished reflex run.
    fn reflex_stars(&self, _moves: u32) -> Option<u32> {
        None
    }

    /// XP the host awards for a single match attempt.
    fn match_xp(&self, _correct: bool) -> Option<u64> {
        None
    }
}

/// A host exposing nothing. Useful where events arrive without state.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyView;

impl GameView for EmptyView {
    fn flipped_items(&self) -> Vec<FlippedItem> {
        Vec::new()
    }

    fn current_level(&self) -> Option<u32> {
        None
    }

    fn moves(&self) -> Option<u32> {
        None
    }
}
