//! Clock and id sources.
//!
//! The instrumentation never reads the system clock or a random source directly;
//! both come through these seams so tests can script synthetic delays.

use crate::model::SessionId;
use chrono::{DateTime, TimeDelta, Utc};
use std::cell::Cell;

/// Wall-clock source used for level start/end and task timing.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Reads `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// Shared between a scripted host and the instrumentation via `Rc`.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    /// Clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Move the clock by `ms` milliseconds. Negative values move it backwards.
    ///
    /// Returns the new instant, or `None` with the clock unchanged when the
    /// result would fall outside the range `chrono` can represent.
    pub fn advance_ms(&self, ms: i64) -> Option<DateTime<Utc>> {
        let next = TimeDelta::try_milliseconds(ms)
            .and_then(|delta| self.now.get().checked_add_signed(delta))?;
        self.now.set(next);
        Some(next)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Milliseconds elapsed from `from` to `to`, clamped at zero.
pub fn elapsed_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_milliseconds()).unwrap_or(0)
}

/// Source of unique session identifiers.
pub trait IdProvider {
    /// A fresh, never-before-returned session id.
    fn next_session_id(&self) -> SessionId;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn next_session_id(&self) -> SessionId {
        SessionId::from_uuid(uuid::Uuid::new_v4())
    }
}

/// Deterministic ids `<prefix>-1`, `<prefix>-2`, ... for replays and tests.
#[derive(Debug)]
pub struct SequentialIdProvider {
    prefix: String,
    issued: Cell<u64>,
}

impl SequentialIdProvider {
    /// Provider whose ids start with `prefix`. A blank prefix falls back to `session`.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = if prefix.trim().is_empty() {
            "session".to_string()
        } else {
            prefix
        };
        Self {
            prefix,
            issued: Cell::new(0),
        }
    }
}

impl IdProvider for SequentialIdProvider {
    fn next_session_id(&self) -> SessionId {
        let next = self.issued.get() + 1;
        self.issued.set(next);
        SessionId::new(format!("{}-{}", self.prefix, next))
            .unwrap_or_else(|_| SessionId::from_uuid(uuid::Uuid::new_v4()))
    }
}
