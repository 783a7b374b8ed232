//! Core identifier newtypes with smart constructors.
//!
//! All identifiers validate their raw form at construction time.
//! Raw constructors are never exported - use smart constructors only.

use serde::Serialize;
use std::fmt;

/// Level id used for reflex mode runs.
pub const REFLEX_LEVEL_ID: &str = "reflex";

/// Level id used when an outcome arrives and the host cannot tell us which level it was.
pub const UNKNOWN_LEVEL_ID: &str = "unknown";

/// Opaque identifier of one instrumentation attach.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Smart constructor: validates non-empty session ID
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidSessionId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(InvalidSessionId::Empty);
        }
        Ok(Self(raw))
    }

    /// Hyphenated form of a UUID. Never empty, so no validation needed.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid.hyphenated().to_string())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the level currently being played (e.g. `level_3`, `reflex`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LevelId(String);

impl LevelId {
    /// Smart constructor: validates non-empty level ID
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidLevelId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(InvalidLevelId::Empty);
        }
        Ok(Self(raw))
    }

    /// Campaign level, keyed by the host's level index verbatim.
    pub fn campaign(level_index: u32) -> Self {
        Self(format!("level_{level_index}"))
    }

    /// The single reflex mode "level".
    pub fn reflex() -> Self {
        Self(REFLEX_LEVEL_ID.to_string())
    }

    /// Placeholder for outcomes observed without any known level.
    pub fn unknown() -> Self {
        Self(UNKNOWN_LEVEL_ID.to_string())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task identifier of the form `task_<n>`, `n` being the 1-based sequence within a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u32);

impl TaskId {
    /// Smart constructor: sequence numbers start at 1.
    pub fn from_sequence(sequence: u32) -> Result<Self, InvalidTaskId> {
        if sequence == 0 {
            return Err(InvalidTaskId::ZeroSequence);
        }
        Ok(Self(sequence))
    }

    /// 1-based position of this task within its level run.
    pub fn sequence(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task_{}", self.0)
    }
}

impl Serialize for TaskId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ===== Error Types =====

/// Rejected [`SessionId`] input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSessionId {
    /// Blank input.
    #[error("Session ID cannot be empty")]
    Empty,
}

/// Rejected [`LevelId`] input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidLevelId {
    /// Blank input.
    #[error("Level ID cannot be empty")]
    Empty,
}

/// Rejected [`TaskId`] input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTaskId {
    /// Task sequences are 1-based.
    #[error("Task sequence numbers start at 1")]
    ZeroSequence,
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_accepts_uuid_string() {
        let id = SessionId::new("550e8400-e29b-41d4-a716-446655440000");
        assert!(id.is_ok(), "Valid UUID should be accepted");
    }

    #[test]
    fn session_id_rejects_empty_and_blank() {
        assert_eq!(SessionId::new(""), Err(InvalidSessionId::Empty));
        assert_eq!(SessionId::new("   "), Err(InvalidSessionId::Empty));
    }

    #[test]
    fn session_id_display_returns_inner_string() {
        let id = SessionId::new("abc123").expect("valid id");
        assert_eq!(id.to_string(), "abc123");
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn level_id_campaign_uses_index_verbatim() {
        assert_eq!(LevelId::campaign(0).as_str(), "level_0");
        assert_eq!(LevelId::campaign(12).as_str(), "level_12");
    }

    #[test]
    fn level_id_reflex_and_unknown() {
        assert_eq!(LevelId::reflex().as_str(), REFLEX_LEVEL_ID);
        assert_eq!(LevelId::unknown().as_str(), UNKNOWN_LEVEL_ID);
    }

    #[test]
    fn level_id_rejects_empty() {
        assert_eq!(LevelId::new(""), Err(InvalidLevelId::Empty));
    }

    #[test]
    fn task_id_formats_with_prefix() {
        let id = TaskId::from_sequence(3).expect("valid sequence");
        assert_eq!(id.to_string(), "task_3");
        assert_eq!(id.sequence(), 3);
    }

    #[test]
    fn task_id_rejects_zero() {
        assert_eq!(TaskId::from_sequence(0), Err(InvalidTaskId::ZeroSequence));
    }

    #[test]
    fn task_id_serializes_as_string() {
        let id = TaskId::from_sequence(7).expect("valid sequence");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"task_7\"");
    }
}
