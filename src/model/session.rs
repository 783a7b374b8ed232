//! Instrumentation session.
//!
//! One `Session` is created per attach and lives as long as the
//! instrumentation context. It is never mutated after creation.

use crate::model::SessionId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identity of one instrumentation attach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Create a session with its creation timestamp.
    pub fn new(id: SessionId, created_at: DateTime<Utc>) -> Self {
        Self { id, created_at }
    }

    // ===== Accessors (read-only) =====

    /// Opaque unique id handed to the sink on initialize.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// When the instrumentation was attached.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
