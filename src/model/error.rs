//! Error types for flipwatch.
//!
//! This module defines the error taxonomy using `thiserror` for structured error handling.
//! Errors compose via `?` and `From` conversions up to [`AppError`] in the binary.
//!
//! # Error Hierarchy
//!
//! - [`InstrumentError`] - Failures inside the instrumentation layer (missing or malformed
//!   host state, re-entrant hooks, sink failures). Always logged and suppressed at the hook
//!   boundary, never allowed to alter the host's control flow.
//! - [`HostError`] - Failures raised by the host's own operations. Never caught by the
//!   instrumentation; they reach the host's caller unchanged.
//! - [`HookError`] - Installation failures (the named operation is absent). Logged and
//!   skipped during attach since optional game modes may be missing.
//! - [`SinkError`] - Recording or submission failures of the analytics sink. Treated as
//!   instrumentation-internal.
//! - [`ReplayError`] / [`AppError`] - Script and binary level failures.
//!
//! # Recovery Strategy
//!
//! The instrumentation is strictly best-effort. The single guarantee that is never
//! violated: the original operation's behavior and return value are unaffected by
//! instrumentation success or failure.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use thiserror::Error;

/// Top-level error of the `flipwatch` binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tracing subscriber could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// The replay script could not be read or executed.
    #[error("Replay error: {0}")]
    Replay(#[from] ReplayError),

    /// Output could not be opened or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures originating inside the instrumentation layer.
///
/// Every variant is caught at its point of origin (the hook wrapper or the
/// context's handler), logged at `warn`, and suppressed.
#[derive(Debug, Error)]
pub enum InstrumentError {
    /// The host did not expose a piece of state the handler needed.
    ///
    /// **When this occurs**: reading the current level index, the move count, or the
    /// flipped items returns nothing.
    #[error("Host state '{what}' is unavailable")]
    MissingHostState {
        /// Name of the host attribute that was missing.
        what: &'static str,
    },

    /// A hooked operation was invoked with arguments the handler cannot decode.
    #[error("Operation '{operation}' received a malformed argument at position {index}")]
    MalformedArgument {
        /// Hooked operation name.
        operation: &'static str,
        /// 0-based argument position.
        index: usize,
    },

    /// A hook fired while the instrumentation context was already borrowed.
    ///
    /// Re-entrant invocation of one hooked operation from within another's
    /// instrumentation is unsupported; the inner instrumentation is skipped.
    #[error("Re-entrant instrumentation in operation '{operation}'")]
    Reentrant {
        /// Operation whose instrumentation was skipped.
        operation: &'static str,
    },
}

/// Errors raised by the host's own operations.
///
/// These belong to the host: the hook wrapper returns them unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host has no operation registered under this name.
    #[error("Unknown host operation '{0}'")]
    UnknownOperation(String),

    /// The operation ran and failed.
    #[error("Host operation '{operation}' failed: {reason}")]
    Failed {
        /// Operation that failed.
        operation: String,
        /// Host-provided reason.
        reason: String,
    },
}

/// Failures while installing a hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// The named original operation does not exist on the host.
    #[error("Cannot hook '{0}': operation not present on host")]
    OperationMissing(String),
}

/// Failures of the external analytics sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Underlying writer failed.
    #[error("Sink IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized.
    #[error("Sink serialization error: {0}")]
    Serialize(String),

    /// The sink refused the call.
    #[error("Sink rejected '{call}': {reason}")]
    Rejected {
        /// Sink method that was refused.
        call: &'static str,
        /// Sink-provided reason.
        reason: String,
    },
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

/// Errors while reading or executing a replay script.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// A script line is not a valid step.
    #[error("Invalid script step at line {line}: {message}")]
    InvalidStep {
        /// 1-based line number in the script.
        line: usize,
        /// Parser error message.
        message: String,
    },

    /// The script could not be read.
    #[error("Failed to read script: {0}")]
    Io(#[from] std::io::Error),

    /// A host operation failed during replay.
    #[error("Host failure during replay: {0}")]
    Host(#[from] HostError),

    /// An `advance` step would move the replay clock out of range.
    #[error("Step {step} cannot advance the replay clock by {ms} ms")]
    ClockOverflow {
        /// 1-based position of the step among the parsed steps.
        step: usize,
        /// Requested advance.
        ms: u64,
    },
}
