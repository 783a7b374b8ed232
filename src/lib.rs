//! flipwatch
//!
//! Non-invasive analytics instrumentation for a memory-match game. Hooks wrap
//! the host's lifecycle operations, turn match attempts into task records and
//! emit exactly one report per level run to an [`sink::AnalyticsSink`].
//!
//! The `flipwatch` binary replays JSONL play scripts through the same hooks,
//! see [`replay`].

pub mod config;
pub mod hook;
pub mod host;
pub mod instrument;
pub mod logging;
pub mod model;
pub mod replay;
pub mod sink;
