use crate::env::LogSink;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the engine itself, as opposed to failures raised by a
/// test body. Body failures are captured on their unit as an `anyhow::Error`
/// so the original kind, message, and backtrace stay inspectable; the
/// variants here cover discovery, configuration, and run-protocol problems.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Lookup of a suite that was never registered. The only error that
    /// propagates out of discovery immediately.
    #[error("no suite named `{0}` is registered")]
    UnknownSuite(String),

    /// The suite registered neither a zero-argument constructor nor a
    /// diagnostics-taking one. Fails discovery for that suite only.
    #[error("suite `{0}` has no zero-argument or diagnostics constructor")]
    NoConstructor(String),

    /// The environment's active log sink was not the host-bound kind when a
    /// unit started. Reported as that unit's failure.
    #[error("active log sink is {found:?}, expected {expected:?}")]
    UnexpectedLogSink { found: LogSink, expected: LogSink },

    /// An in-flight test body did not complete within the configured bound.
    #[error("`{name}` did not complete within {timeout:?}")]
    Timeout { name: String, timeout: Duration },

    /// A unit's start trigger fires at most once.
    #[error("start trigger for `{name}` has already fired")]
    TriggerAlreadyFired { name: String },

    /// A run configuration file could not be read or parsed.
    #[error("{0}")]
    InvalidConfig(String),
}
