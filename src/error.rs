//! Error taxonomy for the tuner.
//!
//! Every fatal condition is a typed variant carrying enough context (the
//! rendered command line and the captured output) for the user to reproduce
//! the failing invocation by hand. There is no retry anywhere: a
//! malfunctioning objective command invalidates the whole search.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the lower bound is not strictly below the upper bound.
    #[error("invalid bounds: lower ({lower}) must be a finite number strictly below upper ({upper})")]
    InvalidBounds {
        /// The lower bound value.
        lower: f64,
        /// The upper bound value.
        upper: f64,
    },

    /// Returned when the tolerance falls outside the open interval (0, 1).
    #[error("invalid tolerance: {0} must be in the open interval (0, 1)")]
    InvalidTolerance(f64),

    /// Returned when no command template tokens remain after argument
    /// resolution.
    #[error("no command template given")]
    EmptyCommand,

    /// Returned when the command template contains no `%` placeholder to
    /// substitute candidate values into.
    #[error("command template contains no '%' placeholder")]
    MissingPlaceholder,

    /// Returned when a hold-out template ends in `-f` with no model path
    /// following it.
    #[error("command template ends in -f with no model path after it")]
    DanglingModelFlag,

    /// Returned when the child process could not be started or awaited.
    #[error("failed to run `{command}`: {source}")]
    Run {
        /// The rendered command line.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Returned when the child process outlived its wall-clock budget and
    /// was killed.
    #[error("`{command}` did not finish within {timeout:?}; output so far:\n{output}")]
    Timeout {
        /// The rendered command line.
        command: String,
        /// The wall-clock budget that was exceeded.
        timeout: core::time::Duration,
        /// Whatever output had been collected before the kill.
        output: String,
    },

    /// Returned when the child process was killed by a signal.
    #[error(
        "`{command}` was killed by signal {signal} (core dumped: {core_dumped}); rerun it by hand to diagnose; output:\n{output}"
    )]
    Signaled {
        /// The rendered command line.
        command: String,
        /// The signal number that killed the child.
        signal: i32,
        /// Whether the child dumped core.
        core_dumped: bool,
        /// The captured output up to the kill.
        output: String,
    },

    /// Returned when the child process exited with a non-zero status.
    #[error("`{command}` exited with status {code}; rerun it by hand to diagnose; output:\n{output}")]
    ExitStatus {
        /// The child's exit code.
        code: i32,
        /// The rendered command line.
        command: String,
        /// The captured output.
        output: String,
    },

    /// Returned when no `average loss = <number>` line was found in the
    /// child's output. This is a contract violation by the external
    /// program, not a recoverable condition.
    #[error("no `average loss = <number>` line in the output of `{command}`; full output:\n{output}")]
    LossNotFound {
        /// The rendered command line.
        command: String,
        /// The full captured output, dumped for manual diagnosis.
        output: String,
    },

    /// Returned when a search algorithm exhausted its iteration cap
    /// without converging.
    #[error("search did not converge within {iterations} iterations")]
    NonConvergence {
        /// The iteration cap that was exhausted.
        iterations: usize,
    },
}

pub type Result<T> = core::result::Result<T, Error>;
