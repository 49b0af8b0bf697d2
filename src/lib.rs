#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Black-box scalar hyperparameter tuner: given a one-dimensional search
//! range and a command template containing a `%` placeholder, find the
//! placeholder value that minimizes the `average loss = <number>` reported
//! by repeatedly running that command.
//!
//! The search algorithms only ever see a fallible `f(x) -> loss` closure,
//! so they can be used directly on synthetic objectives:
//!
//! ```
//! use linetune::search::golden_section;
//!
//! let outcome = golden_section(|x| Ok((x - 3.0).powi(2)), 0.0, 10.0, 1e-3).unwrap();
//! assert!((outcome.value - 3.0).abs() < 0.05);
//! ```
//!
//! The full pipeline (template rendering, external-process execution,
//! memoized evaluation, search, and best-ever reconciliation) runs through
//! [`run`] with a [`Config`]:
//!
//! | Type | Role |
//! |------|------|
//! | [`CommandTemplate`] | Substitute `%` with candidates, expand hold-out evaluation. |
//! | [`Invocation`] | Structured argv vs. the one documented `sh -c` path. |
//! | [`Evaluator`] | Memoize candidate → loss, track the best-ever record. |
//! | [`Algorithm`] | Golden-section search (primary) or Brent root-finder. |
//! | [`Config`] / [`Tuned`] | Driver input and final answer. |
//!
//! Every failure of the external command (timeout, signal, non-zero exit,
//! unparseable output) is a typed [`Error`] propagated to the caller; the
//! binary maps them all to exit code 1. Nothing is retried: the search
//! assumes the objective is deterministic, so a failing command would fail
//! again.

pub mod cli;
pub mod driver;
mod error;
pub mod evaluate;
pub mod process;
pub mod search;
pub mod template;

pub use driver::{run, Config, Tuned, DEFAULT_TOLERANCE};
pub use error::{Error, Result};
pub use evaluate::{BestRecord, Evaluator};
pub use process::Invocation;
pub use search::{Algorithm, SearchOutcome};
pub use template::{CommandTemplate, PLACEHOLDER};
