//! Overall control flow: configuration, search dispatch, reconciliation.

use core::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::evaluate::{BestRecord, Evaluator};
use crate::search::{self, Algorithm, SearchOutcome};
use crate::template::CommandTemplate;

/// Relative tolerance used when the caller does not supply one.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// A resolved tuning run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Lower bound of the search range.
    pub lower: f64,
    /// Upper bound of the search range.
    pub upper: f64,
    /// Relative termination tolerance, in (0, 1).
    pub tolerance: f64,
    /// The command template tokens, containing at least one `%`.
    pub command: Vec<String>,
    /// Which search algorithm to run.
    pub algorithm: Algorithm,
    /// Hold-out test set: when set, candidates are scored on this set
    /// instead of the training loss.
    pub test_set: Option<PathBuf>,
}

impl Config {
    /// A config with the default tolerance, the primary algorithm, and no
    /// hold-out set.
    #[must_use]
    pub fn new(lower: f64, upper: f64, command: Vec<String>) -> Self {
        Self {
            lower,
            upper,
            tolerance: DEFAULT_TOLERANCE,
            command,
            algorithm: Algorithm::default(),
            test_set: None,
        }
    }
}

/// The final answer of a tuning run.
///
/// `Display` renders the result line printed on success: the value in
/// general formatting and the loss at six significant digits, separated by
/// a tab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuned {
    /// The winning candidate value.
    pub value: f64,
    /// Its loss.
    pub loss: f64,
}

impl fmt::Display for Tuned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.value, format_significant(self.loss, 6))
    }
}

/// Runs the whole optimization: validates `config`, searches, and
/// reconciles the search result against the evaluator's best-ever record.
///
/// # Errors
///
/// [`Error::InvalidBounds`], [`Error::InvalidTolerance`],
/// [`Error::EmptyCommand`], or [`Error::MissingPlaceholder`] on a bad
/// configuration, plus anything the evaluator or search propagates.
pub fn run(config: &Config) -> Result<Tuned> {
    if !config.lower.is_finite() || !config.upper.is_finite() || config.lower >= config.upper {
        return Err(Error::InvalidBounds {
            lower: config.lower,
            upper: config.upper,
        });
    }
    if config.tolerance <= 0.0 || config.tolerance >= 1.0 || config.tolerance.is_nan() {
        return Err(Error::InvalidTolerance(config.tolerance));
    }

    let template = match &config.test_set {
        Some(path) => CommandTemplate::with_holdout(config.command.clone(), path)?,
        None => CommandTemplate::new(config.command.clone())?,
    };

    let mut evaluator = Evaluator::new(template);
    tracing::info!(
        lower = config.lower,
        upper = config.upper,
        tolerance = config.tolerance,
        algorithm = ?config.algorithm,
        "starting search"
    );
    let outcome = match config.algorithm {
        Algorithm::GoldenSection => search::golden_section(
            |v| evaluator.evaluate(v),
            config.lower,
            config.upper,
            config.tolerance,
        )?,
        Algorithm::BrentRoot => search::brent_root(
            |v| evaluator.evaluate(v),
            config.lower,
            config.upper,
            config.tolerance,
        )?,
    };
    tracing::info!(
        value = outcome.value,
        loss = outcome.loss,
        evaluations = evaluator.invocations(),
        "search finished"
    );

    Ok(reconcile(outcome, evaluator.best()))
}

/// Both algorithms terminate approximately and can settle on a slightly
/// worse point than one already probed; the best-ever record wins in that
/// case.
fn reconcile(outcome: SearchOutcome, best: Option<BestRecord>) -> Tuned {
    match best {
        Some(best) if best.loss < outcome.loss => {
            tracing::info!(
                value = best.value,
                loss = best.loss,
                "a previously probed candidate beats the search result"
            );
            Tuned {
                value: best.value,
                loss: best.loss,
            }
        }
        _ => Tuned {
            value: outcome.value,
            loss: outcome.loss,
        },
    }
}

/// Formats `v` with `digits` significant digits, trimming trailing zeros.
/// Magnitudes the digit budget cannot cover switch to exponent form.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn format_significant(v: f64, digits: i32) -> String {
    if v == 0.0 || !v.is_finite() {
        return v.to_string();
    }
    let magnitude = v.abs().log10().floor() as i32;
    if magnitude >= digits {
        let precision = (digits - 1) as usize;
        let formatted = format!("{v:.precision$e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => format!("{}e{exponent}", trim_decimals(mantissa)),
            None => formatted,
        };
    }
    let decimals = (digits - 1 - magnitude).max(0) as usize;
    trim_decimals(&format!("{v:.decimals$}")).to_owned()
}

fn trim_decimals(formatted: &str) -> &str {
    if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted
    }
}
