//! The memoizing objective-function evaluator.
//!
//! Every candidate value maps to one external-program run. The cache is the
//! sole source of truth for "have we evaluated this value": the search
//! algorithms assume the objective is deterministic and re-evaluation is
//! free, so the same candidate is never executed twice in one run.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::process;
use crate::template::CommandTemplate;

/// The best (value, loss) pair observed across all real evaluations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestRecord {
    /// The candidate value that produced the best loss.
    pub value: f64,
    /// The best loss seen so far.
    pub loss: f64,
}

/// Memoizing evaluator shelling out to the external objective command.
pub struct Evaluator {
    template: CommandTemplate,
    /// Exact-match memo keyed by the candidate's bit pattern. Ulp-level
    /// near-duplicates stay distinct entries.
    cache: HashMap<u64, f64>,
    best: Option<BestRecord>,
    invocations: u64,
}

impl Evaluator {
    /// Creates an evaluator with an empty cache.
    #[must_use]
    pub fn new(template: CommandTemplate) -> Self {
        Self {
            template,
            cache: HashMap::new(),
            best: None,
            invocations: 0,
        }
    }

    /// Returns the loss for `value`, running the external command only on a
    /// cache miss.
    ///
    /// A fresh evaluation updates the best-ever record with a `<=`
    /// comparison, so ties prefer the most recent candidate. Cache hits
    /// never touch the record.
    ///
    /// # Errors
    ///
    /// Any [`process::run`] failure, or [`Error::LossNotFound`] when the
    /// output carries no recognizable loss line.
    pub fn evaluate(&mut self, value: f64) -> Result<f64> {
        if let Some(&loss) = self.cache.get(&value.to_bits()) {
            tracing::debug!(value, loss, "cache hit");
            return Ok(loss);
        }

        let invocation = self.template.render(value);
        tracing::info!(value, command = %invocation.display_command(), "trying candidate");
        let outcome = process::run(&invocation, None, true);
        self.template.cleanup_scratch();
        let lines = outcome?;
        self.invocations += 1;

        let loss = parse_loss(&lines).ok_or_else(|| Error::LossNotFound {
            command: invocation.display_command(),
            output: lines.join("\n"),
        })?;

        let improved = match self.best {
            None => true,
            Some(best) => loss <= best.loss,
        };
        if improved {
            self.best = Some(BestRecord { value, loss });
        }
        tracing::info!(value, loss, best = improved, "candidate evaluated");

        self.cache.insert(value.to_bits(), loss);
        Ok(loss)
    }

    /// The best (value, loss) pair seen so far, if anything was evaluated.
    #[must_use]
    pub fn best(&self) -> Option<BestRecord> {
        self.best
    }

    /// How many times the external command was actually run (cache hits
    /// excluded).
    #[must_use]
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    /// How many distinct candidates have been evaluated.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Scans `lines` from the end for the first parseable loss line.
///
/// The from-the-end policy matters in hold-out mode: the chained test run's
/// loss appears after the training run's in the merged output, and the test
/// loss is the one that counts.
fn parse_loss(lines: &[String]) -> Option<f64> {
    lines.iter().rev().find_map(|line| parse_loss_line(line))
}

/// Parses `average loss = <number>` out of one line, tolerating whitespace
/// around the `=`. Only finite numbers count.
fn parse_loss_line(line: &str) -> Option<f64> {
    let at = line.find("average loss")?;
    let rest = line[at + "average loss".len()..].trim_start();
    let rest = rest.strip_prefix('=')?;
    let token = rest.split_whitespace().next()?;
    let loss: f64 = token.parse().ok()?;
    loss.is_finite().then_some(loss)
}
