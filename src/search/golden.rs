//! Golden-section search, the primary algorithm.

use crate::error::{Error, Result};

use super::SearchOutcome;

/// 2 − (1+√5)/2: the fixed ratio used to place new probe points.
const RESPHI: f64 = 0.381_966_011_250_105;

/// Defensive cap on bracket-narrowing steps. Each step shrinks the bracket
/// by a factor of 1 − RESPHI ≈ 0.618, so 100 steps cover relative
/// tolerances far beyond anything representable in the (0, 1) range the
/// driver accepts.
const MAX_STEPS: usize = 100;

/// Exact ties cannot be ordered; callers fall back to a midpoint.
#[allow(clippy::float_cmp)]
fn losses_tie(a: f64, b: f64) -> bool {
    a == b
}

/// Minimizes `f` over `[lower, upper]` by golden-section search.
///
/// The bracket is the triple (low, mid, high). Each step probes the wider
/// of the two sub-intervals at the golden ratio and drops one endpoint,
/// shrinking the bracket monotonically. Termination is relative: the
/// search stops once the bracket width falls below
/// `tolerance * (|mid| + |probe|)`, returning the bracket midpoint.
///
/// Two candidates evaluating to exactly equal losses cannot be ordered;
/// the search logs a warning and settles on their midpoint instead of
/// narrowing in an ambiguous direction.
///
/// # Errors
///
/// Propagates any objective failure, and returns
/// [`Error::NonConvergence`] if the defensive step cap is exhausted (which
/// the relative termination rule can trigger when the minimum sits at
/// zero and the candidate magnitudes shrink along with the bracket).
#[allow(clippy::module_name_repetitions)]
pub fn golden_section<F>(mut f: F, lower: f64, upper: f64, tolerance: f64) -> Result<SearchOutcome>
where
    F: FnMut(f64) -> Result<f64>,
{
    let mut low = lower;
    let mut high = upper;
    let mut mid = low + RESPHI * (high - low);
    let mut f_mid = f(mid)?;

    for step in 0..MAX_STEPS {
        let upper_range = high - mid;
        let lower_range = mid - low;
        let wider_upper = upper_range > lower_range;
        let x = if wider_upper {
            mid + RESPHI * upper_range
        } else {
            mid - RESPHI * lower_range
        };

        if (high - low).abs() < tolerance * (mid.abs() + x.abs()) {
            let value = (high + low) / 2.0;
            let loss = f(value)?;
            tracing::debug!(step, value, loss, "bracket converged");
            return Ok(SearchOutcome { value, loss });
        }

        let f_x = f(x)?;
        tracing::debug!(step, low, mid, high, x, f_x, f_mid, "narrowing bracket");

        if losses_tie(f_x, f_mid) {
            let value = (x + mid) / 2.0;
            tracing::warn!(
                x,
                mid,
                loss = f_x,
                "identical losses at distinct candidates; settling on their midpoint"
            );
            let loss = f(value)?;
            return Ok(SearchOutcome { value, loss });
        }

        if wider_upper {
            if f_x < f_mid {
                low = mid;
                mid = x;
                f_mid = f_x;
            } else {
                high = x;
            }
        } else if f_x < f_mid {
            high = mid;
            mid = x;
            f_mid = f_x;
        } else {
            low = x;
        }
    }

    Err(Error::NonConvergence {
        iterations: MAX_STEPS,
    })
}
