//! Bracketing root-finder, the secondary (opt-in) algorithm.

use crate::error::{Error, Result};

use super::SearchOutcome;

/// Hard iteration cap; exhausting it is a fatal non-convergence.
const MAX_ITERATIONS: usize = 50;

/// Finds a zero crossing of `f` in `[lower, upper]` by Brent's method: an
/// inverse-quadratic-interpolation / secant / bisection hybrid.
///
/// Four points (a, b, c, d) are tracked along with a flag recording
/// whether the previous step bisected. Each iteration proposes a step by
/// inverse quadratic interpolation when the three most recent losses are
/// pairwise distinct, by the secant rule otherwise, and falls back to
/// bisection when the proposal lands outside the acceptable interior of
/// (a, b) or makes insufficient progress against the previous two steps.
/// The bracket is updated to preserve the sign change, and the points are
/// swapped so |f(a)| ≤ |f(b)| always holds.
///
/// When the endpoint losses do not bracket a sign change (their product is
/// non-negative) the method cannot proceed meaningfully; it logs a warning
/// and returns whichever endpoint has the lower loss, with no further
/// evaluations.
///
/// # Errors
///
/// Propagates any objective failure, and returns
/// [`Error::NonConvergence`] after 50 iterations without convergence.
#[allow(
    clippy::float_cmp,
    clippy::many_single_char_names,
    clippy::module_name_repetitions
)]
pub fn brent_root<F>(mut f: F, lower: f64, upper: f64, tolerance: f64) -> Result<SearchOutcome>
where
    F: FnMut(f64) -> Result<f64>,
{
    let mut a = lower;
    let mut b = upper;
    let mut fa = f(a)?;
    let mut fb = f(b)?;

    if fa * fb >= 0.0 {
        tracing::warn!(fa, fb, "endpoint losses do not bracket a sign change");
        return Ok(if fa < fb {
            SearchOutcome { value: a, loss: fa }
        } else {
            SearchOutcome { value: b, loss: fb }
        });
    }

    if fa.abs() < fb.abs() {
        core::mem::swap(&mut a, &mut b);
        core::mem::swap(&mut fa, &mut fb);
    }

    let mut c = a;
    let mut fc = fa;
    let mut d = c;
    let mut bisected = true;

    for iteration in 0..MAX_ITERATIONS {
        if fb == 0.0 || (b - a).abs() <= tolerance {
            tracing::debug!(iteration, value = b, loss = fb, "root bracket converged");
            return Ok(SearchOutcome { value: b, loss: fb });
        }

        let mut s = if fa != fc && fb != fc {
            // inverse quadratic interpolation
            a * fb * fc / ((fa - fb) * (fa - fc))
                + b * fa * fc / ((fb - fa) * (fb - fc))
                + c * fa * fb / ((fc - fa) * (fc - fb))
        } else {
            // secant rule
            b - fb * (b - a) / (fb - fa)
        };

        let interior = (3.0 * a + b) / 4.0;
        let out_of_range = !((interior < s && s < b) || (b < s && s < interior));
        let slow_progress = if bisected {
            (s - b).abs() >= (b - c).abs() / 2.0 || (b - c).abs() < tolerance
        } else {
            (s - b).abs() >= (c - d).abs() / 2.0 || (c - d).abs() < tolerance
        };
        if out_of_range || slow_progress {
            s = (a + b) / 2.0;
            bisected = true;
        } else {
            bisected = false;
        }

        let fs = f(s)?;
        tracing::debug!(iteration, a, b, s, fs, bisected, "root-finder step");
        d = c;
        c = b;
        fc = fb;
        if fa * fs < 0.0 {
            b = s;
            fb = fs;
        } else {
            a = s;
            fa = fs;
        }
        if fa.abs() < fb.abs() {
            core::mem::swap(&mut a, &mut b);
            core::mem::swap(&mut fa, &mut fb);
        }
    }

    Err(Error::NonConvergence {
        iterations: MAX_ITERATIONS,
    })
}
