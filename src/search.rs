//! Line-search algorithms over a black-box objective.
//!
//! Both algorithms see the objective only as a fallible `f(x) -> loss`
//! closure, so they compose with the memoizing [`Evaluator`](crate::Evaluator)
//! or with any synthetic function in tests.

mod brent;
mod golden;

pub use brent::brent_root;
pub use golden::golden_section;

/// Which search algorithm drives the optimization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    /// Golden-section search (the primary algorithm).
    #[default]
    GoldenSection,
    /// Bracketing root-finder (secondary, opt-in).
    BrentRoot,
}

/// The final candidate produced by a search, with its loss.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchOutcome {
    /// The candidate value the search settled on.
    pub value: f64,
    /// The loss at that candidate.
    pub loss: f64,
}
