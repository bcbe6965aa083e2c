use crate::domain::error::SolverError;
use crate::domain::models::{DerivationTree, Formula, Grammar, SolverOptions};

/// Port for a grammar-constrained sample generator
///
/// A solver produces samples of a grammar's language that satisfy the
/// formula it was built with. Calls are strictly sequential.
///
/// # Examples
///
/// ```no_run
/// use condmine::domain::ports::Solver;
/// use condmine::domain::SolverError;
///
/// fn draw(solver: &mut dyn Solver, n: usize) -> Result<Vec<String>, SolverError> {
///     (0..n).map(|_| solver.solve().map(|s| s.to_string())).collect()
/// }
/// ```
pub trait Solver {
    /// Produce the next sample
    ///
    /// # Returns
    ///
    /// * `Ok(DerivationTree)` - A new sample
    /// * `Err(SolverError::Exhausted)` - The constrained language has no
    ///   further distinct solutions
    /// * `Err(SolverError::Timeout(_))` - The time budget elapsed
    fn solve(&mut self) -> Result<DerivationTree, SolverError>;

    /// Structurally mutate `sample` into a new candidate
    ///
    /// Best effort: the mutant may or may not satisfy the formula.
    fn mutate(&mut self, sample: &DerivationTree) -> Result<DerivationTree, SolverError>;
}

/// Port for constructing solvers scoped to a grammar and formula
pub trait SolverFactory: Send + Sync {
    /// Build a solver for `grammar`, constrained by `formula` when given
    ///
    /// # Arguments
    ///
    /// * `grammar` - The input grammar
    /// * `formula` - Optional constraint every sample must satisfy
    /// * `options` - Tuning options, already merged with per-test overrides
    fn create(
        &self,
        grammar: &Grammar,
        formula: Option<&Formula>,
        options: &SolverOptions,
    ) -> Result<Box<dyn Solver>, SolverError>;
}
