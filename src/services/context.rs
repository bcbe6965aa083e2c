//! Shared state the discovery, learning and accuracy services read from.

use std::fmt;
use std::sync::Arc;

use crate::domain::error::{ConditionError, SolverError};
use crate::domain::models::{
    DerivationTree, Formula, Grammar, ObservableTest, SolverOptions, SuiteSettings,
};
use crate::domain::ports::{Learner, Solver, SolverFactory};

/// Converts a sample into the input handed to test functions.
pub type InputAdapter = Arc<dyn Fn(&DerivationTree) -> String + Send + Sync>;

/// Grammar, base formula, collaborators and settings of one suite.
#[derive(Clone)]
pub struct SuiteContext {
    pub grammar: Grammar,
    pub formula: Option<Formula>,
    pub solvers: Arc<dyn SolverFactory>,
    pub learner: Arc<dyn Learner>,
    pub settings: SuiteSettings,
    pub input_adapter: Option<InputAdapter>,
}

impl SuiteContext {
    pub fn new(
        grammar: Grammar,
        formula: Option<Formula>,
        solvers: Arc<dyn SolverFactory>,
        learner: Arc<dyn Learner>,
    ) -> Self {
        Self {
            grammar,
            formula,
            solvers,
            learner,
            settings: SuiteSettings::default(),
            input_adapter: None,
        }
    }

    /// Test function input for `sample`.
    pub fn render(&self, sample: &DerivationTree) -> String {
        self.input_adapter
            .as_ref()
            .map_or_else(|| sample.to_string(), |adapt| adapt(sample))
    }

    /// Reset the test's condition, run it on `sample`, read the condition.
    pub fn classify(
        &self,
        test: &ObservableTest,
        sample: &DerivationTree,
    ) -> Result<bool, ConditionError> {
        test.classify(&self.render(sample))
    }

    /// Suite solver options with the test's overrides applied.
    pub fn solver_options(&self, test: &ObservableTest) -> SolverOptions {
        test.solver_overrides().map_or_else(
            || self.settings.solver.clone(),
            |overrides| self.settings.solver.apply(overrides),
        )
    }

    /// Build a solver for `test` constrained by `formula`.
    pub fn build_solver(
        &self,
        test: &ObservableTest,
        formula: Option<&Formula>,
    ) -> Result<Box<dyn Solver>, SolverError> {
        self.solvers
            .create(&self.grammar, formula, &self.solver_options(test))
    }
}

impl fmt::Debug for SuiteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteContext")
            .field("grammar", &self.grammar)
            .field("formula", &self.formula)
            .field("settings", &self.settings)
            .field("input_adapter", &self.input_adapter.is_some())
            .finish_non_exhaustive()
    }
}
