//! Observable test suite.
//!
//! Holds registered observable tests in registration order and drives
//! discovery, learning and accuracy evaluation over them.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::error::{HarnessError, HarnessResult};
use crate::domain::models::{
    Condition, DerivationTree, EvaluationSettings, Formula, Grammar, HarnessConfig,
    ObservableTest, ObserveOptions, SuiteSettings, TestFunction,
};
use crate::domain::ports::{Learner, SolverFactory};

use super::accuracy::{AccuracyEvaluator, AccuracyRecord};
use super::context::SuiteContext;
use super::discovery::{self, DiscoveryOutcome};
use super::evaluation::{EvaluationReport, PreconditionDump};
use super::learning::{learn_test_preconditions, TestResult};

/// Registry of observable tests sharing one grammar, base formula, solver
/// and learner.
#[derive(Debug)]
pub struct ObservableTestSuite {
    context: SuiteContext,
    evaluation: EvaluationSettings,
    tests: Vec<ObservableTest>,
    results: Vec<TestResult>,
}

impl ObservableTestSuite {
    pub fn new(
        grammar: Grammar,
        formula: Option<Formula>,
        solvers: Arc<dyn SolverFactory>,
        learner: Arc<dyn Learner>,
    ) -> Self {
        Self {
            context: SuiteContext::new(grammar, formula, solvers, learner),
            evaluation: EvaluationSettings::default(),
            tests: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Build a suite using the suite and evaluation sections of `config`.
    pub fn from_config(
        config: &HarnessConfig,
        grammar: Grammar,
        formula: Option<Formula>,
        solvers: Arc<dyn SolverFactory>,
        learner: Arc<dyn Learner>,
    ) -> Self {
        Self::new(grammar, formula, solvers, learner)
            .with_settings(config.suite.clone())
            .with_evaluation(config.evaluation.clone())
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SuiteSettings) -> Self {
        self.context.settings = settings;
        self
    }

    #[must_use]
    pub const fn with_evaluation(mut self, evaluation: EvaluationSettings) -> Self {
        self.evaluation = evaluation;
        self
    }

    /// Convert samples with `adapter` before handing them to test functions.
    #[must_use]
    pub fn with_input_adapter<A>(mut self, adapter: A) -> Self
    where
        A: Fn(&DerivationTree) -> String + Send + Sync + 'static,
    {
        self.context.input_adapter = Some(Arc::new(adapter));
        self
    }

    #[must_use]
    pub const fn verbose(mut self) -> Self {
        self.context.settings.verbose = true;
        self
    }

    #[must_use]
    pub const fn silent(mut self) -> Self {
        self.context.settings.verbose = false;
        self
    }

    pub const fn settings(&self) -> &SuiteSettings {
        &self.context.settings
    }

    pub const fn context(&self) -> &SuiteContext {
        &self.context
    }

    /// Register `test_fn` once per condition. Returns the new tests.
    pub fn observe<F, T>(
        &mut self,
        name: &str,
        conditions: impl IntoIterator<Item = Condition>,
        test_fn: F,
    ) -> &[ObservableTest]
    where
        F: Fn(&str) -> T + Send + Sync + 'static,
    {
        self.observe_with(name, conditions, ObserveOptions::default(), test_fn)
    }

    /// Like [`observe`](Self::observe) with learner and solver overrides
    /// applied to every registered test.
    pub fn observe_with<F, T>(
        &mut self,
        name: &str,
        conditions: impl IntoIterator<Item = Condition>,
        options: ObserveOptions,
        test_fn: F,
    ) -> &[ObservableTest]
    where
        F: Fn(&str) -> T + Send + Sync + 'static,
    {
        let shared: TestFunction = Arc::new(move |input: &str| {
            let _ = test_fn(input);
        });

        let first = self.tests.len();
        for condition in conditions {
            self.tests.push(ObservableTest::from_shared(
                name,
                condition,
                Arc::clone(&shared),
                options.clone(),
            ));
        }
        &self.tests[first..]
    }

    pub fn tests(&self) -> &[ObservableTest] {
        &self.tests
    }

    /// Stored results of the last [`learn_preconditions`](Self::learn_preconditions) run.
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Run sample discovery once for `test`.
    pub fn fuzz_samples(&self, test: &ObservableTest) -> HarnessResult<DiscoveryOutcome> {
        Ok(discovery::fuzz_samples(&self.context, test)?)
    }

    /// Learn preconditions for every registered test, replacing earlier results.
    #[instrument(skip_all, fields(tests = self.tests.len()))]
    pub fn learn_preconditions(&mut self) -> HarnessResult<&[TestResult]> {
        if self.context.settings.max_learner_retries == 0 {
            return Err(HarnessError::InvalidSettings(
                "max_learner_retries must be at least 1".to_string(),
            ));
        }

        self.results.clear();
        for test in &self.tests {
            let result = learn_test_preconditions(&self.context, test)?;
            self.results.push(result);
        }

        let learned = self
            .results
            .iter()
            .filter(|result| !result.preconditions.is_empty())
            .count();
        info!(learned, total = self.results.len(), "learning complete");
        Ok(&self.results)
    }

    /// Score every stored precondition with `sample_count` samples per stream.
    pub fn results_accuracy(&self, sample_count: usize) -> HarnessResult<Vec<AccuracyRecord>> {
        if sample_count == 0 {
            return Err(HarnessError::InvalidSettings(
                "sample_count must be at least 1".to_string(),
            ));
        }
        Ok(AccuracyEvaluator::new(&self.context, sample_count).evaluate(&self.results)?)
    }

    /// Score stored preconditions with the configured sample count and
    /// summarize them.
    pub fn evaluate(&self) -> HarnessResult<EvaluationReport> {
        let records = self.results_accuracy(self.evaluation.sample_count)?;
        Ok(EvaluationReport::from_records(&records))
    }

    pub fn dump_preconditions(&self) -> PreconditionDump<'_> {
        PreconditionDump(&self.results)
    }
}
