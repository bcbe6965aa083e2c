//! Precondition learning loop.
//!
//! Each attempt runs discovery once, folds its pools into the pools carried
//! over from earlier attempts, and asks the learner for candidates. The
//! loop ends at the first attempt that yields a candidate or when the retry
//! budget is spent. Pools only ever grow across attempts of one run.

use tracing::{debug, info, instrument, warn};

use crate::domain::error::{ConditionError, LearnerError};
use crate::domain::models::{DerivationTree, ExamplePools, Formula, ObservableTest, PoolSizes};
use crate::domain::ports::{LearnedFormula, LearningRequest};

use super::context::SuiteContext;
use super::discovery::{fuzz_samples, DiscoveryStop};

/// Record of one discovery + learning attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningAttempt {
    /// 1-based attempt number
    pub attempt: u32,
    /// Pool sizes contributed by this attempt's discovery run
    pub discovered: PoolSizes,
    /// Pool sizes accumulated over all attempts so far
    pub accumulated: PoolSizes,
    pub stop: DiscoveryStop,
    pub formulas: Vec<LearnedFormula>,
}

/// Learned preconditions of one observable test.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub test: ObservableTest,
    /// Candidate formulas, stripped of learner statistics
    pub preconditions: Vec<Formula>,
    pub attempts: u32,
}

/// Iterator over learning attempts for one test.
///
/// Yields until an attempt produces candidates, an error occurs, or
/// `max_retries` attempts were made.
pub struct LearningRun<'a> {
    context: &'a SuiteContext,
    test: &'a ObservableTest,
    pools: ExamplePools,
    attempt: u32,
    max_retries: u32,
    finished: bool,
}

impl<'a> LearningRun<'a> {
    pub fn new(context: &'a SuiteContext, test: &'a ObservableTest) -> Self {
        Self {
            context,
            test,
            pools: ExamplePools::new(),
            attempt: 0,
            max_retries: context.settings.max_learner_retries,
            finished: false,
        }
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Pools accumulated so far.
    pub const fn pools(&self) -> &ExamplePools {
        &self.pools
    }

    fn step(&mut self) -> Result<LearningAttempt, ConditionError> {
        self.attempt += 1;
        let outcome = fuzz_samples(self.context, self.test)?;
        let discovered = outcome.sizes();
        self.pools.extend(outcome.pools);
        let formulas = self.learn()?;

        debug!(
            attempt = self.attempt,
            positive = self.pools.positive.len(),
            negative = self.pools.negative.len(),
            candidates = formulas.len(),
            "learning attempt complete"
        );

        Ok(LearningAttempt {
            attempt: self.attempt,
            discovered,
            accumulated: self.pools.sizes(),
            stop: outcome.stop,
            formulas,
        })
    }

    fn learn(&self) -> Result<Vec<LearnedFormula>, ConditionError> {
        let oracle = |sample: &DerivationTree| self.context.classify(self.test, sample);
        let options = self.test.learner_options().cloned().unwrap_or_default();
        let request = LearningRequest {
            grammar: &self.context.grammar,
            oracle: &oracle,
            positive: &self.pools.positive,
            negative: &self.pools.negative,
            options: &options,
        };

        match self.context.learner.learn(&request) {
            Ok(formulas) => Ok(formulas),
            Err(LearnerError::Oracle(err)) => Err(err),
            Err(LearnerError::Failed(reason)) => {
                warn!(%reason, "learner failed, treating attempt as empty");
                Ok(Vec::new())
            }
        }
    }
}

impl Iterator for LearningRun<'_> {
    type Item = Result<LearningAttempt, ConditionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.attempt >= self.max_retries {
            return None;
        }
        let result = self.step();
        self.finished = match &result {
            Ok(attempt) => !attempt.formulas.is_empty(),
            Err(_) => true,
        };
        Some(result)
    }
}

/// Run the learning loop for `test` and keep the final candidates.
#[instrument(skip_all, fields(test = %test.name(), condition = %test.condition()))]
pub fn learn_test_preconditions(
    context: &SuiteContext,
    test: &ObservableTest,
) -> Result<TestResult, ConditionError> {
    info!("learning preconditions");

    let mut attempts = 0;
    let mut learned = Vec::new();
    for attempt in LearningRun::new(context, test) {
        let attempt = attempt?;
        attempts = attempt.attempt;
        learned = attempt.formulas;
    }

    if attempts > 1 {
        info!(attempts, "learner needed several attempts");
    }

    if learned.is_empty() {
        warn!(attempts, "no preconditions found");
    } else {
        for candidate in learned.iter().filter(|c| c.precision > 0.0) {
            if context.settings.verbose {
                info!(
                    precision = candidate.precision,
                    recall = candidate.recall,
                    formula = %candidate.formula,
                    "learned precondition"
                );
            } else {
                debug!(
                    precision = candidate.precision,
                    recall = candidate.recall,
                    formula = %candidate.formula,
                    "learned precondition"
                );
            }
        }
    }

    Ok(TestResult {
        test: test.clone(),
        preconditions: learned.into_iter().map(|c| c.formula).collect(),
        attempts,
    })
}
