//! Mock learner for testing.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::error::LearnerError;
use crate::domain::models::PoolSizes;
use crate::domain::ports::{LearnedFormula, Learner, LearningRequest};

/// What the mock saw on one `learn` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerCall {
    pub pools: PoolSizes,
    pub patterns: Option<BTreeSet<String>>,
    /// Positives the oracle re-confirmed, when oracle checking is on
    pub confirmed: Option<usize>,
}

/// Scripted learner.
///
/// Returns nothing for the first `empty_calls` calls, then the configured
/// formulas. Every call is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockLearner {
    formulas: Vec<LearnedFormula>,
    empty_calls: usize,
    failure: Option<String>,
    check_oracle: bool,
    calls: Arc<RwLock<Vec<LearnerCall>>>,
}

impl MockLearner {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn returning(mut self, formulas: Vec<LearnedFormula>) -> Self {
        self.formulas = formulas;
        self
    }

    #[must_use]
    pub const fn after_empty_calls(mut self, calls: usize) -> Self {
        self.empty_calls = calls;
        self
    }

    /// Fail every call with `reason`.
    #[must_use]
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Re-classify every positive sample through the oracle on each call.
    #[must_use]
    pub const fn with_oracle_check(mut self) -> Self {
        self.check_oracle = true;
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<LearnerCall> {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Learner for MockLearner {
    fn learn(&self, request: &LearningRequest<'_>) -> Result<Vec<LearnedFormula>, LearnerError> {
        let confirmed = if self.check_oracle {
            let mut confirmed = 0;
            for sample in request.positive {
                if (request.oracle)(sample)? {
                    confirmed += 1;
                }
            }
            Some(confirmed)
        } else {
            None
        };

        let previous = {
            let mut calls = self.calls.write().unwrap_or_else(PoisonError::into_inner);
            calls.push(LearnerCall {
                pools: PoolSizes {
                    positive: request.positive.len(),
                    negative: request.negative.len(),
                },
                patterns: request.options.activated_patterns.clone(),
                confirmed,
            });
            calls.len() - 1
        };

        if let Some(reason) = &self.failure {
            return Err(LearnerError::Failed(reason.clone()));
        }
        if previous < self.empty_calls {
            return Ok(Vec::new());
        }
        Ok(self.formulas.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ConditionError;
    use crate::domain::models::{DerivationTree, Formula, Grammar, LearnerOptions};

    fn request_with<'a>(
        grammar: &'a Grammar,
        oracle: &'a crate::domain::ports::Oracle<'a>,
        positive: &'a [DerivationTree],
        options: &'a LearnerOptions,
    ) -> LearningRequest<'a> {
        LearningRequest {
            grammar,
            oracle,
            positive,
            negative: &[],
            options,
        }
    }

    #[test]
    fn test_returns_formulas_after_empty_calls() {
        let grammar = Grammar::from_rules([("<start>", vec!["a"])]).unwrap();
        let oracle = |_: &DerivationTree| -> Result<bool, ConditionError> { Ok(true) };
        let positive = vec![DerivationTree::terminal("a")];
        let options = LearnerOptions::default();
        let learner = MockLearner::new()
            .returning(vec![LearnedFormula::new(Formula::atom("f"), 1.0, 0.5)])
            .after_empty_calls(2);

        let request = request_with(&grammar, &oracle, &positive, &options);
        assert!(learner.learn(&request).unwrap().is_empty());
        assert!(learner.learn(&request).unwrap().is_empty());
        assert_eq!(learner.learn(&request).unwrap().len(), 1);
        assert_eq!(learner.call_count(), 3);
        assert_eq!(learner.calls()[0].pools, PoolSizes { positive: 1, negative: 0 });
    }

    #[test]
    fn test_oracle_errors_propagate() {
        let grammar = Grammar::from_rules([("<start>", vec!["a"])]).unwrap();
        let oracle = |_: &DerivationTree| -> Result<bool, ConditionError> {
            Err(ConditionError::ObservationInFlight {
                description: "busy".to_string(),
            })
        };
        let positive = vec![DerivationTree::terminal("a")];
        let options = LearnerOptions::default();
        let learner = MockLearner::new().with_oracle_check();

        let request = request_with(&grammar, &oracle, &positive, &options);
        assert!(matches!(learner.learn(&request), Err(LearnerError::Oracle(_))));
    }

    #[test]
    fn test_failing_learner() {
        let grammar = Grammar::from_rules([("<start>", vec!["a"])]).unwrap();
        let oracle = |_: &DerivationTree| -> Result<bool, ConditionError> { Ok(false) };
        let options = LearnerOptions::default().with_patterns(["Exists String"]);
        let learner = MockLearner::new().failing("no patterns matched");

        let request = request_with(&grammar, &oracle, &[], &options);
        assert_eq!(
            learner.learn(&request),
            Err(LearnerError::Failed("no patterns matched".to_string()))
        );
        assert!(learner.calls()[0].patterns.as_ref().unwrap().contains("Exists String"));
    }
}
