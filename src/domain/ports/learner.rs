use crate::domain::error::{ConditionError, LearnerError};
use crate::domain::models::{DerivationTree, Formula, Grammar, LearnerOptions};

/// Classifier handed to learners: does the condition trigger on a sample?
pub type Oracle<'a> = dyn Fn(&DerivationTree) -> Result<bool, ConditionError> + 'a;

/// Everything a learner receives for one learning attempt.
pub struct LearningRequest<'a> {
    pub grammar: &'a Grammar,
    pub oracle: &'a Oracle<'a>,
    pub positive: &'a [DerivationTree],
    pub negative: &'a [DerivationTree],
    pub options: &'a LearnerOptions,
}

/// A candidate precondition with the learner's own statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnedFormula {
    pub formula: Formula,
    pub precision: f64,
    pub recall: f64,
}

impl LearnedFormula {
    pub const fn new(formula: Formula, precision: f64, recall: f64) -> Self {
        Self {
            formula,
            precision,
            recall,
        }
    }
}

/// Port for the invariant learner
///
/// Given classified example pools, proposes candidate formulas that predict
/// the condition. Returning no candidates is a legitimate outcome.
pub trait Learner: Send + Sync {
    /// Learn candidate preconditions
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<LearnedFormula>)` - Candidates, possibly empty
    /// * `Err(LearnerError::Oracle(_))` - The oracle reported condition misuse
    /// * `Err(LearnerError::Failed(_))` - Learning failed; treated as no result
    fn learn(&self, request: &LearningRequest<'_>) -> Result<Vec<LearnedFormula>, LearnerError>;
}
