//! Domain errors for the condmine harness.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the condition algebra.
///
/// All of these signal misuse by the caller. They are the only errors that
/// escape the suite's public entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("Cannot trigger derived condition '{description}': only leaf conditions can be triggered")]
    InvalidOperation { description: String },

    #[error("A {operator} condition needs at least one sub-condition")]
    EmptyComposite { operator: &'static str },

    #[error("Condition '{description}' is already being observed")]
    ObservationInFlight { description: String },
}

/// Errors raised while building or tokenizing a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("Grammar has no start symbol {0}")]
    MissingStart(String),

    #[error("Nonterminal {0} has no alternatives")]
    EmptyRule(String),

    #[error("Invalid nonterminal name: {0}. Must be enclosed in angle brackets")]
    InvalidNonterminal(String),
}

/// Errors raised by a solver while generating or mutating samples.
///
/// `Exhausted` and `Timeout` are expected signals: discovery stops early and
/// keeps whatever it collected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("No more distinct solutions")]
    Exhausted,

    #[error("Solver timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unsupported formula: {0}")]
    UnsupportedFormula(String),

    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("Solver failed: {0}")]
    Failed(String),
}

impl SolverError {
    /// Whether this error is one of the expected end-of-stream signals.
    pub const fn is_expected(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Timeout(_))
    }
}

/// Errors raised by a learner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LearnerError {
    #[error("Oracle misuse: {0}")]
    Oracle(#[from] ConditionError),

    #[error("Learner failed: {0}")]
    Failed(String),
}

/// Errors escaping the suite's public entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    #[error("Condition error: {0}")]
    Condition(#[from] ConditionError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
