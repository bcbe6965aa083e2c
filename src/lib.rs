//! condmine - condition observation and precondition mining
//!
//! condmine watches test functions through resettable boolean conditions,
//! drives a grammar-based solver toward balanced sets of inputs that do and
//! do not trigger each condition, hands those sets to a learner, and
//! measures how well the learned preconditions predict the condition on
//! fresh inputs.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): condition algebra, samples, grammars,
//!   formulas, configuration, and the solver/learner ports
//! - **Service Layer** (`services`): discovery, learning loop, accuracy
//!   evaluation, and the observable test suite driving them
//! - **Adapters** (`adapters`): a random-derivation grammar fuzzer and a
//!   scripted learner
//! - **Infrastructure Layer** (`infrastructure`): configuration loading and
//!   logging
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use condmine::adapters::{GrammarFuzzerFactory, MockLearner};
//! use condmine::{Grammar, ObservableTestSuite, Probe};
//!
//! fn main() -> anyhow::Result<()> {
//!     let grammar = Grammar::from_rules([
//!         ("<start>", vec!["<digit><digit>"]),
//!         ("<digit>", vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]),
//!     ])?;
//!     let mut suite = ObservableTestSuite::new(
//!         grammar,
//!         None,
//!         Arc::new(GrammarFuzzerFactory::new()),
//!         Arc::new(MockLearner::new()),
//!     );
//!
//!     let over_fifty = Probe::new("value > 50");
//!     let hook = over_fifty.clone();
//!     suite.observe("parse", [over_fifty.condition()], move |input: &str| {
//!         if input.parse::<u32>().is_ok_and(|value| value > 50) {
//!             hook.trigger();
//!         }
//!     });
//!
//!     for result in suite.learn_preconditions()? {
//!         println!("{}: {} preconditions", result.test.name(), result.preconditions.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Condition, DerivationTree, ExamplePools, Formula, Grammar, HarnessConfig, LearnerOptions,
    ObservableTest, ObserveOptions, PoolSizes, Probe, SolverOptions, SolverOverrides,
    SuiteSettings,
};
pub use domain::ports::{LearnedFormula, Learner, Solver, SolverFactory};
pub use domain::{ConditionError, HarnessError, HarnessResult, LearnerError, SolverError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::logging::LoggerImpl;
pub use services::{
    AccuracyRecord, DiscoveryOutcome, EvaluationReport, ObservableTestSuite, PreconditionDump,
    TestResult,
};
