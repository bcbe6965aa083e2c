//! Adapters implementing the solver and learner ports.

pub mod fuzzer;
pub mod learner;

pub use fuzzer::{ConstraintRegistry, GrammarFuzzer, GrammarFuzzerFactory};
pub use learner::MockLearner;
