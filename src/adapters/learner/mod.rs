//! Learner adapters.

pub mod mock;

pub use mock::{LearnerCall, MockLearner};
