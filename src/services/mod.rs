//! Service layer
//!
//! Discovery, learning and accuracy evaluation built on the domain ports,
//! plus the observable test suite that drives them.

pub mod accuracy;
pub mod context;
pub mod discovery;
pub mod evaluation;
pub mod learning;
pub mod test_suite;

pub use accuracy::{AccuracyEvaluator, AccuracyRecord, Measurement, StreamSplit};
pub use context::{InputAdapter, SuiteContext};
pub use discovery::{fuzz_samples, DiscoveryOutcome, DiscoveryStop, SampleDiscovery};
pub use evaluation::{EvaluationReport, EvaluationRow, PreconditionDump};
pub use learning::{learn_test_preconditions, LearningAttempt, LearningRun, TestResult};
pub use test_suite::ObservableTestSuite;
