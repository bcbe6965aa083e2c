pub mod condition;
pub mod config;
pub mod derivation_tree;
pub mod formula;
pub mod grammar;
pub mod options;
pub mod pools;

pub use condition::{Condition, Observation, Probe};
pub use config::{EvaluationSettings, HarnessConfig, LogConfig, LogFormat, RotationPolicy, SuiteSettings};
pub use derivation_tree::{DerivationTree, TreePath};
pub use formula::Formula;
pub use grammar::{Grammar, Symbol, START_SYMBOL};
pub use observable_test::{ObservableTest, ObserveOptions, TestFunction};
pub use options::{LearnerOptions, SolverOptions, SolverOverrides};
pub use pools::{ExamplePools, PoolSizes};
