//! Domain layer for the condmine harness
//!
//! This module contains the condition algebra, the data model shared by the
//! services, and the port traits implemented by external collaborators.

pub mod error;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use error::{
    ConditionError, GrammarError, HarnessError, HarnessResult, LearnerError, SolverError,
};
