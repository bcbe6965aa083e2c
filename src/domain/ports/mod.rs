//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces of the harness's external
//! collaborators:
//! - Solver / SolverFactory: grammar-constrained generation and mutation
//! - Learner: precondition inference from classified example pools
//!
//! These traits keep the discovery and learning services independent of
//! any specific solver or learner implementation.

pub mod learner;
pub mod solver;

pub use learner::{LearnedFormula, Learner, LearningRequest, Oracle};
pub use solver::{Solver, SolverFactory};
