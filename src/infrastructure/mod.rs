//! Infrastructure layer module
//!
//! Configuration loading and logging setup for harness runs.

pub mod config;
pub mod logging;
