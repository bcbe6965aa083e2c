//! Common test utilities for integration tests
//!
//! Provides the two-digit grammar fixture, subject functions instrumented
//! with probes, and a scripted solver.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use condmine::adapters::{ConstraintRegistry, GrammarFuzzerFactory};
use condmine::{
    DerivationTree, Formula, Grammar, Learner, Probe, Solver, SolverError, SolverFactory,
    SolverOptions, SuiteSettings,
};

/// Grammar of two-digit decimal strings, "00" to "99".
pub fn two_digit_grammar() -> Grammar {
    Grammar::from_rules([
        ("<start>", vec!["<digit><digit>"]),
        ("<digit>", vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]),
    ])
    .expect("two-digit grammar is valid")
}

/// Constraints understood by the fuzzer in these tests.
pub fn digit_constraints() -> ConstraintRegistry {
    ConstraintRegistry::new()
        .with_text("true", |_| true)
        .with_text("first digit >= 5", |s| s.chars().next().is_some_and(|c| c >= '5'))
        .with_text("value > 50", |s| s.parse::<u32>().is_ok_and(|v| v > 50))
        .with_text("value > 100", |s| s.parse::<u32>().is_ok_and(|v| v > 100))
}

pub fn fuzzer_factory() -> Arc<dyn SolverFactory> {
    Arc::new(GrammarFuzzerFactory::with_constraints(digit_constraints()))
}

/// Settings with a fixed seed so runs are reproducible.
pub fn seeded_settings(target: usize, tries: usize, seed: u64) -> SuiteSettings {
    SuiteSettings {
        target_num_samples: target,
        num_tries: tries,
        solver: SolverOptions {
            seed: Some(seed),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Subject: parses the input and triggers `probe` when the value exceeds 50.
pub fn value_over_fifty(probe: &Probe) -> impl Fn(&str) -> Option<u32> + Send + Sync + 'static {
    let hook = probe.clone();
    move |input: &str| {
        let value = input.parse::<u32>().ok()?;
        if value > 50 {
            hook.trigger();
        }
        Some(value)
    }
}

/// Subject: triggers `even` on even values and `zero` on "00".
pub fn classify_digits(even: &Probe, zero: &Probe) -> impl Fn(&str) + Send + Sync + 'static {
    let even = even.clone();
    let zero = zero.clone();
    move |input: &str| {
        if let Ok(value) = input.parse::<u32>() {
            if value % 2 == 0 {
                even.trigger();
            }
            if value == 0 {
                zero.trigger();
            }
        }
    }
}

/// Solver yielding scripted samples, then `end`. Mutation appends a digit
/// from a fixed cycle.
pub struct ScriptedSolver {
    samples: VecDeque<String>,
    end: SolverError,
    cycle: usize,
}

impl ScriptedSolver {
    pub fn new(samples: &[&str], end: SolverError) -> Self {
        Self {
            samples: samples.iter().map(ToString::to_string).collect(),
            end,
            cycle: 0,
        }
    }
}

impl Solver for ScriptedSolver {
    fn solve(&mut self) -> Result<DerivationTree, SolverError> {
        self.samples
            .pop_front()
            .map(DerivationTree::terminal)
            .ok_or_else(|| self.end.clone())
    }

    fn mutate(&mut self, sample: &DerivationTree) -> Result<DerivationTree, SolverError> {
        self.cycle = (self.cycle + 1) % 10;
        let mut text = sample.to_string();
        text.pop();
        text.push_str(&self.cycle.to_string());
        Ok(DerivationTree::terminal(text))
    }
}

/// Factory handing out fresh scripted solvers with the same script.
pub struct ScriptedFactory {
    pub samples: Vec<&'static str>,
    pub end: SolverError,
}

impl SolverFactory for ScriptedFactory {
    fn create(
        &self,
        _grammar: &Grammar,
        _formula: Option<&Formula>,
        _options: &SolverOptions,
    ) -> Result<Box<dyn Solver>, SolverError> {
        Ok(Box::new(ScriptedSolver::new(&self.samples, self.end.clone())))
    }
}

pub fn shared<L: Learner + 'static>(learner: L) -> Arc<dyn Learner> {
    Arc::new(learner)
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
