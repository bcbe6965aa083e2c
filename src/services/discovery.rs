//! Sample discovery.
//!
//! Builds positive/negative example pools for one observable test:
//! 1. Explore: draw fresh samples from the solver until both pools exceed a
//!    fifth of the target, the solver runs dry, or the tries run out.
//! 2. Mutate: sweep every pooled sample through the solver's mutator and
//!    classify the mutants, until the positive pool reaches the target or
//!    the sweep budget is spent.
//!
//! The target is a soft floor. Growth is only checked between sweeps, so the
//! last sweep can overshoot it.

use tracing::{debug, info, instrument, warn};

use crate::domain::error::{ConditionError, SolverError};
use crate::domain::models::{DerivationTree, ExamplePools, ObservableTest, PoolSizes, SuiteSettings};
use crate::domain::ports::Solver;

use super::context::SuiteContext;

/// Why a discovery run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryStop {
    /// The positive pool reached the target.
    TargetReached,
    /// The sweep budget ran out first.
    TriesExhausted,
    /// Exploration found no positive sample to mutate from.
    NoPositiveSeeds,
    /// The solver reported no further distinct solutions.
    SolverExhausted,
    /// A solver call exceeded its time budget.
    SolverTimeout,
    /// The solver could not be built or failed otherwise.
    SolverFailed(String),
}

impl DiscoveryStop {
    fn from_solver(err: &SolverError) -> Self {
        match err {
            SolverError::Exhausted => Self::SolverExhausted,
            SolverError::Timeout(_) => Self::SolverTimeout,
            other => Self::SolverFailed(other.to_string()),
        }
    }
}

/// Pools returned by one discovery run plus how they grew.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    pub pools: ExamplePools,
    /// Pool sizes when exploration ended
    pub exploration: PoolSizes,
    /// Pool sizes after each mutation sweep
    pub rounds: Vec<PoolSizes>,
    pub stop: DiscoveryStop,
}

impl DiscoveryOutcome {
    fn empty(stop: DiscoveryStop) -> Self {
        Self {
            pools: ExamplePools::new(),
            exploration: PoolSizes::default(),
            rounds: Vec::new(),
            stop,
        }
    }

    pub fn sizes(&self) -> PoolSizes {
        self.pools.sizes()
    }
}

/// One exploration + mutation run against a solver.
pub struct SampleDiscovery<'a> {
    solver: &'a mut dyn Solver,
    target_num_samples: usize,
    initial_target: usize,
    num_tries: usize,
}

impl<'a> SampleDiscovery<'a> {
    pub fn new(solver: &'a mut dyn Solver, settings: &SuiteSettings) -> Self {
        Self {
            solver,
            target_num_samples: settings.target_num_samples,
            initial_target: settings.initial_target(),
            num_tries: settings.num_tries,
        }
    }

    /// Run discovery, classifying every sample with `classify`.
    ///
    /// Solver failures end the run early with whatever was collected; only
    /// condition misuse reported by `classify` is returned as an error.
    pub fn run<C>(self, mut classify: C) -> Result<DiscoveryOutcome, ConditionError>
    where
        C: FnMut(&DerivationTree) -> Result<bool, ConditionError>,
    {
        let initial_target = self.initial_target;
        let mut pools = ExamplePools::new();
        let mut stop = None;

        for _ in 0..self.num_tries {
            let sizes = pools.sizes();
            if sizes.positive > initial_target && sizes.negative > initial_target {
                break;
            }
            match self.solver.solve() {
                Ok(sample) => {
                    let triggered = classify(&sample)?;
                    pools.push(sample, triggered);
                }
                Err(err) => {
                    debug!(error = %err, "exploration stopped by solver");
                    stop = Some(DiscoveryStop::from_solver(&err));
                    break;
                }
            }
        }

        let exploration = pools.sizes();
        let mut rounds = Vec::new();

        // Running out of fresh solutions still leaves mutation to try.
        if matches!(stop, None | Some(DiscoveryStop::SolverExhausted)) {
            stop = None;
            let mut sweeps = 0;
            while pools.positive.len() < self.target_num_samples && sweeps < self.num_tries {
                if pools.positive.is_empty() {
                    debug!("no positive examples to mutate");
                    stop = Some(DiscoveryStop::NoPositiveSeeds);
                    break;
                }

                let mut mutants = ExamplePools::new();
                let mut interrupted = None;
                for sample in pools.iter() {
                    match self.solver.mutate(sample) {
                        Ok(mutant) => {
                            let triggered = classify(&mutant)?;
                            mutants.push(mutant, triggered);
                        }
                        Err(err) => {
                            interrupted = Some(err);
                            break;
                        }
                    }
                }

                pools.extend(mutants);
                sweeps += 1;
                rounds.push(pools.sizes());
                debug!(
                    sweep = sweeps,
                    positive = pools.positive.len(),
                    negative = pools.negative.len(),
                    "mutation sweep complete"
                );

                if let Some(err) = interrupted {
                    debug!(error = %err, "mutation stopped by solver");
                    stop = Some(DiscoveryStop::from_solver(&err));
                    break;
                }
            }
        }

        let stop = stop.unwrap_or(if pools.positive.len() >= self.target_num_samples {
            DiscoveryStop::TargetReached
        } else {
            DiscoveryStop::TriesExhausted
        });

        Ok(DiscoveryOutcome {
            pools,
            exploration,
            rounds,
            stop,
        })
    }
}

/// Discover example pools for `test` with a fresh solver scoped to the
/// suite's grammar and base formula.
#[instrument(skip_all, fields(test = %test.name(), condition = %test.condition()))]
pub fn fuzz_samples(
    context: &SuiteContext,
    test: &ObservableTest,
) -> Result<DiscoveryOutcome, ConditionError> {
    let mut solver = match context.build_solver(test, context.formula.as_ref()) {
        Ok(solver) => solver,
        Err(err) => {
            warn!(error = %err, "could not build discovery solver");
            return Ok(DiscoveryOutcome::empty(DiscoveryStop::from_solver(&err)));
        }
    };

    let outcome = SampleDiscovery::new(solver.as_mut(), &context.settings)
        .run(|sample| context.classify(test, sample))?;

    let sizes = outcome.sizes();
    let (positive_example, negative_example) = outcome.pools.midpoints();
    let positive_example = positive_example.map(ToString::to_string);
    let negative_example = negative_example.map(ToString::to_string);
    if context.settings.verbose {
        info!(
            positive = sizes.positive,
            negative = sizes.negative,
            stop = ?outcome.stop,
            positive_example = positive_example.as_deref().unwrap_or("-"),
            negative_example = negative_example.as_deref().unwrap_or("-"),
            "discovered samples"
        );
    } else {
        debug!(
            positive = sizes.positive,
            negative = sizes.negative,
            stop = ?outcome.stop,
            "discovered samples"
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Yields scripted values, then the scripted error; mutants append "'"
    /// to the sample's last terminal.
    struct ScriptedSolver {
        samples: VecDeque<&'static str>,
        end: SolverError,
        mutations: usize,
    }

    impl ScriptedSolver {
        fn new(samples: &[&'static str], end: SolverError) -> Self {
            Self {
                samples: samples.iter().copied().collect(),
                end,
                mutations: 0,
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
            self.mutations += 1;
            Ok(DerivationTree::terminal(format!("{sample}'")))
        }
    }

    fn settings(target: usize, tries: usize) -> SuiteSettings {
        SuiteSettings {
            target_num_samples: target,
            num_tries: tries,
            ..Default::default()
        }
    }

    fn starts_with_p(sample: &DerivationTree) -> Result<bool, ConditionError> {
        Ok(sample.to_string().starts_with('p'))
    }

    #[test]
    fn test_exploration_stops_at_initial_target() {
        let samples = ["p1", "n1", "p2", "n2", "p3", "n3", "p4", "n4"];
        let mut solver = ScriptedSolver::new(&samples, SolverError::Exhausted);
        let settings = settings(5, 100);
        assert_eq!(settings.initial_target(), 1);
        let outcome = SampleDiscovery::new(&mut solver, &settings)
            .run(starts_with_p)
            .unwrap();

        assert_eq!(outcome.exploration, PoolSizes { positive: 2, negative: 2 });
        assert_eq!(solver.samples.len(), 4);
    }

    #[test]
    fn test_no_positive_seeds_keeps_exploration_pools() {
        let mut solver = ScriptedSolver::new(&["n1", "n2", "n3"], SolverError::Exhausted);
        let outcome = SampleDiscovery::new(&mut solver, &settings(20, 100))
            .run(starts_with_p)
            .unwrap();

        assert_eq!(outcome.stop, DiscoveryStop::NoPositiveSeeds);
        assert_eq!(outcome.sizes(), outcome.exploration);
        assert_eq!(outcome.sizes(), PoolSizes { positive: 0, negative: 3 });
        assert!(outcome.rounds.is_empty());
        assert_eq!(solver.mutations, 0);
    }

    #[test]
    fn test_mutation_sweeps_double_the_pools() {
        let mut solver = ScriptedSolver::new(&["p1", "n1"], SolverError::Exhausted);
        let outcome = SampleDiscovery::new(&mut solver, &settings(8, 100))
            .run(starts_with_p)
            .unwrap();

        // Mutants keep their parent's class: 1+1 -> 2+2 -> 4+4 -> 8+8.
        assert_eq!(
            outcome.rounds,
            vec![
                PoolSizes { positive: 2, negative: 2 },
                PoolSizes { positive: 4, negative: 4 },
                PoolSizes { positive: 8, negative: 8 },
            ]
        );
        assert_eq!(outcome.stop, DiscoveryStop::TargetReached);
        assert_eq!(solver.mutations, 2 + 4 + 8);
    }

    #[test]
    fn test_sweep_budget_bounds_mutation() {
        let mut solver = ScriptedSolver::new(&["p1"], SolverError::Exhausted);
        let outcome = SampleDiscovery::new(&mut solver, &settings(1000, 3))
            .run(starts_with_p)
            .unwrap();

        assert_eq!(outcome.rounds.len(), 3);
        assert_eq!(outcome.stop, DiscoveryStop::TriesExhausted);
        assert_eq!(outcome.sizes().positive, 8);
    }

    #[test]
    fn test_timeout_ends_discovery() {
        let timeout = SolverError::Timeout(std::time::Duration::from_millis(10));
        let mut solver = ScriptedSolver::new(&["p1", "n1"], timeout);
        let outcome = SampleDiscovery::new(&mut solver, &settings(100, 100))
            .run(starts_with_p)
            .unwrap();

        assert_eq!(outcome.stop, DiscoveryStop::SolverTimeout);
        assert_eq!(outcome.sizes(), PoolSizes { positive: 1, negative: 1 });
        assert_eq!(solver.mutations, 0);
    }

    #[test]
    fn test_rounds_are_monotonic() {
        let mut solver = ScriptedSolver::new(&["p1", "n1", "n2", "p2"], SolverError::Exhausted);
        let outcome = SampleDiscovery::new(&mut solver, &settings(50, 10))
            .run(starts_with_p)
            .unwrap();

        let mut previous = outcome.exploration;
        for round in &outcome.rounds {
            assert!(round.dominates(previous));
            previous = *round;
        }
        assert_eq!(previous, outcome.sizes());
    }

    #[test]
    fn test_classification_errors_propagate() {
        let mut solver = ScriptedSolver::new(&["p1"], SolverError::Exhausted);
        let result = SampleDiscovery::new(&mut solver, &settings(10, 10)).run(|_| {
            Err(ConditionError::ObservationInFlight {
                description: "busy".to_string(),
            })
        });
        assert!(result.is_err());
    }
}
