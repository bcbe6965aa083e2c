//! Reference solver: random grammar derivation with rejection sampling.
//!
//! Formula atoms are resolved against a [`ConstraintRegistry`]. Samples are
//! drawn until one satisfies the formula; mutation regenerates one random
//! subtree of a sample.

mod constraints;

pub use constraints::{CompiledFormula, Constraint, ConstraintRegistry};

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::trace;

use crate::domain::error::SolverError;
use crate::domain::models::{DerivationTree, Formula, Grammar, SolverOptions, Symbol};
use crate::domain::ports::{Solver, SolverFactory};

/// Builds [`GrammarFuzzer`]s sharing one constraint registry.
///
/// With a seed set, the n-th solver built (counting from zero) is seeded
/// with `seed + n`. A run is reproducible while every solver draws its own
/// stream.
#[derive(Debug, Clone, Default)]
pub struct GrammarFuzzerFactory {
    constraints: ConstraintRegistry,
    builds: Arc<AtomicU64>,
}

impl GrammarFuzzerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constraints(constraints: ConstraintRegistry) -> Self {
        Self {
            constraints,
            builds: Arc::default(),
        }
    }

    pub const fn constraints(&self) -> &ConstraintRegistry {
        &self.constraints
    }

    /// Number of solvers built so far.
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }
}

impl SolverFactory for GrammarFuzzerFactory {
    fn create(
        &self,
        grammar: &Grammar,
        formula: Option<&Formula>,
        options: &SolverOptions,
    ) -> Result<Box<dyn Solver>, SolverError> {
        let build = self.builds.fetch_add(1, Ordering::Relaxed);
        let options = SolverOptions {
            seed: options.seed.map(|seed| seed.wrapping_add(build)),
            ..options.clone()
        };
        let fuzzer = GrammarFuzzer::new(grammar, formula, &options, &self.constraints)?;
        Ok(Box::new(fuzzer))
    }
}

/// Random derivation solver over one grammar and formula.
#[derive(Debug)]
pub struct GrammarFuzzer {
    grammar: Grammar,
    min_depths: BTreeMap<String, usize>,
    formula: CompiledFormula,
    options: SolverOptions,
    rng: StdRng,
    seen: HashSet<String>,
}

impl GrammarFuzzer {
    /// # Errors
    ///
    /// * `SolverError::UnsupportedFormula` - an atom has no registered predicate
    /// * `SolverError::Failed` - the start symbol has no finite derivation
    pub fn new(
        grammar: &Grammar,
        formula: Option<&Formula>,
        options: &SolverOptions,
        constraints: &ConstraintRegistry,
    ) -> Result<Self, SolverError> {
        let formula = constraints.compile(formula)?;
        let min_depths = grammar.min_depths();
        if !min_depths.contains_key(grammar.start()) {
            return Err(SolverError::Failed(format!(
                "{} has no finite derivation",
                grammar.start()
            )));
        }

        let rng = options
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Ok(Self {
            grammar: grammar.clone(),
            min_depths,
            formula,
            options: options.clone(),
            rng,
            seen: HashSet::new(),
        })
    }

    /// Number of distinct samples returned by `solve` so far.
    pub fn distinct_count(&self) -> usize {
        self.seen.len()
    }

    fn derive(&mut self, symbol: &str, depth: usize) -> DerivationTree {
        let deriver = Deriver {
            grammar: &self.grammar,
            min_depths: &self.min_depths,
            max_depth: self.options.max_depth,
        };
        deriver.derive(symbol, depth, &mut self.rng)
    }

    fn deadline(&self) -> Option<(Instant, Duration)> {
        self.options
            .timeout()
            .map(|budget| (Instant::now() + budget, budget))
    }
}

fn check_deadline(deadline: Option<(Instant, Duration)>) -> Result<(), SolverError> {
    match deadline {
        Some((at, budget)) if Instant::now() >= at => Err(SolverError::Timeout(budget)),
        _ => Ok(()),
    }
}

impl Solver for GrammarFuzzer {
    fn solve(&mut self) -> Result<DerivationTree, SolverError> {
        let deadline = self.deadline();
        let mut repeats = 0;

        for _ in 0..self.options.max_attempts {
            check_deadline(deadline)?;
            let start = self.grammar.start();
            let sample = self.derive(start, 0);
            if !self.formula.holds(&sample) {
                continue;
            }
            if self.options.distinct && !self.seen.insert(sample.to_string()) {
                repeats += 1;
                continue;
            }
            return Ok(sample);
        }

        if repeats > 0 {
            trace!(repeats, distinct = self.seen.len(), "no new sample found");
            Err(SolverError::Exhausted)
        } else {
            Err(SolverError::Failed(format!(
                "no sample satisfying {} in {} attempts",
                self.formula.text(),
                self.options.max_attempts
            )))
        }
    }

    fn mutate(&mut self, sample: &DerivationTree) -> Result<DerivationTree, SolverError> {
        let paths = sample.node_paths();
        if paths.is_empty() {
            return Ok(sample.clone());
        }

        let deadline = self.deadline();
        let mut last = None;
        for _ in 0..self.options.max_attempts.max(1) {
            check_deadline(deadline)?;
            let Some(path) = paths.choose(&mut self.rng) else {
                break;
            };
            let Some(symbol) = sample.get(path).map(|node| node.symbol().to_string()) else {
                continue;
            };
            let subtree = self.derive(&symbol, path.len());
            let Some(mutant) = sample.replace(path, subtree) else {
                continue;
            };
            if self.formula.holds(&mutant) {
                return Ok(mutant);
            }
            last = Some(mutant);
        }

        Ok(last.unwrap_or_else(|| sample.clone()))
    }
}

/// Derivation state borrowed from the fuzzer so the RNG can be passed
/// separately.
struct Deriver<'a> {
    grammar: &'a Grammar,
    min_depths: &'a BTreeMap<String, usize>,
    max_depth: usize,
}

impl Deriver<'_> {
    fn derive(&self, symbol: &str, depth: usize, rng: &mut StdRng) -> DerivationTree {
        let Some(alternatives) = self.grammar.alternatives(symbol) else {
            return DerivationTree::terminal(symbol);
        };

        let scored: Vec<(&String, usize)> = alternatives
            .iter()
            .filter_map(|alt| {
                self.grammar
                    .expansion_depth(alt, self.min_depths)
                    .map(|d| (alt, d))
            })
            .collect();

        // Past the depth bound only the shallowest alternatives are eligible.
        let candidates: Vec<&String> = if depth >= self.max_depth {
            let shallowest = scored.iter().map(|(_, d)| *d).min().unwrap_or(0);
            scored
                .iter()
                .filter(|(_, d)| *d == shallowest)
                .map(|(alt, _)| *alt)
                .collect()
        } else {
            scored.iter().map(|(alt, _)| *alt).collect()
        };

        let Some(expansion) = candidates.choose(rng) else {
            return DerivationTree::node(symbol, Vec::new());
        };

        let children = self
            .grammar
            .tokenize(expansion)
            .into_iter()
            .map(|token| match token {
                Symbol::Terminal(text) => DerivationTree::terminal(text),
                Symbol::Nonterminal(name) => self.derive(&name, depth + 1, rng),
            })
            .collect();
        DerivationTree::node(symbol, children)
    }
}
