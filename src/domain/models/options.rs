//! Tuning options handed to solvers and learners.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Solver tuning used when the suite constructs a solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverOptions {
    /// Time budget per solver call in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Expansion depth after which derivations are closed off
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Candidate derivations tried per solve/mutate call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Only yield samples not returned before by the same solver
    #[serde(default = "default_distinct")]
    pub distinct: bool,

    /// Seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,

    /// Free-form options for external solvers
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

const fn default_max_depth() -> usize {
    16
}

const fn default_max_attempts() -> usize {
    1000
}

const fn default_distinct() -> bool {
    true
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            max_depth: default_max_depth(),
            max_attempts: default_max_attempts(),
            distinct: default_distinct(),
            seed: None,
            extra: BTreeMap::new(),
        }
    }
}

impl SolverOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// These options with every field set in `overrides` replaced.
    #[must_use]
    pub fn apply(&self, overrides: &SolverOverrides) -> Self {
        let mut extra = self.extra.clone();
        extra.extend(overrides.extra.clone());
        Self {
            timeout_ms: overrides.timeout_ms.or(self.timeout_ms),
            max_depth: overrides.max_depth.unwrap_or(self.max_depth),
            max_attempts: overrides.max_attempts.unwrap_or(self.max_attempts),
            distinct: overrides.distinct.unwrap_or(self.distinct),
            seed: overrides.seed.or(self.seed),
            extra,
        }
    }
}

/// Per-test solver overrides. Unset fields keep the suite defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverOverrides {
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub max_attempts: Option<usize>,
    #[serde(default)]
    pub distinct: Option<bool>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SolverOverrides {
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    #[must_use]
    pub const fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = Some(distinct);
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Learner tuning for one observable test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LearnerOptions {
    /// Restrict learning to these pattern names (all patterns when unset)
    #[serde(default)]
    pub activated_patterns: Option<BTreeSet<String>>,

    /// Free-form options for the learner
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LearnerOptions {
    #[must_use]
    pub fn with_patterns<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.activated_patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}
