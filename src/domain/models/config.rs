use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::options::SolverOptions;

/// Main configuration structure for condmine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HarnessConfig {
    /// Discovery and learning settings
    #[serde(default)]
    pub suite: SuiteSettings,

    /// Accuracy evaluation settings
    #[serde(default)]
    pub evaluation: EvaluationSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LogConfig,
}

/// Settings of an observable test suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SuiteSettings {
    /// Positive examples discovery aims for
    #[serde(default = "default_target_num_samples")]
    pub target_num_samples: usize,

    /// Bound on exploration draws and on mutation sweeps
    #[serde(default = "default_num_tries")]
    pub num_tries: usize,

    /// Discovery + learning attempts per test
    #[serde(default = "default_max_learner_retries")]
    pub max_learner_retries: u32,

    /// Report discovery examples and learned formulas at info level
    #[serde(default)]
    pub verbose: bool,

    /// Solver options used for discovery and evaluation
    #[serde(default = "default_discovery_solver")]
    pub solver: SolverOptions,
}

const fn default_target_num_samples() -> usize {
    200
}

const fn default_num_tries() -> usize {
    100
}

const fn default_max_learner_retries() -> u32 {
    5
}

fn default_discovery_solver() -> SolverOptions {
    SolverOptions::default()
}

impl Default for SuiteSettings {
    fn default() -> Self {
        Self {
            target_num_samples: default_target_num_samples(),
            num_tries: default_num_tries(),
            max_learner_retries: default_max_learner_retries(),
            verbose: false,
            solver: default_discovery_solver(),
        }
    }
}

impl SuiteSettings {
    /// Both pools must exceed this before exploration stops early.
    pub const fn initial_target(&self) -> usize {
        self.target_num_samples / 5
    }
}

/// Accuracy evaluation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EvaluationSettings {
    /// Samples drawn per stream when scoring a precondition.
    ///
    /// Streams may repeat samples regardless of the solver's `distinct`
    /// setting.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
}

const fn default_sample_count() -> usize {
    100
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            sample_count: default_sample_count(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (json, pretty)
    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// Directory for log files (optional, if None logs only to stdout)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Enable stdout logging
    #[serde(default = "default_true")]
    pub enable_stdout: bool,

    /// Log rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            log_dir: None,
            enable_stdout: true,
            rotation: RotationPolicy::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_format() -> LogFormat {
    LogFormat::Pretty
}

const fn default_true() -> bool {
    true
}
