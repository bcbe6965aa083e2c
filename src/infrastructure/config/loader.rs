use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::HarnessConfig;

/// Project-local configuration directory
pub const CONFIG_DIR: &str = ".condmine";

/// Prefix of environment overrides, e.g. `CONDMINE_SUITE__NUM_TRIES`
pub const ENV_PREFIX: &str = "CONDMINE_";

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid target_num_samples: {0}. Must be at least 1")]
    InvalidTargetSamples(usize),

    #[error("Invalid num_tries: {0}. Must be at least 1")]
    InvalidNumTries(usize),

    #[error("Invalid max_learner_retries: {0}. Cannot be 0")]
    InvalidLearnerRetries(u32),

    #[error("Invalid sample_count: {0}. Must be at least 1")]
    InvalidSampleCount(usize),

    #[error("Invalid solver max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .condmine/config.yaml (project config)
    /// 3. .condmine/local.yaml (project local overrides, optional)
    /// 4. Environment variables (CONDMINE_* prefix, `__` separates sections)
    pub fn load() -> Result<HarnessConfig> {
        Self::load_from_dir(".")
    }

    /// Same as [`load`](Self::load) with the project rooted at `root`
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<HarnessConfig> {
        let config_dir = root.as_ref().join(CONFIG_DIR);
        let config: HarnessConfig = Figment::new()
            .merge(Serialized::defaults(HarnessConfig::default()))
            .merge(Yaml::file(config_dir.join("config.yaml")))
            .merge(Yaml::file(config_dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<HarnessConfig> {
        let config: HarnessConfig = Figment::new()
            .merge(Serialized::defaults(HarnessConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &HarnessConfig) -> Result<(), ConfigError> {
        let suite = &config.suite;
        if suite.target_num_samples == 0 {
            return Err(ConfigError::InvalidTargetSamples(suite.target_num_samples));
        }
        if suite.num_tries == 0 {
            return Err(ConfigError::InvalidNumTries(suite.num_tries));
        }
        if suite.max_learner_retries == 0 {
            return Err(ConfigError::InvalidLearnerRetries(suite.max_learner_retries));
        }
        if suite.solver.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(suite.solver.max_attempts));
        }

        if config.evaluation.sample_count == 0 {
            return Err(ConfigError::InvalidSampleCount(config.evaluation.sample_count));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        if config
            .logging
            .log_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(ConfigError::ValidationFailed(
                "logging.log_dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::LogFormat;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.suite.target_num_samples, 200);
        assert_eq!(config.suite.num_tries, 100);
        assert_eq!(config.suite.max_learner_retries, 5);
        assert_eq!(config.evaluation.sample_count, 100);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
suite:
  target_num_samples: 40
  num_tries: 20
  verbose: true
  solver:
    max_depth: 8
    seed: 7
evaluation:
  sample_count: 50
logging:
  level: debug
  format: json
";

        let config: HarnessConfig = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.suite.target_num_samples, 40);
        assert_eq!(config.suite.num_tries, 20);
        assert_eq!(config.suite.max_learner_retries, 5);
        assert!(config.suite.verbose);
        assert_eq!(config.suite.solver.max_depth, 8);
        assert_eq!(config.suite.solver.seed, Some(7));
        assert_eq!(config.suite.solver.max_attempts, 1000);
        assert_eq!(config.evaluation.sample_count, 50);
        assert_eq!(config.logging.format, LogFormat::Json);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_counts() {
        let mut config = HarnessConfig::default();
        config.suite.target_num_samples = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTargetSamples(0))
        );

        let mut config = HarnessConfig::default();
        config.suite.num_tries = 0;
        assert_eq!(ConfigLoader::validate(&config), Err(ConfigError::InvalidNumTries(0)));

        let mut config = HarnessConfig::default();
        config.suite.max_learner_retries = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLearnerRetries(0))
        );

        let mut config = HarnessConfig::default();
        config.evaluation.sample_count = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSampleCount(0))
        );

        let mut config = HarnessConfig::default();
        config.suite.solver.max_attempts = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxAttempts(0))
        );
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = HarnessConfig::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_empty_log_dir() {
        let mut config = HarnessConfig::default();
        config.logging.log_dir = Some(std::path::PathBuf::new());
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "suite:\n  num_tries: 7\nevaluation:\n  sample_count: 12").unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.suite.num_tries, 7);
        assert_eq!(config.evaluation.sample_count, 12);
        assert_eq!(config.suite.target_num_samples, 200);
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  level: chatty").unwrap();
        file.flush().unwrap();

        let err = ConfigLoader::load_from_file(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_hierarchical_merging() {
        let root = tempfile::tempdir().unwrap();
        let config_dir = root.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.yaml"),
            "suite:\n  num_tries: 30\n  target_num_samples: 60\nlogging:\n  level: warn\n",
        )
        .unwrap();
        std::fs::write(config_dir.join("local.yaml"), "suite:\n  num_tries: 45\n").unwrap();

        temp_env::with_vars(
            [
                ("CONDMINE_LOGGING__LEVEL", Some("debug")),
                ("CONDMINE_EVALUATION__SAMPLE_COUNT", Some("25")),
            ],
            || {
                let config = ConfigLoader::load_from_dir(root.path()).unwrap();
                assert_eq!(config.suite.num_tries, 45, "local.yaml should win");
                assert_eq!(config.suite.target_num_samples, 60, "config.yaml persists");
                assert_eq!(config.logging.level, "debug", "env should win");
                assert_eq!(config.evaluation.sample_count, 25);
            },
        );
    }

    #[test]
    fn test_missing_files_use_defaults() {
        let root = tempfile::tempdir().unwrap();
        temp_env::with_vars_unset(["CONDMINE_LOGGING__LEVEL", "CONDMINE_SUITE__NUM_TRIES"], || {
            let config = ConfigLoader::load_from_dir(root.path()).unwrap();
            assert_eq!(config, HarnessConfig::default());
        });
    }
}
