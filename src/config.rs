//! Generator configuration.
//!
//! Loaded from TOML so the solver budget and the partial-mode slack can be
//! tuned without code changes. Every field has a default, so an empty file
//! is a valid configuration.
//!
//! ```
//! use shift_roster::config::GeneratorConfig;
//! use std::time::Duration;
//!
//! let config = GeneratorConfig::from_toml_str(r#"
//!     time_limit_secs = 10
//!     partial_slack_units = 3
//!     random_seed = 42
//! "#).unwrap();
//!
//! assert_eq!(config.time_limit(), Duration::from_secs(10));
//! assert_eq!(config.partial_slack_units, 3);
//! assert!(config.warm_start);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for one schedule generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct GeneratorConfig {
    /// Solver wall-clock budget in seconds.
    pub time_limit_secs: f64,

    /// Units above the adjusted quota tolerated before partial-mode overage
    /// is penalized.
    pub partial_slack_units: i64,

    /// Seed for reproducible search. Random when unset.
    pub random_seed: Option<u64>,

    /// An annealing run stops after this many consecutive evaluations
    /// without a new best.
    pub unimproved_step_limit: u64,

    /// Try each slot's previous assignee first when building the full-mode
    /// initial roster.
    pub warm_start: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 30.0,
            partial_slack_units: 5,
            random_seed: None,
            unimproved_step_limit: 50_000,
            warm_start: true,
        }
    }
}

impl GeneratorConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid TOML, or holds
    /// out-of-range values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.time_limit_secs.is_finite() || self.time_limit_secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "time_limit_secs must be positive, got {}",
                self.time_limit_secs
            )));
        }
        if self.partial_slack_units < 0 {
            return Err(ConfigError::Invalid(format!(
                "partial_slack_units must not be negative, got {}",
                self.partial_slack_units
            )));
        }
        Ok(())
    }

    /// Solver budget as a `Duration`. Values that do not fit fall back to
    /// the 30 s default.
    pub fn time_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_limit_secs.max(0.0))
            .unwrap_or(Duration::from_secs(30))
    }

    /// Sets the solver budget in seconds.
    pub fn with_time_limit_secs(mut self, secs: f64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    /// Sets the partial-mode slack.
    pub fn with_partial_slack(mut self, units: i64) -> Self {
        self.partial_slack_units = units;
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the local-search stagnation limit.
    pub fn with_unimproved_step_limit(mut self, steps: u64) -> Self {
        self.unimproved_step_limit = steps;
        self
    }

    /// Enables or disables warm start.
    pub fn with_warm_start(mut self, enabled: bool) -> Self {
        self.warm_start = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.time_limit(), Duration::from_secs(30));
        assert_eq!(config.partial_slack_units, 5);
        assert_eq!(config.random_seed, None);
        assert_eq!(config.unimproved_step_limit, 50_000);
        assert!(config.warm_start);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = GeneratorConfig::from_toml_str("").unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_toml_overrides() {
        let config = GeneratorConfig::from_toml_str(
            r#"
            time_limit_secs = 2.5
            random_seed = 7
            warm_start = false
            "#,
        )
        .unwrap();
        assert_eq!(config.time_limit(), Duration::from_millis(2500));
        assert_eq!(config.random_seed, Some(7));
        assert!(!config.warm_start);
        assert_eq!(config.partial_slack_units, 5);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            GeneratorConfig::from_toml_str("time_limit_secs = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GeneratorConfig::from_toml_str("partial_slack_units = -1"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GeneratorConfig::from_toml_str("time_limit_secs = \"soon\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = GeneratorConfig::load("/nonexistent/roster.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_builder() {
        let config = GeneratorConfig::new()
            .with_time_limit_secs(1.0)
            .with_partial_slack(2)
            .with_random_seed(3)
            .with_unimproved_step_limit(100)
            .with_warm_start(false);
        assert_eq!(config.time_limit(), Duration::from_secs(1));
        assert_eq!(config.partial_slack_units, 2);
        assert_eq!(config.random_seed, Some(3));
        assert_eq!(config.unimproved_step_limit, 100);
        assert!(!config.warm_start);
    }
}
