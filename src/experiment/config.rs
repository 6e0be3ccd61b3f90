//! Experiment configuration.
//!
//! An experiment sweeps every combination of signal condition, strategy and
//! population size, repeating each combination a fixed number of times with
//! freshly built agents.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::{ConfigError, HistoryParams, RewardParams, SignalCondition, StrategyKind, DEFAULT_MAX_ROUNDS};

/// Configuration for a batch of simulations.
///
/// # Example
/// ```
/// use convention_sim::experiment::ExperimentConfig;
///
/// let config = ExperimentConfig::default().with_agent_sizes(vec![2, 4]).with_seed(1);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.num_scenarios(), 12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Population sizes to simulate.
    pub agent_sizes: Vec<usize>,

    /// Independent runs per scenario.
    pub runs_per_scenario: usize,

    /// Round cap for each run.
    pub max_rounds: u64,

    /// Base seed for all runs.
    ///
    /// Each run derives its own seed from this and its coordinates, so the
    /// whole experiment is reproducible regardless of thread count. If
    /// `None`, a base seed is drawn once and reported in the results.
    pub seed: Option<u64>,

    /// Signal conditions to sweep.
    pub conditions: Vec<SignalCondition>,

    /// Strategies to sweep.
    pub strategies: Vec<StrategyKind>,

    /// Parameters given to every frequency learner.
    pub history: HistoryParams,

    /// Parameters given to every reinforcement learner.
    pub reward: RewardParams,

    /// Number of worker threads for parallel runs.
    ///
    /// Set to `None` to use all available cores.
    pub num_threads: Option<usize>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            agent_sizes: vec![2, 3, 4, 6, 8, 10, 16, 20],
            runs_per_scenario: 20,
            max_rounds: DEFAULT_MAX_ROUNDS,
            seed: None,
            conditions: SignalCondition::ALL.to_vec(),
            strategies: StrategyKind::ALL.to_vec(),
            history: HistoryParams::default(),
            reward: RewardParams::default(),
            num_threads: None,
        }
    }
}

impl ExperimentConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a small configuration for quick checks.
    pub fn quick() -> Self {
        Self {
            agent_sizes: vec![2, 3, 4],
            runs_per_scenario: 5,
            max_rounds: 10_000,
            ..Default::default()
        }
    }

    /// Builder method: set population sizes.
    pub fn with_agent_sizes(mut self, sizes: Vec<usize>) -> Self {
        self.agent_sizes = sizes;
        self
    }

    /// Builder method: set runs per scenario.
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs_per_scenario = runs;
        self
    }

    /// Builder method: set the round cap.
    pub fn with_max_rounds(mut self, max_rounds: u64) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Builder method: set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder method: restrict to one condition and one strategy.
    pub fn single(mut self, condition: SignalCondition, strategy: StrategyKind) -> Self {
        self.conditions = vec![condition];
        self.strategies = vec![strategy];
        self
    }

    /// Builder method: set number of threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Number of (condition, strategy, size) combinations.
    pub fn num_scenarios(&self) -> usize {
        self.conditions.len() * self.strategies.len() * self.agent_sizes.len()
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent_sizes.is_empty() {
            return Err(ConfigError::InvalidExperiment("no agent sizes given".to_string()));
        }
        if self.agent_sizes.contains(&0) {
            return Err(ConfigError::EmptyRoster);
        }
        if self.runs_per_scenario == 0 {
            return Err(ConfigError::InvalidExperiment(
                "runs_per_scenario must be at least 1".to_string(),
            ));
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::InvalidExperiment("max_rounds must be at least 1".to_string()));
        }
        if self.conditions.is_empty() || self.strategies.is_empty() {
            return Err(ConfigError::InvalidExperiment(
                "at least one condition and one strategy required".to_string(),
            ));
        }
        if self.num_threads == Some(0) {
            return Err(ConfigError::InvalidExperiment("num_threads must be at least 1".to_string()));
        }

        self.history.validate()?;
        self.reward.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExperimentConfig::default();
        assert_eq!(config.agent_sizes, vec![2, 3, 4, 6, 8, 10, 16, 20]);
        assert_eq!(config.runs_per_scenario, 20);
        assert_eq!(config.max_rounds, 100_000);
        assert_eq!(config.num_scenarios(), 3 * 2 * 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_json_config() {
        let json = r#"{
            "agent_sizes": [2, 5],
            "runs_per_scenario": 3,
            "seed": 99,
            "conditions": ["NO_SIGNAL", "OPTIONAL_SIGNAL"],
            "strategies": ["REWARD_BASED"],
            "reward": { "alpha": 0.1 }
        }"#;
        let config = ExperimentConfig::from_json_str(json).unwrap();

        assert_eq!(config.agent_sizes, vec![2, 5]);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.max_rounds, 100_000);
        assert_eq!(config.reward.alpha, 0.1);
        assert_eq!(config.reward.beta, 0.2);
        assert_eq!(config.num_scenarios(), 4);
    }

    #[test]
    fn test_parse_rejects_unknown_condition() {
        let json = r#"{ "conditions": ["SOMETIMES"] }"#;
        assert!(matches!(
            ExperimentConfig::from_json_str(json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            ExperimentConfig::default().with_agent_sizes(vec![2, 0]).validate(),
            Err(ConfigError::EmptyRoster)
        );
        assert!(ExperimentConfig::default().with_runs(0).validate().is_err());
        assert!(ExperimentConfig::default().with_max_rounds(0).validate().is_err());
        assert!(ExperimentConfig::default().with_threads(0).validate().is_err());

        let mut config = ExperimentConfig::default();
        config.history.pseudo_count = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "pseudo_count", .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ExperimentConfig::from_json_file("/nonexistent/experiment.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
