//! Agent parameters, roster entries and configuration errors.
//!
//! Every tunable knob of a simulation lives here. Parameters are fixed when
//! an agent is constructed; each agent in a roster may carry its own values.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::types::StrategyKind;

/// Parameters of the frequency (pseudocount) learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryParams {
    /// Prior strength: synthetic observations seeding every tally.
    pub pseudo_count: f64,

    /// Extra weight credited after successfully following a partner's signal.
    pub learning_step_follow: f64,
}

impl Default for HistoryParams {
    fn default() -> Self {
        Self {
            pseudo_count: 2.0,
            learning_step_follow: 0.5,
        }
    }
}

impl HistoryParams {
    /// Builder method: set the pseudocount.
    pub fn with_pseudo_count(mut self, pseudo_count: f64) -> Self {
        self.pseudo_count = pseudo_count;
        self
    }

    /// Builder method: set the follow-reinforcement step.
    pub fn with_learning_step_follow(mut self, step: f64) -> Self {
        self.learning_step_follow = step;
        self
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pseudo_count.is_finite() && self.pseudo_count > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "pseudo_count",
                value: self.pseudo_count,
            });
        }
        if !(self.learning_step_follow.is_finite() && self.learning_step_follow >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "learning_step_follow",
                value: self.learning_step_follow,
            });
        }
        Ok(())
    }
}

/// Parameters of the reinforcement learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardParams {
    /// Step size after a success.
    pub alpha: f64,

    /// Step size after a failure.
    pub beta: f64,

    /// Multiplier on `alpha` for the extra push when the agent's own signal
    /// won a conflicting round.
    pub conflict_learning_boost: f64,

    /// Starting Blue preference for unresolved choices.
    pub initial_p_choice_blue: f64,

    /// Starting probability of sending any signal under optional signalling.
    pub initial_p_send_signal: f64,

    /// Starting probability that a sent signal is Blue.
    pub initial_p_signal_blue: f64,
}

impl Default for RewardParams {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            beta: 0.2,
            conflict_learning_boost: 1.5,
            initial_p_choice_blue: 0.5,
            initial_p_send_signal: 0.5,
            initial_p_signal_blue: 0.5,
        }
    }
}

impl RewardParams {
    /// Builder method: set both step sizes.
    pub fn with_rates(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    /// Builder method: set the conflict boost multiplier.
    pub fn with_conflict_boost(mut self, boost: f64) -> Self {
        self.conflict_learning_boost = boost;
        self
    }

    /// Builder method: set all three starting probabilities.
    pub fn with_initial_probabilities(mut self, choice_blue: f64, send: f64, signal_blue: f64) -> Self {
        self.initial_p_choice_blue = choice_blue;
        self.initial_p_send_signal = send;
        self.initial_p_signal_blue = signal_blue;
        self
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("initial_p_choice_blue", self.initial_p_choice_blue),
            ("initial_p_send_signal", self.initial_p_send_signal),
            ("initial_p_signal_blue", self.initial_p_signal_blue),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }
        if !(self.conflict_learning_boost.is_finite() && self.conflict_learning_boost >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "conflict_learning_boost",
                value: self.conflict_learning_boost,
            });
        }
        Ok(())
    }
}

/// One roster entry: which learner to build, its name and its parameters.
///
/// Only the parameter block matching `strategy` is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Learning rule.
    pub strategy: StrategyKind,

    /// Display name, unique within a roster.
    pub name: String,

    /// Frequency learner parameters.
    #[serde(default)]
    pub history: HistoryParams,

    /// Reinforcement learner parameters.
    #[serde(default)]
    pub reward: RewardParams,
}

impl AgentSpec {
    /// Create a spec with default parameters.
    pub fn new(strategy: StrategyKind, name: impl Into<String>) -> Self {
        Self {
            strategy,
            name: name.into(),
            history: HistoryParams::default(),
            reward: RewardParams::default(),
        }
    }

    /// Frequency learner with default parameters.
    pub fn history(name: impl Into<String>) -> Self {
        Self::new(StrategyKind::HistoryBased, name)
    }

    /// Reinforcement learner with default parameters.
    pub fn reward(name: impl Into<String>) -> Self {
        Self::new(StrategyKind::RewardBased, name)
    }

    /// Builder method: override frequency learner parameters.
    pub fn with_history_params(mut self, params: HistoryParams) -> Self {
        self.history = params;
        self
    }

    /// Builder method: override reinforcement learner parameters.
    pub fn with_reward_params(mut self, params: RewardParams) -> Self {
        self.reward = params;
        self
    }

    /// Validate the parameter block this spec will actually use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.strategy {
            StrategyKind::HistoryBased => self.history.validate(),
            StrategyKind::RewardBased => self.reward.validate(),
        }
    }
}

/// Build `n` identically configured agents named `Agent 1..=n`.
pub fn uniform_roster(
    n: usize,
    strategy: StrategyKind,
    history: &HistoryParams,
    reward: &RewardParams,
) -> Vec<AgentSpec> {
    (1..=n)
        .map(|i| {
            AgentSpec::new(strategy, format!("Agent {}", i))
                .with_history_params(history.clone())
                .with_reward_params(reward.clone())
        })
        .collect()
}

/// Check a roster before any agent is built.
pub fn validate_roster(roster: &[AgentSpec]) -> Result<(), ConfigError> {
    if roster.is_empty() {
        return Err(ConfigError::EmptyRoster);
    }

    let mut seen = FxHashSet::default();
    for spec in roster {
        spec.validate()?;
        if !seen.insert(spec.name.as_str()) {
            return Err(ConfigError::DuplicateAgentName(spec.name.clone()));
        }
    }

    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// Fatal configuration problems, reported when a simulation is constructed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Strategy name not recognised.
    #[error("unknown strategy kind: {0}")]
    UnknownStrategy(String),

    /// Signal condition name not recognised.
    #[error("unknown signal condition: {0}")]
    UnknownSignalCondition(String),

    /// No agents were supplied.
    #[error("agent roster is empty")]
    EmptyRoster,

    /// Two roster entries share a name.
    #[error("duplicate agent name: {0}")]
    DuplicateAgentName(String),

    /// A numeric parameter is out of its allowed range.
    #[error("invalid value {value} for parameter {name}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// An experiment-level setting is unusable.
    #[error("invalid experiment setting: {0}")]
    InvalidExperiment(String),

    /// Config file could not be read.
    #[error("IO error: {0}")]
    Io(String),

    /// Config file is not valid JSON for the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}
