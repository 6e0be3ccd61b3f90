//! Agent capability set and the tagged variant over the two learners.
//!
//! Every learner follows the same three-step protocol each interaction:
//! announce a signal, commit to a final choice after seeing the partner's
//! signal, then update beliefs from the outcome. Randomness is never owned
//! by an agent; the caller passes the generator into each decision so a run
//! is reproducible from a single seed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::config::{AgentSpec, ConfigError};
use crate::sim::history::HistoryBasedAgent;
use crate::sim::reward::RewardBasedAgent;
use crate::sim::types::{Choice, Signal, SignalCondition, StrategyKind};

/// Everything one agent observed in a single interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Signal this agent sent.
    pub own_signal: Signal,
    /// Signal the partner sent.
    pub opponent_signal: Signal,
    /// This agent's final choice.
    pub own_choice: Choice,
    /// The partner's final choice.
    pub opponent_choice: Choice,
    /// Whether the two choices matched.
    pub success: bool,
}

/// Read-only view of a learner's beliefs, for diagnostics and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum AgentSnapshot {
    /// Frequency learner state.
    History {
        /// Agent name.
        name: String,
        /// `blue_count / total_count`.
        blue_ratio: f64,
        /// Tallies of signal decisions: `[none, blue, red]`.
        signal_counts: [f64; 3],
        /// Tallies of successful rounds per signal category: `[none, blue, red]`.
        signal_success_counts: [f64; 3],
        /// Interactions taken part in.
        interactions: u64,
    },
    /// Reinforcement learner state.
    Reward {
        /// Agent name.
        name: String,
        /// Blue preference for unresolved choices.
        p_choice_blue: f64,
        /// Probability of sending any signal under optional signalling.
        p_send_signal: f64,
        /// Probability a sent signal is Blue.
        p_signal_blue: f64,
        /// Interactions taken part in.
        interactions: u64,
    },
}

impl AgentSnapshot {
    /// Name of the agent this snapshot belongs to.
    pub fn name(&self) -> &str {
        match self {
            AgentSnapshot::History { name, .. } | AgentSnapshot::Reward { name, .. } => name,
        }
    }

    /// One-line summary for console output.
    pub fn summary(&self) -> String {
        match self {
            AgentSnapshot::History { name, blue_ratio, .. } => {
                format!("{}: Blue Ratio = {:.2}", name, blue_ratio)
            }
            AgentSnapshot::Reward {
                name,
                p_choice_blue,
                p_send_signal,
                p_signal_blue,
                ..
            } => format!(
                "{}: p_choice_blue = {:.2}, p_send_signal = {:.2}, p_signal_blue = {:.2}",
                name, p_choice_blue, p_send_signal, p_signal_blue
            ),
        }
    }
}

/// Capability set shared by every learner.
pub trait Agent {
    /// Display name.
    fn name(&self) -> &str;

    /// Decide what to announce under `condition`.
    ///
    /// The result always respects the condition: `None` under
    /// [`SignalCondition::NoSignal`], a colour under
    /// [`SignalCondition::MandatorySignal`], anything under
    /// [`SignalCondition::OptionalSignal`].
    fn decide_signal<R: Rng + ?Sized>(&mut self, condition: SignalCondition, rng: &mut R) -> Signal;

    /// Commit to a colour after both signals are visible.
    ///
    /// See [`resolve_choice`] for the shared resolution table.
    fn decide_final_choice<R: Rng + ?Sized>(
        &mut self,
        opponent_signal: Signal,
        own_signal: Signal,
        rng: &mut R,
    ) -> Choice;

    /// Learn from the outcome of an interaction.
    fn update(&mut self, record: &InteractionRecord);

    /// Current probability of choosing Blue when no signal settles the choice.
    fn blue_preference(&self) -> f64;

    /// Most recent signal, if any decision was made yet.
    fn last_signal(&self) -> Option<Signal>;

    /// Most recent final choice, if any decision was made yet.
    fn last_choice(&self) -> Option<Choice>;

    /// Snapshot of the learner's beliefs.
    fn snapshot(&self) -> AgentSnapshot;
}

/// Shared choice-resolution table.
///
/// | own | opponent | result |
/// |---|---|---|
/// | none | none | draw from `p_blue` |
/// | none | colour | opponent's colour |
/// | colour | none | own colour |
/// | colour | same colour | that colour |
/// | colour | other colour | draw from `p_blue` |
///
/// A draw is consumed only in the two random rows.
pub fn resolve_choice<R: Rng + ?Sized>(
    own_signal: Signal,
    opponent_signal: Signal,
    p_blue: f64,
    rng: &mut R,
) -> Choice {
    match (own_signal.color(), opponent_signal.color()) {
        (None, Some(theirs)) => theirs,
        (Some(mine), None) => mine,
        (Some(mine), Some(theirs)) if mine == theirs => mine,
        _ => Choice::from_draw(rng.gen::<f64>(), p_blue),
    }
}

/// A learner selected at construction time from a [`StrategyKind`].
#[derive(Debug, Clone)]
pub enum AgentKind {
    /// Frequency learner.
    History(HistoryBasedAgent),
    /// Reinforcement learner.
    Reward(RewardBasedAgent),
}

impl AgentKind {
    /// Build a fresh learner from a roster entry.
    pub fn from_spec(spec: &AgentSpec) -> Result<Self, ConfigError> {
        Ok(match spec.strategy {
            StrategyKind::HistoryBased => {
                AgentKind::History(HistoryBasedAgent::new(spec.name.clone(), spec.history.clone())?)
            }
            StrategyKind::RewardBased => {
                AgentKind::Reward(RewardBasedAgent::new(spec.name.clone(), spec.reward.clone())?)
            }
        })
    }

    /// Which learning rule this agent runs.
    pub fn strategy(&self) -> StrategyKind {
        match self {
            AgentKind::History(_) => StrategyKind::HistoryBased,
            AgentKind::Reward(_) => StrategyKind::RewardBased,
        }
    }
}

impl Agent for AgentKind {
    fn name(&self) -> &str {
        match self {
            AgentKind::History(a) => a.name(),
            AgentKind::Reward(a) => a.name(),
        }
    }

    fn decide_signal<R: Rng + ?Sized>(&mut self, condition: SignalCondition, rng: &mut R) -> Signal {
        match self {
            AgentKind::History(a) => a.decide_signal(condition, rng),
            AgentKind::Reward(a) => a.decide_signal(condition, rng),
        }
    }

    fn decide_final_choice<R: Rng + ?Sized>(
        &mut self,
        opponent_signal: Signal,
        own_signal: Signal,
        rng: &mut R,
    ) -> Choice {
        match self {
            AgentKind::History(a) => a.decide_final_choice(opponent_signal, own_signal, rng),
            AgentKind::Reward(a) => a.decide_final_choice(opponent_signal, own_signal, rng),
        }
    }

    fn update(&mut self, record: &InteractionRecord) {
        match self {
            AgentKind::History(a) => a.update(record),
            AgentKind::Reward(a) => a.update(record),
        }
    }

    fn blue_preference(&self) -> f64 {
        match self {
            AgentKind::History(a) => a.blue_preference(),
            AgentKind::Reward(a) => a.blue_preference(),
        }
    }

    fn last_signal(&self) -> Option<Signal> {
        match self {
            AgentKind::History(a) => a.last_signal(),
            AgentKind::Reward(a) => a.last_signal(),
        }
    }

    fn last_choice(&self) -> Option<Choice> {
        match self {
            AgentKind::History(a) => a.last_choice(),
            AgentKind::Reward(a) => a.last_choice(),
        }
    }

    fn snapshot(&self) -> AgentSnapshot {
        match self {
            AgentKind::History(a) => a.snapshot(),
            AgentKind::Reward(a) => a.snapshot(),
        }
    }
}
