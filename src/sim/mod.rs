//! Coordination-game simulation core.
//!
//! This module contains the learners, the pairing schedule and the round
//! engine. A simulation is a population of agents that repeatedly play a
//! pure coordination game: each pair scores a success when both pick the
//! same colour.
//!
//! # Overview
//!
//! Each round:
//! 1. [`pairs_for_round`] splits the population into disjoint pairs
//! 2. Both agents of a pair announce a [`Signal`] allowed by the run's
//!    [`SignalCondition`]
//! 3. Each commits to a [`Choice`], deferring to a partner's signal when it
//!    has none of its own
//! 4. Both update their beliefs from the outcome
//!
//! Every tenth round the [`Environment`] checks whether all agents' latest
//! choices agree; a run ends on agreement or at its round cap.
//!
//! # Learners
//!
//! - [`HistoryBasedAgent`]: pseudocount frequency estimates
//! - [`RewardBasedAgent`]: success/failure driven probability updates
//!
//! # Example
//!
//! ```
//! use convention_sim::sim::{AgentSpec, Environment, SignalCondition};
//!
//! let roster = vec![AgentSpec::history("Ann"), AgentSpec::reward("Bob")];
//! let mut env = Environment::new(&roster, SignalCondition::OptionalSignal, Some(42)).unwrap();
//! let outcome = env.run_simulation(1_000);
//! println!("{:?}", outcome);
//! for snapshot in env.snapshots() {
//!     println!("{}", snapshot.summary());
//! }
//! ```

pub mod agent;
pub mod config;
pub mod environment;
pub mod history;
pub mod recorder;
pub mod reward;
pub mod schedule;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenient access
pub use agent::{resolve_choice, Agent, AgentKind, AgentSnapshot, InteractionRecord};
pub use config::{uniform_roster, validate_roster, AgentSpec, ConfigError, HistoryParams, RewardParams};
pub use environment::{
    Environment, SimulationOutcome, SimulationState, CONVERGENCE_CHECK_INTERVAL, DEFAULT_MAX_ROUNDS,
};
pub use history::{HistoryBasedAgent, SignalTally};
pub use recorder::{InteractionRecorder, LoggedInteraction, MemoryRecorder, NullRecorder, RoundStats};
pub use reward::RewardBasedAgent;
pub use schedule::{cycle_length, pairs_for_round, sitting_out, Pair};
pub use types::{Choice, Signal, SignalCondition, StrategyKind};
