//! # Convention Sim
//!
//! Agent-based simulation of convention formation in a Red/Blue coordination
//! game. A population of learning agents is repeatedly paired off; each pair
//! may exchange colour signals before committing to a colour, and scores a
//! success when both commit to the same one. Over time the population tends
//! to agree on a single colour.
//!
//! ## Features
//!
//! - **Two learning rules**: pseudocount frequency learners and
//!   reinforcement learners, freely mixed in one population
//! - **Three signal conditions**: no signalling, mandatory signalling and
//!   optional signalling
//! - **Fair pairing**: a rotating round-robin schedule that meets every pair
//!   once per cycle
//! - **Reproducible**: every run is driven by one seeded generator
//! - **Parallel experiments**: sweep conditions, strategies and population
//!   sizes across all cores
//!
//! ## Quick Start
//!
//! ```
//! use convention_sim::sim::{Environment, SignalCondition, StrategyKind};
//!
//! let mut env = Environment::uniform(4, StrategyKind::HistoryBased, SignalCondition::MandatorySignal, Some(1)).unwrap();
//! let outcome = env.run_simulation(10_000);
//! if let Some(colour) = outcome.convergence_choice {
//!     println!("settled on {} after {} rounds", colour, outcome.rounds);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`sim`]: Agents, pairing schedule and round engine
//! - [`experiment`]: Batch runs, aggregation and JSON export
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Experiment Driver                           │
//! │  - Scenario grid          - Parallel trials (rayon)             │
//! │  - Aggregation            - JSON export                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ one Environment per trial
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Environment                              │
//! │  - Round schedule         - Convergence check                   │
//! │  - Seeded RNG             - Optional recorder                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ implements Agent trait
//!                               ▼
//!                ┌──────────────┴──────────────┐
//!                ▼                             ▼
//!         ┌─────────────┐               ┌─────────────┐
//!         │  History    │               │   Reward    │
//!         │  Based      │               │   Based     │
//!         └─────────────┘               └─────────────┘
//! ```

#![warn(missing_docs)]

/// Coordination-game simulation module.
///
/// Contains the learners, the pairing schedule and the round engine.
pub mod sim;

/// Experiment driver module.
///
/// Runs grids of scenarios and aggregates their outcomes.
pub mod experiment;

// Re-export commonly used types at crate root for convenience
pub use experiment::{run_experiment, ExperimentConfig, ExperimentResults};
pub use sim::{AgentSpec, Choice, ConfigError, Environment, Signal, SignalCondition, SimulationOutcome, StrategyKind};
