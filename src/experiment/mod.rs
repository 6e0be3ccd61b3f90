//! Experiment driver: sweeps of many independent simulations.
//!
//! An experiment crosses signal conditions, strategies and population sizes,
//! runs each combination repeatedly, and summarises how often and how fast
//! populations settled on a convention.
//!
//! # Example
//!
//! ```
//! use convention_sim::experiment::{run_experiment, ExperimentConfig};
//! use convention_sim::sim::{SignalCondition, StrategyKind};
//!
//! let config = ExperimentConfig::quick()
//!     .with_agent_sizes(vec![2, 4])
//!     .with_runs(3)
//!     .with_seed(7)
//!     .single(SignalCondition::MandatorySignal, StrategyKind::HistoryBased);
//!
//! let results = run_experiment(&config, |_, _, _| {}).unwrap();
//! results.print_summary();
//! ```

pub mod config;
pub mod output;
pub mod runner;

pub use config::ExperimentConfig;
pub use output::{ExperimentResults, ScenarioSummary};
pub use runner::{run_experiment, run_scenario, run_single, run_trial, scenarios, trial_seed, Scenario, SingleRunReport};
