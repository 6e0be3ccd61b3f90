//! Batch execution of simulation scenarios.
//!
//! Trials within a scenario are independent, so they run in parallel on the
//! rayon pool. Every trial gets a seed derived from the experiment's base seed
//! and its own coordinates, which keeps results identical across thread
//! counts.

use std::fmt;

use log::{info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

use super::config::ExperimentConfig;
use super::output::{ExperimentResults, ScenarioSummary};
use crate::sim::{
    uniform_roster, AgentSnapshot, AgentSpec, Choice, ConfigError, Environment, RoundStats, SignalCondition,
    SimulationOutcome, StrategyKind,
};

/// One cell of the experiment grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scenario {
    /// Signal condition for every trial.
    pub condition: SignalCondition,
    /// Learning rule shared by the whole population.
    pub strategy: StrategyKind,
    /// Number of agents.
    pub population: usize,
}

impl Scenario {
    /// Create a scenario.
    pub fn new(condition: SignalCondition, strategy: StrategyKind, population: usize) -> Self {
        Self {
            condition,
            strategy,
            population,
        }
    }

    /// Grouping key shared by all population sizes, e.g.
    /// `"Mandatory Signal - History Based"`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.condition.label(), self.strategy.label())
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} agents)", self.label(), self.population)
    }
}

/// Every scenario of `config`, conditions outermost and sizes innermost.
pub fn scenarios(config: &ExperimentConfig) -> Vec<Scenario> {
    let mut out = Vec::with_capacity(config.num_scenarios());
    for &condition in &config.conditions {
        for &strategy in &config.strategies {
            for &population in &config.agent_sizes {
                out.push(Scenario::new(condition, strategy, population));
            }
        }
    }
    out
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for one trial, derived from the base seed and the trial's position
/// in the grid.
pub fn trial_seed(base_seed: u64, scenario: &Scenario, trial: usize) -> u64 {
    [
        scenario.condition as u64,
        scenario.strategy as u64,
        scenario.population as u64,
        trial as u64,
    ]
    .into_iter()
    .fold(splitmix64(base_seed), |acc, part| splitmix64(acc ^ part))
}

/// Run one trial of `scenario` with a fresh population.
pub fn run_trial(scenario: &Scenario, config: &ExperimentConfig, seed: u64) -> Result<SimulationOutcome, ConfigError> {
    let roster = uniform_roster(scenario.population, scenario.strategy, &config.history, &config.reward);
    let mut env = Environment::new(&roster, scenario.condition, Some(seed))?;
    Ok(env.run_simulation(config.max_rounds))
}

/// Run every trial of `scenario` in parallel and aggregate them.
///
/// Uses `config.seed` as the base seed, drawing one when it is unset.
pub fn run_scenario(scenario: &Scenario, config: &ExperimentConfig) -> Result<ScenarioSummary, ConfigError> {
    let base_seed = config.seed.unwrap_or_else(rand::random);

    let outcomes = (0..config.runs_per_scenario)
        .into_par_iter()
        .map(|trial| run_trial(scenario, config, trial_seed(base_seed, scenario, trial)))
        .collect::<Result<Vec<_>, _>>()?;

    let summary = ScenarioSummary::from_outcomes(*scenario, &outcomes);
    info!(
        "{}: avg rounds {:.1}, converged {:.0}%, blue {:.0}%",
        scenario,
        summary.avg_rounds,
        summary.convergence_rate * 100.0,
        summary.blue_convergence_rate * 100.0
    );
    Ok(summary)
}

/// Run the whole grid.
///
/// `progress` is called after each scenario with the number of scenarios
/// finished, the total, and the scenario's summary.
///
/// # Example
/// ```
/// use convention_sim::experiment::{run_experiment, ExperimentConfig};
///
/// let config = ExperimentConfig::quick().with_agent_sizes(vec![2]).with_runs(2).with_seed(3);
/// let results = run_experiment(&config, |done, total, _| assert!(done <= total)).unwrap();
/// assert_eq!(results.scenarios.len(), 6);
/// ```
pub fn run_experiment<F>(config: &ExperimentConfig, mut progress: F) -> Result<ExperimentResults, ConfigError>
where
    F: FnMut(usize, usize, &ScenarioSummary),
{
    config.validate()?;

    let base_seed = config.seed.unwrap_or_else(rand::random);
    let seeded = ExperimentConfig {
        seed: Some(base_seed),
        ..config.clone()
    };

    let pool = match config.num_threads {
        Some(threads) => match ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("could not build a {}-thread pool, using the global pool: {}", threads, e);
                None
            }
        },
        None => None,
    };

    let grid = scenarios(config);
    let total = grid.len();
    info!(
        "running {} scenarios x {} runs (base seed {})",
        total, config.runs_per_scenario, base_seed
    );

    let mut summaries = Vec::with_capacity(total);
    for (done, scenario) in grid.iter().enumerate() {
        let summary = match &pool {
            Some(pool) => pool.install(|| run_scenario(scenario, &seeded))?,
            None => run_scenario(scenario, &seeded)?,
        };
        progress(done + 1, total, &summary);
        summaries.push(summary);
    }

    Ok(ExperimentResults {
        config: seeded,
        base_seed,
        scenarios: summaries,
    })
}

/// Detailed record of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleRunReport {
    /// Signal condition used.
    pub condition: SignalCondition,
    /// Seed the run was played with.
    pub seed: u64,
    /// How the run ended.
    pub outcome: SimulationOutcome,
    /// Final state of every agent.
    pub agents: Vec<AgentSnapshot>,
    /// Mean per-round success rate over the run.
    pub mean_success_rate: f64,
    /// Mean per-round Blue share over the run.
    pub mean_blue_ratio: f64,
    /// Round statistics sampled every `sample_interval` rounds.
    pub samples: Vec<RoundStats>,
}

impl SingleRunReport {
    /// Colour the population settled on, if any.
    pub fn convention(&self) -> Option<Choice> {
        self.outcome.convergence_choice
    }
}

/// Play one run and keep the agents' final state.
///
/// `sample_interval` of 0 keeps no samples.
pub fn run_single(
    roster: &[AgentSpec],
    condition: SignalCondition,
    max_rounds: u64,
    seed: Option<u64>,
    sample_interval: u64,
) -> Result<SingleRunReport, ConfigError> {
    let seed = seed.unwrap_or_else(rand::random);
    let mut env = Environment::new(roster, condition, Some(seed))?;

    let mut samples = Vec::new();
    let outcome = env.run_with_callback(max_rounds, sample_interval, |stats| samples.push(*stats));

    Ok(SingleRunReport {
        condition,
        seed,
        outcome,
        agents: env.snapshots(),
        mean_success_rate: env.mean_success_rate(),
        mean_blue_ratio: env.mean_blue_ratio(),
        samples,
    })
}
