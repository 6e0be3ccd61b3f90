//! Aggregated experiment results and export utilities.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::config::ExperimentConfig;
use super::runner::Scenario;
use crate::sim::{Choice, SignalCondition, SimulationOutcome, StrategyKind};

/// Aggregate of all trials of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    /// Which grid cell this is.
    pub scenario: Scenario,
    /// Trials played.
    pub runs: usize,
    /// Trials that converged.
    pub converged_runs: usize,
    /// Mean rounds played per trial, converged or not.
    pub avg_rounds: f64,
    /// Share of trials that converged.
    pub convergence_rate: f64,
    /// Share of converged trials that settled on Blue (0 if none converged).
    pub blue_convergence_rate: f64,
    /// Fewest rounds in any trial.
    pub min_rounds: u64,
    /// Most rounds in any trial.
    pub max_rounds_observed: u64,
}

impl ScenarioSummary {
    /// Aggregate trial outcomes. An empty slice gives all zeros.
    pub fn from_outcomes(scenario: Scenario, outcomes: &[SimulationOutcome]) -> Self {
        let runs = outcomes.len();
        let converged_runs = outcomes.iter().filter(|o| o.converged).count();
        let blue_runs = outcomes
            .iter()
            .filter(|o| o.convergence_choice == Some(Choice::Blue))
            .count();

        let ratio = |num: usize, den: usize| if den > 0 { num as f64 / den as f64 } else { 0.0 };
        let total_rounds: u64 = outcomes.iter().map(|o| o.rounds).sum();

        Self {
            scenario,
            runs,
            converged_runs,
            avg_rounds: if runs > 0 { total_rounds as f64 / runs as f64 } else { 0.0 },
            convergence_rate: ratio(converged_runs, runs),
            blue_convergence_rate: ratio(blue_runs, converged_runs),
            min_rounds: outcomes.iter().map(|o| o.rounds).min().unwrap_or(0),
            max_rounds_observed: outcomes.iter().map(|o| o.rounds).max().unwrap_or(0),
        }
    }
}

/// Output of [`run_experiment`](super::run_experiment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResults {
    /// Configuration used, with the resolved seed filled in.
    pub config: ExperimentConfig,
    /// Base seed every trial seed was derived from.
    pub base_seed: u64,
    /// One entry per scenario, in grid order.
    pub scenarios: Vec<ScenarioSummary>,
}

impl ExperimentResults {
    /// Look up one scenario.
    pub fn get(
        &self,
        condition: SignalCondition,
        strategy: StrategyKind,
        population: usize,
    ) -> Option<&ScenarioSummary> {
        self.scenarios.iter().find(|s| s.scenario == Scenario::new(condition, strategy, population))
    }

    /// All population sizes of one condition/strategy pair, in grid order.
    pub fn series(&self, condition: SignalCondition, strategy: StrategyKind) -> Vec<&ScenarioSummary> {
        self.scenarios
            .iter()
            .filter(|s| s.scenario.condition == condition && s.scenario.strategy == strategy)
            .collect()
    }

    /// Save to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())
    }

    /// Render the summary table printed by [`print_summary`](Self::print_summary).
    pub fn summary_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Base seed: {}\n", self.base_seed));

        for &condition in &self.config.conditions {
            for &strategy in &self.config.strategies {
                let rows = self.series(condition, strategy);
                if rows.is_empty() {
                    continue;
                }

                out.push_str(&format!("\n=== {} - {} ===\n", condition.label(), strategy.label()));
                out.push_str(&format!(
                    "{:>6} {:>12} {:>10} {:>8} {:>10} {:>10}\n",
                    "Agents", "Avg Rounds", "Converged", "Blue", "Min", "Max"
                ));
                for row in rows {
                    out.push_str(&format!(
                        "{:>6} {:>12.1} {:>9.1}% {:>7.1}% {:>10} {:>10}\n",
                        row.scenario.population,
                        row.avg_rounds,
                        row.convergence_rate * 100.0,
                        row.blue_convergence_rate * 100.0,
                        row.min_rounds,
                        row.max_rounds_observed
                    ));
                }
            }
        }
        out
    }

    /// Print a per-scenario table to stdout.
    pub fn print_summary(&self) {
        print!("{}", self.summary_table());
    }
}
