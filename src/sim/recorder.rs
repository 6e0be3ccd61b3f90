//! Per-round statistics and opt-in diagnostic sinks.
//!
//! Agents keep only their latest signal and choice. Anything longer-lived
//! (interaction logs, per-round series) goes through an
//! [`InteractionRecorder`] chosen by the caller, so a run of 100,000 rounds
//! stays memory-flat unless a log is asked for.

use serde::{Deserialize, Serialize};

use crate::sim::agent::InteractionRecord;

/// Aggregate outcome of one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundStats {
    /// Round index (1-based; the counter is bumped before play).
    pub round: u64,
    /// Pairs that played.
    pub matchups: usize,
    /// Pairs whose choices matched.
    pub successes: usize,
    /// `successes / matchups`, or 0 when nobody played.
    pub success_rate: f64,
    /// Share of Blue among all final choices, or 0 when nobody played.
    pub blue_ratio: f64,
}

impl RoundStats {
    /// Build stats from raw counts.
    pub fn from_counts(round: u64, matchups: usize, successes: usize, blue_choices: usize) -> Self {
        let (success_rate, blue_ratio) = if matchups > 0 {
            (
                successes as f64 / matchups as f64,
                blue_choices as f64 / (2 * matchups) as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            round,
            matchups,
            successes,
            success_rate,
            blue_ratio,
        }
    }
}

/// Sink for diagnostic output produced while a simulation runs.
///
/// Both hooks default to doing nothing.
pub trait InteractionRecorder {
    /// Called once per agent per interaction, after that agent updated.
    fn record_interaction(&mut self, _round: u64, _agent: usize, _record: &InteractionRecord) {}

    /// Called once at the end of every round.
    fn record_round(&mut self, _stats: &RoundStats) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl InteractionRecorder for NullRecorder {}

/// One logged interaction, tagged with where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoggedInteraction {
    /// Round in which it happened.
    pub round: u64,
    /// Index of the agent whose view this is.
    pub agent: usize,
    /// What the agent saw.
    pub record: InteractionRecord,
}

/// Keeps every interaction and round in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryRecorder {
    /// All interactions in play order.
    pub interactions: Vec<LoggedInteraction>,
    /// Per-round statistics in order.
    pub rounds: Vec<RoundStats>,
}

impl MemoryRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interactions seen by one agent, oldest first.
    pub fn for_agent(&self, agent: usize) -> impl Iterator<Item = &InteractionRecord> + '_ {
        self.interactions
            .iter()
            .filter(move |logged| logged.agent == agent)
            .map(|logged| &logged.record)
    }

    /// Per-round success rates.
    pub fn success_rates(&self) -> Vec<f64> {
        self.rounds.iter().map(|r| r.success_rate).collect()
    }

    /// Per-round Blue ratios.
    pub fn blue_ratios(&self) -> Vec<f64> {
        self.rounds.iter().map(|r| r.blue_ratio).collect()
    }
}

impl InteractionRecorder for MemoryRecorder {
    fn record_interaction(&mut self, round: u64, agent: usize, record: &InteractionRecord) {
        self.interactions.push(LoggedInteraction {
            round,
            agent,
            record: *record,
        });
    }

    fn record_round(&mut self, stats: &RoundStats) {
        self.rounds.push(*stats);
    }
}

impl<T: InteractionRecorder + ?Sized> InteractionRecorder for &mut T {
    fn record_interaction(&mut self, round: u64, agent: usize, record: &InteractionRecord) {
        (**self).record_interaction(round, agent, record);
    }

    fn record_round(&mut self, stats: &RoundStats) {
        (**self).record_round(stats);
    }
}
