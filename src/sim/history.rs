//! Frequency learner.
//!
//! Beliefs are pseudocount-seeded tallies. The Blue preference is the share
//! of Blue among all recorded final choices; optional signalling samples
//! from the empirical distribution of past signal decisions.
//!
//! # Update rule
//!
//! After every interaction:
//! 1. `total_count += 1`, and `blue_count += 1` if the final choice was Blue.
//! 2. The tally for the signal actually sent grows by one. On success the
//!    matching success tally grows too (diagnostic only).
//! 3. Following a partner's signal while silent, and succeeding, credits an
//!    extra `learning_step_follow` to `total_count`, and to `blue_count` only
//!    when the followed colour was Blue.

use rand::Rng;

use crate::sim::agent::{resolve_choice, Agent, AgentSnapshot, InteractionRecord};
use crate::sim::config::{ConfigError, HistoryParams};
use crate::sim::types::{Choice, Signal, SignalCondition};

/// Per-category tallies indexed by signal: none, Blue, Red.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalTally {
    /// Abstentions.
    pub none: f64,
    /// Blue announcements.
    pub blue: f64,
    /// Red announcements.
    pub red: f64,
}

impl SignalTally {
    fn add(&mut self, signal: Signal, amount: f64) {
        match signal {
            Signal::None => self.none += amount,
            Signal::Blue => self.blue += amount,
            Signal::Red => self.red += amount,
        }
    }

    /// Sum of all three tallies.
    pub fn total(&self) -> f64 {
        self.none + self.blue + self.red
    }

    /// `[none, blue, red]`.
    pub fn to_array(&self) -> [f64; 3] {
        [self.none, self.blue, self.red]
    }
}

/// Pseudocount frequency learner.
#[derive(Debug, Clone)]
pub struct HistoryBasedAgent {
    name: String,
    params: HistoryParams,

    blue_count: f64,
    total_count: f64,

    /// How often each signal was chosen.
    signal_counts: SignalTally,

    /// How often each signal category ended in success. Never read back by
    /// decisions; exposed through [`Agent::snapshot`].
    signal_success_counts: SignalTally,

    last_signal: Option<Signal>,
    last_choice: Option<Choice>,
    interactions: u64,
}

impl HistoryBasedAgent {
    /// Create an agent with fresh pseudocount priors.
    ///
    /// With pseudocount `k` the agent starts at Blue preference 1/2, and
    /// under optional signalling abstains with probability 1/2 and sends
    /// each colour with probability 1/4.
    ///
    /// Fails if `params` does not validate; a zero pseudocount would leave
    /// the Blue ratio undefined.
    pub fn new(name: impl Into<String>, params: HistoryParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let k = params.pseudo_count;
        Ok(Self {
            name: name.into(),
            blue_count: k,
            total_count: 2.0 * k,
            signal_counts: SignalTally {
                none: 2.0 * k,
                blue: k,
                red: k,
            },
            signal_success_counts: SignalTally {
                none: k,
                blue: k / 2.0,
                red: k / 2.0,
            },
            params,
            last_signal: None,
            last_choice: None,
            interactions: 0,
        })
    }

    /// `blue_count / total_count`.
    pub fn blue_ratio(&self) -> f64 {
        self.blue_count / self.total_count
    }

    /// Pseudocount-weighted number of Blue choices.
    pub fn blue_count(&self) -> f64 {
        self.blue_count
    }

    /// Pseudocount-weighted number of choices.
    pub fn total_count(&self) -> f64 {
        self.total_count
    }

    /// Signal decision tallies.
    pub fn signal_counts(&self) -> &SignalTally {
        &self.signal_counts
    }

    /// Per-signal success tallies.
    pub fn signal_success_counts(&self) -> &SignalTally {
        &self.signal_success_counts
    }

    /// Parameters this agent was built with.
    pub fn params(&self) -> &HistoryParams {
        &self.params
    }

    fn sample_optional_signal<R: Rng + ?Sized>(&self, rng: &mut R) -> Signal {
        let total = self.signal_counts.total();
        let p_none = self.signal_counts.none / total;
        let p_blue = self.signal_counts.blue / total;

        let r: f64 = rng.gen();
        if r < p_none {
            Signal::None
        } else if r < p_none + p_blue {
            Signal::Blue
        } else {
            Signal::Red
        }
    }
}

impl Agent for HistoryBasedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide_signal<R: Rng + ?Sized>(&mut self, condition: SignalCondition, rng: &mut R) -> Signal {
        let signal = match condition {
            SignalCondition::NoSignal => Signal::None,
            SignalCondition::MandatorySignal => {
                Signal::from(Choice::from_draw(rng.gen::<f64>(), self.blue_ratio()))
            }
            SignalCondition::OptionalSignal => self.sample_optional_signal(rng),
        };

        self.last_signal = Some(signal);
        signal
    }

    fn decide_final_choice<R: Rng + ?Sized>(
        &mut self,
        opponent_signal: Signal,
        own_signal: Signal,
        rng: &mut R,
    ) -> Choice {
        let choice = resolve_choice(own_signal, opponent_signal, self.blue_ratio(), rng);
        self.last_choice = Some(choice);
        choice
    }

    fn update(&mut self, record: &InteractionRecord) {
        self.interactions += 1;

        // Revealed preference
        self.total_count += 1.0;
        if record.own_choice.is_blue() {
            self.blue_count += 1.0;
        }

        // Signal decision frequencies
        self.signal_counts.add(record.own_signal, 1.0);
        if record.success {
            self.signal_success_counts.add(record.own_signal, 1.0);
        }

        // Successfully followed the partner's signal
        if !record.own_signal.is_present()
            && record.success
            && record.opponent_signal.color() == Some(record.own_choice)
        {
            let step = self.params.learning_step_follow;
            if record.own_choice.is_blue() {
                self.blue_count += step;
            }
            self.total_count += step;
        }
    }

    fn blue_preference(&self) -> f64 {
        self.blue_ratio()
    }

    fn last_signal(&self) -> Option<Signal> {
        self.last_signal
    }

    fn last_choice(&self) -> Option<Choice> {
        self.last_choice
    }

    fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot::History {
            name: self.name.clone(),
            blue_ratio: self.blue_ratio(),
            signal_counts: self.signal_counts.to_array(),
            signal_success_counts: self.signal_success_counts.to_array(),
            interactions: self.interactions,
        }
    }
}
