//! Reinforcement learner.
//!
//! Holds three probabilities, each nudged toward or away from the behaviour
//! that was just exercised: toward it after a success with step `alpha`,
//! away from it after a failure with step `beta`. A move toward 1 is
//! `p += a * (1 - p)`; a move toward 0 is `p -= a * p`.

use rand::Rng;

use crate::sim::agent::{resolve_choice, Agent, AgentSnapshot, InteractionRecord};
use crate::sim::config::{ConfigError, RewardParams};
use crate::sim::types::{Choice, Signal, SignalCondition};

/// Move `p` toward 1 (`up`) or toward 0 by step `a`, saturating at the bounds.
fn nudge(p: f64, up: bool, a: f64) -> f64 {
    let next = if up { p + a * (1.0 - p) } else { p - a * p };
    next.clamp(0.0, 1.0)
}

/// Probability-gradient reinforcement learner.
#[derive(Debug, Clone)]
pub struct RewardBasedAgent {
    name: String,
    params: RewardParams,

    p_choice_blue: f64,
    p_send_signal: f64,
    p_signal_blue: f64,

    last_signal: Option<Signal>,
    last_choice: Option<Choice>,
    interactions: u64,
}

impl RewardBasedAgent {
    /// Create an agent at its configured starting probabilities.
    ///
    /// Fails if `params` does not validate.
    pub fn new(name: impl Into<String>, params: RewardParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            p_choice_blue: params.initial_p_choice_blue,
            p_send_signal: params.initial_p_send_signal,
            p_signal_blue: params.initial_p_signal_blue,
            params,
            last_signal: None,
            last_choice: None,
            interactions: 0,
        })
    }

    /// Blue preference for choices no signal settles.
    pub fn p_choice_blue(&self) -> f64 {
        self.p_choice_blue
    }

    /// Probability of sending any signal under optional signalling.
    pub fn p_send_signal(&self) -> f64 {
        self.p_send_signal
    }

    /// Probability that a sent signal is Blue.
    pub fn p_signal_blue(&self) -> f64 {
        self.p_signal_blue
    }

    /// Parameters this agent was built with.
    pub fn params(&self) -> &RewardParams {
        &self.params
    }

    fn draw_color<R: Rng + ?Sized>(&self, rng: &mut R) -> Signal {
        Signal::from(Choice::from_draw(rng.gen::<f64>(), self.p_signal_blue))
    }
}

impl Agent for RewardBasedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide_signal<R: Rng + ?Sized>(&mut self, condition: SignalCondition, rng: &mut R) -> Signal {
        let signal = match condition {
            SignalCondition::NoSignal => Signal::None,
            SignalCondition::MandatorySignal => self.draw_color(rng),
            SignalCondition::OptionalSignal => {
                if rng.gen::<f64>() < self.p_send_signal {
                    self.draw_color(rng)
                } else {
                    Signal::None
                }
            }
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
        let choice = resolve_choice(own_signal, opponent_signal, self.p_choice_blue, rng);
        self.last_choice = Some(choice);
        choice
    }

    fn update(&mut self, record: &InteractionRecord) {
        self.interactions += 1;

        let RewardParams {
            alpha,
            beta,
            conflict_learning_boost,
            ..
        } = self.params;
        let success = record.success;
        let step = if success { alpha } else { beta };
        let sent = record.own_signal.is_present();

        // Final choice preference: toward the colour on success, away on failure
        self.p_choice_blue = nudge(
            self.p_choice_blue,
            record.own_choice.is_blue() == success,
            step,
        );

        // Signalling propensity follows its association with success
        self.p_send_signal = nudge(self.p_send_signal, sent == success, step);

        // Signal colour, only when one was sent
        if let Some(color) = record.own_signal.color() {
            self.p_signal_blue = nudge(self.p_signal_blue, color.is_blue() == success, step);
        }

        // Own signal carried a conflicting round
        if let (Some(mine), Some(theirs)) = (record.own_signal.color(), record.opponent_signal.color()) {
            if mine != theirs && success && record.own_choice == mine {
                self.p_choice_blue = nudge(
                    self.p_choice_blue,
                    mine.is_blue(),
                    alpha * conflict_learning_boost,
                );
            }
        }
    }

    fn blue_preference(&self) -> f64 {
        self.p_choice_blue
    }

    fn last_signal(&self) -> Option<Signal> {
        self.last_signal
    }

    fn last_choice(&self) -> Option<Choice> {
        self.last_choice
    }

    fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot::Reward {
            name: self.name.clone(),
            p_choice_blue: self.p_choice_blue,
            p_send_signal: self.p_send_signal,
            p_signal_blue: self.p_signal_blue,
            interactions: self.interactions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::testing::ScriptedRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EPS: f64 = 1e-12;

    fn agent() -> RewardBasedAgent {
        RewardBasedAgent::new("r", RewardParams::default()).unwrap()
    }

    fn record(own_signal: Signal, opponent_signal: Signal, own: Choice, other: Choice) -> InteractionRecord {
        InteractionRecord {
            own_signal,
            opponent_signal,
            own_choice: own,
            opponent_choice: other,
            success: own == other,
        }
    }

    #[test]
    fn test_choice_preference_arithmetic() {
        let mut a = agent();
        a.update(&record(Signal::None, Signal::None, Choice::Blue, Choice::Blue));
        assert!((a.p_choice_blue() - 0.6).abs() < EPS);

        a.update(&record(Signal::None, Signal::None, Choice::Blue, Choice::Red));
        assert!((a.p_choice_blue() - 0.48).abs() < EPS);
    }

    #[test]
    fn test_red_moves_preference_down_on_success() {
        let mut a = agent();
        a.update(&record(Signal::None, Signal::None, Choice::Red, Choice::Red));
        assert!((a.p_choice_blue() - 0.4).abs() < EPS);

        // Red failure pushes toward Blue
        a.update(&record(Signal::None, Signal::None, Choice::Red, Choice::Blue));
        assert!((a.p_choice_blue() - 0.52).abs() < EPS);
    }

    #[test]
    fn test_send_propensity() {
        // Sent and succeeded: up
        let mut a = agent();
        a.update(&record(Signal::Blue, Signal::None, Choice::Blue, Choice::Blue));
        assert!((a.p_send_signal() - 0.6).abs() < EPS);

        // Silent and succeeded: down
        let mut a = agent();
        a.update(&record(Signal::None, Signal::Blue, Choice::Blue, Choice::Blue));
        assert!((a.p_send_signal() - 0.4).abs() < EPS);

        // Sent and failed: down
        let mut a = agent();
        a.update(&record(Signal::Blue, Signal::Red, Choice::Blue, Choice::Red));
        assert!((a.p_send_signal() - 0.4).abs() < EPS);

        // Silent and failed: up
        let mut a = agent();
        a.update(&record(Signal::None, Signal::None, Choice::Blue, Choice::Red));
        assert!((a.p_send_signal() - 0.6).abs() < EPS);
    }

    #[test]
    fn test_signal_color_only_when_sent() {
        let mut a = agent();
        a.update(&record(Signal::None, Signal::Red, Choice::Red, Choice::Red));
        assert_eq!(a.p_signal_blue(), 0.5);

        a.update(&record(Signal::Red, Signal::None, Choice::Red, Choice::Red));
        assert!((a.p_signal_blue() - 0.4).abs() < EPS);

        a.update(&record(Signal::Red, Signal::None, Choice::Red, Choice::Blue));
        // Red failed: toward Blue by beta
        assert!((a.p_signal_blue() - 0.52).abs() < EPS);
    }

    #[test]
    fn test_conflict_boost() {
        // Own Blue signal won a conflict: base +alpha, then +alpha*1.5
        let mut a = agent();
        a.update(&record(Signal::Blue, Signal::Red, Choice::Blue, Choice::Blue));
        let base = 0.5 + 0.2 * 0.5;
        let boosted = base + 0.3 * (1.0 - base);
        assert!((a.p_choice_blue() - boosted).abs() < EPS);

        // Own Red signal won a conflict
        let mut a = agent();
        a.update(&record(Signal::Red, Signal::Blue, Choice::Red, Choice::Red));
        let base = 0.5 - 0.2 * 0.5;
        let boosted = base - 0.3 * base;
        assert!((a.p_choice_blue() - boosted).abs() < EPS);
    }

    #[test]
    fn test_no_boost_when_following_partner_in_conflict() {
        let mut a = agent();
        a.update(&record(Signal::Blue, Signal::Red, Choice::Red, Choice::Red));
        assert!((a.p_choice_blue() - 0.4).abs() < EPS);
    }

    #[test]
    fn test_optional_signal_two_draws() {
        let mut a = agent();
        // Send (0.1 < 0.5), then Blue (0.3 < 0.5)
        let mut rng = ScriptedRng::new(&[0.1, 0.3, 0.7]);
        assert_eq!(a.decide_signal(SignalCondition::OptionalSignal, &mut rng), Signal::Blue);
        // Abstain consumes one draw only
        assert_eq!(a.decide_signal(SignalCondition::OptionalSignal, &mut rng), Signal::None);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn test_mandatory_signal_uses_signal_preference() {
        let params = RewardParams::default().with_initial_probabilities(0.0, 0.0, 1.0);
        let mut a = RewardBasedAgent::new("r", params).unwrap();
        let mut rng = ScriptedRng::new(&[0.99]);
        assert_eq!(a.decide_signal(SignalCondition::MandatorySignal, &mut rng), Signal::Blue);
    }

    #[test]
    fn test_probabilities_stay_in_unit_interval() {
        let signals = [Signal::None, Signal::Blue, Signal::Red];
        let param_sets = [
            RewardParams::default(),
            RewardParams::default().with_rates(1.0, 1.0).with_conflict_boost(5.0),
            RewardParams::default().with_rates(0.9, 0.05).with_initial_probabilities(1.0, 0.0, 1.0),
        ];

        for (i, params) in param_sets.iter().enumerate() {
            let mut a = RewardBasedAgent::new("r", params.clone()).unwrap();
            let mut rng = StdRng::seed_from_u64(100 + i as u64);

            for _ in 0..5_000 {
                let own_signal = signals[rng.gen_range(0..3)];
                let opponent_signal = signals[rng.gen_range(0..3)];
                let own = if rng.gen::<bool>() { Choice::Blue } else { Choice::Red };
                let other = if rng.gen::<bool>() { Choice::Blue } else { Choice::Red };
                a.update(&record(own_signal, opponent_signal, own, other));

                for p in [a.p_choice_blue(), a.p_send_signal(), a.p_signal_blue()] {
                    assert!((0.0..=1.0).contains(&p), "probability {} escaped [0, 1]", p);
                }
            }
        }
    }

    #[test]
    fn test_new_rejects_out_of_range_probability() {
        let params = RewardParams::default().with_initial_probabilities(0.5, 0.5, 1.5);
        assert!(matches!(
            RewardBasedAgent::new("r", params),
            Err(ConfigError::InvalidParameter {
                name: "initial_p_signal_blue",
                ..
            })
        ));
    }

    #[test]
    fn test_nudge_saturates() {
        assert_eq!(nudge(0.5, true, 3.0), 1.0);
        assert_eq!(nudge(0.5, false, 3.0), 0.0);
        assert_eq!(nudge(1.0, true, 0.2), 1.0);
        assert_eq!(nudge(0.0, false, 0.2), 0.0);
    }
}
