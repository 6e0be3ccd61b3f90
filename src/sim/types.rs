//! Signals, choices and run-wide conditions for the coordination game.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sim::config::ConfigError;

/// Final committed action of an agent in one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    /// Blue.
    Blue,
    /// Red.
    Red,
}

impl Choice {
    /// Resolve a uniform draw in [0, 1) against a Blue probability.
    ///
    /// The draw selects Blue iff `draw < p_blue`.
    pub fn from_draw(draw: f64, p_blue: f64) -> Self {
        if draw < p_blue {
            Choice::Blue
        } else {
            Choice::Red
        }
    }

    /// Whether this is Blue.
    pub fn is_blue(self) -> bool {
        self == Choice::Blue
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Choice::Blue => "Blue",
            Choice::Red => "Red",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pre-choice declaration: a colour or an abstention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// No signal sent.
    None,
    /// Announced Blue.
    Blue,
    /// Announced Red.
    Red,
}

impl Signal {
    /// The announced colour, if any.
    pub fn color(self) -> Option<Choice> {
        match self {
            Signal::None => None,
            Signal::Blue => Some(Choice::Blue),
            Signal::Red => Some(Choice::Red),
        }
    }

    /// Whether a colour was announced.
    pub fn is_present(self) -> bool {
        self != Signal::None
    }
}

impl From<Choice> for Signal {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::Blue => Signal::Blue,
            Choice::Red => Signal::Red,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::None => f.write_str("None"),
            Signal::Blue => f.write_str("Blue"),
            Signal::Red => f.write_str("Red"),
        }
    }
}

/// Run-wide policy on whether and how agents may signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalCondition {
    /// Signals are never sent.
    NoSignal,
    /// Every agent must announce Blue or Red.
    MandatorySignal,
    /// Agents may announce a colour or abstain.
    OptionalSignal,
}

impl SignalCondition {
    /// All conditions in reporting order.
    pub const ALL: [SignalCondition; 3] = [
        SignalCondition::NoSignal,
        SignalCondition::MandatorySignal,
        SignalCondition::OptionalSignal,
    ];

    /// Display label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            SignalCondition::NoSignal => "No Signal",
            SignalCondition::MandatorySignal => "Mandatory Signal",
            SignalCondition::OptionalSignal => "Optional Signal",
        }
    }
}

impl fmt::Display for SignalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SignalCondition {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "NO_SIGNAL" => Ok(SignalCondition::NoSignal),
            "MANDATORY_SIGNAL" => Ok(SignalCondition::MandatorySignal),
            "OPTIONAL_SIGNAL" => Ok(SignalCondition::OptionalSignal),
            _ => Err(ConfigError::UnknownSignalCondition(s.to_string())),
        }
    }
}

/// Which learning rule an agent uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    /// Frequency/pseudocount learner.
    HistoryBased,
    /// Probability-gradient reinforcement learner.
    RewardBased,
}

impl StrategyKind {
    /// All strategies in reporting order.
    pub const ALL: [StrategyKind; 2] = [StrategyKind::HistoryBased, StrategyKind::RewardBased];

    /// Display label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::HistoryBased => "History Based",
            StrategyKind::RewardBased => "Reward Based",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "HISTORY_BASED" => Ok(StrategyKind::HistoryBased),
            "REWARD_BASED" => Ok(StrategyKind::RewardBased),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Accept `NO_SIGNAL`, `no-signal`, `no_signal` and `No Signal` alike.
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}
