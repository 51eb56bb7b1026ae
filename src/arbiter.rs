//! Round arbitration
//!
//! A side's digit is the total of the hands it shows (two hands, 0..=5 each).
//! The round is decisive only when both sides together show 15 or 20; the
//! player wins a decisive round by having called that exact total.

use std::fmt;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::config::MachineConfig;

/// Totals that make a round count
pub const DECISIVE_TOTALS: [u8; 2] = [15, 20];

/// Largest value a single hand can show
pub const MAX_HAND: u8 = 5;

/// Largest total one side can show with both hands
pub const MAX_HAND_TOTAL: u8 = MAX_HAND * 2;

pub fn is_valid_hand(digit: u8) -> bool {
    digit <= MAX_HAND
}

pub fn is_valid_hand_total(total: u8) -> bool {
    total <= MAX_HAND_TOTAL
}

pub fn is_target(value: u8) -> bool {
    DECISIVE_TOTALS.contains(&value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Win,
    Lose,
    Tie,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "Win"),
            Outcome::Lose => write!(f, "Lose"),
            Outcome::Tie => write!(f, "Tie"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRecord {
    /// Attempt number within the session, ties included (1-based)
    pub round_index: u32,
    pub player_digit: u8,
    pub machine_digit: u8,
    /// Total the player called
    pub target: u8,
    pub total: u8,
    pub outcome: Outcome,
    pub counts_toward_session: bool,
    /// Player input was completed by the dealer after the round timed out
    pub auto_filled: bool,
    #[serde(serialize_with = "serialize_millis")]
    pub reaction: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl fmt::Display for RoundRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} you {} (called {}) | machine {} | total {} | {}",
            self.round_index,
            self.player_digit,
            self.target,
            self.machine_digit,
            self.total,
            self.outcome
        )?;
        if self.auto_filled {
            write!(f, " (auto)")?;
        }
        Ok(())
    }
}

/// Player input for one round, as collected by the session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundInput {
    pub player_digit: u8,
    pub machine_digit: u8,
    pub target: u8,
}

/// Resolve one round. Digits are expected to be valid hand totals already.
pub fn arbitrate(
    round_index: u32,
    input: RoundInput,
    reaction: Duration,
    auto_filled: bool,
) -> RoundRecord {
    let total = input.player_digit + input.machine_digit;
    let decisive = DECISIVE_TOTALS.contains(&total);

    let outcome = if !decisive {
        Outcome::Tie
    } else if input.target == total {
        Outcome::Win
    } else {
        Outcome::Lose
    };

    RoundRecord {
        round_index,
        player_digit: input.player_digit,
        machine_digit: input.machine_digit,
        target: input.target,
        total,
        outcome,
        counts_toward_session: decisive,
        auto_filled,
        reaction,
    }
}

/// Source of the machine's hands and of fallback player input
pub trait Dealer {
    /// Machine hand total for the current round
    fn machine_digit(&mut self) -> u8;

    /// Player hand total used when the round timed out without a gesture
    fn fallback_digit(&mut self) -> u8;

    /// Target used when the round timed out without a call
    fn fallback_target(&mut self) -> u8;
}

/// Uniform random dealer: two machine hands drawn from the configured values
pub struct RandomDealer {
    rng: StdRng,
    hand_values: Vec<u8>,
    fallback_digits: Vec<u8>,
    fallback_targets: Vec<u8>,
}

impl RandomDealer {
    pub fn new(config: &MachineConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            hand_values: config.hand_values.clone(),
            fallback_digits: config.fallback_hands.clone(),
            fallback_targets: config.fallback_targets.clone(),
        }
    }

    fn pick(rng: &mut StdRng, values: &[u8], default: u8) -> u8 {
        values.choose(rng).copied().unwrap_or(default)
    }
}

impl Dealer for RandomDealer {
    fn machine_digit(&mut self) -> u8 {
        let left = Self::pick(&mut self.rng, &self.hand_values, 0);
        let right = Self::pick(&mut self.rng, &self.hand_values, 0);
        left + right
    }

    fn fallback_digit(&mut self) -> u8 {
        Self::pick(&mut self.rng, &self.fallback_digits, 0)
    }

    fn fallback_target(&mut self) -> u8 {
        Self::pick(&mut self.rng, &self.fallback_targets, DECISIVE_TOTALS[0])
    }
}
