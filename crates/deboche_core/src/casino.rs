//! Random rewards for the economy commands. Pure functions over an injected RNG.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::error::{CoreError, Result};

pub const WORK_RANGE: std::ops::RangeInclusive<i64> = 50..=200;
pub const BEG_REWARDS: [i64; 6] = [0, 1, 2, 5, 10, 15];
pub const SYMBOLS: [&str; 6] = ["🍒", "🍋", "🍊", "🍉", "⭐", "💎"];

pub fn work_reward(rng: &mut impl Rng) -> i64 {
    rng.random_range(WORK_RANGE)
}

pub fn beg_reward(rng: &mut impl Rng) -> i64 {
    BEG_REWARDS.choose(rng).copied().unwrap_or(0)
}

pub type Reels = [&'static str; 3];

pub fn spin(rng: &mut impl Rng) -> Reels {
    std::array::from_fn(|_| SYMBOLS.choose(rng).copied().unwrap_or(SYMBOLS[0]))
}

/// Three of a kind pays ×5, any pair ×2
pub fn multiplier(reels: &Reels) -> i64 {
    let [a, b, c] = reels;
    if a == b && b == c {
        5
    } else if a == b || b == c || a == c {
        2
    } else {
        0
    }
}

/// Outcome of one slot spin. The bet is always taken, `winnings` is added back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSpin {
    pub reels: Reels,
    pub bet: i64,
    pub winnings: i64,
}

impl SlotSpin {
    /// Fails without spinning when the bet is not positive or a jackpot would overflow.
    pub fn play(bet: i64, rng: &mut impl Rng) -> Result<Self> {
        if bet <= 0 {
            return Err(CoreError::invalid_amount(bet, "tem de ser positiva"));
        }
        if bet.checked_mul(5).is_none() {
            return Err(CoreError::invalid_amount(bet, "demasiado alta"));
        }
        let reels = spin(rng);
        Ok(Self {
            reels,
            bet,
            winnings: bet * multiplier(&reels),
        })
    }

    pub fn net(&self) -> i64 {
        self.winnings - self.bet
    }

    pub fn display(&self) -> String {
        self.reels.join(" ")
    }
}
