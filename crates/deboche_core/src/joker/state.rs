use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::question::Question;
use crate::id::UserId;

/// Prize for each level, in euros
pub const PRIZE_TABLE: [u64; 9] = [50, 250, 500, 1000, 2500, 5000, 10000, 25000, 75000];

pub const ROUNDS: usize = PRIZE_TABLE.len();

pub const INITIAL_JOKERS: u32 = 7;

/// Time a player has to answer the question at `index`
pub fn round_timeout(index: usize) -> Duration {
    let secs = if index < 4 {
        30
    } else if index < 8 {
        40
    } else {
        50
    };
    Duration::from_secs(secs)
}

/// Per-player game record.
///
/// `prize_level` is -1 until the first correct answer. `hidden_options` only
/// ever holds wrong options of the active question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub player_id: UserId,
    pub jokers: u32,
    pub current_index: usize,
    pub prize_level: i32,
    pub active_question: Option<Question>,
    pub hidden_options: BTreeSet<usize>,
}

impl GameState {
    pub fn new(player_id: UserId) -> Self {
        Self {
            player_id,
            jokers: INITIAL_JOKERS,
            current_index: 0,
            prize_level: -1,
            active_question: None,
            hidden_options: BTreeSet::new(),
        }
    }

    /// Apply the outcome of one round to jokers and prize level.
    ///
    /// A wrong answer costs jokers first and prize levels once those run out:
    ///
    /// | jokers before | effect                       |
    /// |---------------|------------------------------|
    /// | 3 or more     | jokers -= 3                  |
    /// | 2             | jokers = 0, prize_level -= 1 |
    /// | 1             | jokers = 0, prize_level -= 2 |
    /// | 0             | prize_level -= 3             |
    pub fn apply_answer(&mut self, correct: bool) {
        if correct {
            self.prize_level = (self.prize_level + 1).min(ROUNDS as i32 - 1);
            return;
        }

        match self.jokers {
            j if j >= 3 => self.jokers -= 3,
            2 => {
                self.jokers = 0;
                self.prize_level -= 1;
            }
            1 => {
                self.jokers = 0;
                self.prize_level -= 2;
            }
            _ => self.prize_level -= 3,
        }
        self.prize_level = self.prize_level.max(-1);
    }

    /// Prize currently secured
    pub fn current_prize(&self) -> u64 {
        usize::try_from(self.prize_level)
            .ok()
            .and_then(|level| PRIZE_TABLE.get(level).copied())
            .unwrap_or(0)
    }

    pub fn is_finished(&self) -> bool {
        self.current_index >= ROUNDS
    }
}
