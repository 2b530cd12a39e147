//! Button identifiers for the quiz: `joker:<player>:<round>:<action>`.

use std::fmt;
use std::str::FromStr;

use crate::id::UserId;
use crate::{CoreError, Result};

use super::question::OPTION_COUNT;

pub const PREFIX: &str = "joker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JokerAction {
    Answer(usize),
    UseJoker,
    /// Try the failed question fetch again
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JokerComponent {
    pub player: UserId,
    pub round: usize,
    pub action: JokerAction,
}

impl JokerComponent {
    pub fn new(player: UserId, round: usize, action: JokerAction) -> Self {
        Self {
            player,
            round,
            action,
        }
    }

    /// Only the player who owns the game may press its buttons
    pub fn ensure_owner(&self, presser: UserId) -> Result<()> {
        if presser != self.player {
            return Err(CoreError::NotYourGame {
                owner: self.player,
                presser,
            });
        }
        Ok(())
    }
}

impl fmt::Display for JokerComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:", PREFIX, self.player, self.round)?;
        match self.action {
            JokerAction::Answer(i) => write!(f, "a{}", i),
            JokerAction::UseJoker => write!(f, "joker"),
            JokerAction::Retry => write!(f, "retry"),
        }
    }
}

impl FromStr for JokerComponent {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| CoreError::invalid_argument(PREFIX, s, reason);

        let mut parts = s.split(':');
        if parts.next() != Some(PREFIX) {
            return Err(invalid("not a quiz button"));
        }
        let player = parts
            .next()
            .and_then(|p| p.parse::<UserId>().ok())
            .ok_or_else(|| invalid("bad player id"))?;
        let round = parts
            .next()
            .and_then(|r| r.parse::<usize>().ok())
            .ok_or_else(|| invalid("bad round"))?;
        let action = match parts.next() {
            Some("joker") => JokerAction::UseJoker,
            Some("retry") => JokerAction::Retry,
            Some(a) if a.starts_with('a') => {
                let index = a[1..]
                    .parse::<usize>()
                    .ok()
                    .filter(|i| *i < OPTION_COUNT)
                    .ok_or_else(|| invalid("bad answer index"))?;
                JokerAction::Answer(index)
            }
            _ => return Err(invalid("unknown action")),
        };
        if parts.next().is_some() {
            return Err(invalid("trailing data"));
        }

        Ok(Self {
            player,
            round,
            action,
        })
    }
}
