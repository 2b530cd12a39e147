//! Identifiers shared between the platform adapter and the core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A chat-platform user. Discord snowflakes fit in a `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl UserId {
    pub fn get(self) -> u64 {
        self.0
    }

    /// SQLite stores integers as signed 64-bit values
    pub fn as_db(self) -> i64 {
        self.0 as i64
    }

    pub fn from_db(value: i64) -> Self {
        Self(value as u64)
    }

    /// Parse a raw id or a `<@id>` / `<@!id>` mention
    pub fn parse_mention(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let inner = trimmed
            .strip_prefix("<@")
            .and_then(|rest| rest.strip_suffix('>'))
            .map(|rest| rest.trim_start_matches('!'))
            .unwrap_or(trimmed);
        inner.parse::<u64>().ok().map(Self)
    }

    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
