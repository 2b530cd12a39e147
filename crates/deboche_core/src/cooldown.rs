use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::id::UserId;
use crate::{CoreError, Result};

/// Per-user, per-command rate limiting
#[derive(Clone, Default)]
pub struct CooldownTracker {
    last_used: Arc<DashMap<(UserId, String), Instant>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check_and_touch(&self, user: UserId, command: &str, period: Duration) -> Result<()> {
        self.check_and_touch_at(user, command, period, Instant::now())
    }

    /// A rejected call leaves the previous timestamp in place
    pub fn check_and_touch_at(
        &self,
        user: UserId,
        command: &str,
        period: Duration,
        now: Instant,
    ) -> Result<()> {
        match self.last_used.entry((user, command.to_string())) {
            Entry::Occupied(mut entry) => {
                let elapsed = now.saturating_duration_since(*entry.get());
                if elapsed < period {
                    let remaining = period - elapsed;
                    return Err(CoreError::OnCooldown {
                        command: command.to_string(),
                        // round up so "0s" is never shown
                        remaining_secs: remaining.as_secs()
                            + u64::from(remaining.subsec_nanos() > 0),
                    });
                }
                entry.insert(now);
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
            }
        }
        Ok(())
    }

    /// Forget a use, e.g. when the command failed after the check
    pub fn reset(&self, user: UserId, command: &str) {
        self.last_used.remove(&(user, command.to_string()));
    }
}
