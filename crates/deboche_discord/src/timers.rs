//! Per-player round timers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use deboche_core::UserId;
use tokio::task::JoinHandle;

/// One pending timeout per player.
///
/// Arming replaces the previous handle without aborting it, since a timeout
/// may itself arm the next round's timer. A late timer is harmless because the
/// session store rejects actions for rounds that already moved on. Use
/// [`RoundTimers::cancel`] when the round ends some other way.
#[derive(Clone, Default)]
pub struct RoundTimers {
    pending: Arc<DashMap<UserId, JoinHandle<()>>>,
}

impl RoundTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<F>(&self, player: UserId, after: Duration, on_expire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            on_expire.await;
        });
        self.pending.insert(player, handle);
    }

    /// Abort the pending timer, if any. Must not be called from the timer task itself.
    pub fn cancel(&self, player: UserId) -> bool {
        match self.pending.remove(&player) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self, player: UserId) -> bool {
        self.pending
            .get(&player)
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forget handles whose task already ran
    pub fn prune(&self) {
        self.pending.retain(|_, handle| !handle.is_finished());
    }
}
