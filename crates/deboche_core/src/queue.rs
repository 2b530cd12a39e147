//! The per-server queue behind `/cenas`. Anyone can add a line, anyone can look.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::id::UserId;
use crate::reply::{EmbedSpec, Reply, colours};

/// Longest text accepted for one entry
pub const MAX_ENTRY_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub user: UserId,
    pub text: String,
}

struct ServerQueue {
    entries: Vec<QueueEntry>,
    last_used: Instant,
}

/// One queue per server, keyed by guild id (or channel id outside servers)
#[derive(Clone)]
pub struct QueueStore {
    queues: Arc<DashMap<u64, ServerQueue>>,
    capacity: usize,
    idle_timeout: Duration,
}

impl QueueStore {
    pub fn new(capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            queues: Arc::new(DashMap::new()),
            capacity,
            idle_timeout,
        }
    }

    /// Append an entry and return its 1-based position
    pub fn push(&self, scope: u64, user: UserId, text: &str) -> Result<usize> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::invalid_argument("cenas", "comprar", "não pode estar vazio"));
        }
        if text.chars().count() > MAX_ENTRY_CHARS {
            return Err(CoreError::invalid_argument(
                "cenas",
                "comprar",
                format!("no máximo {} caracteres", MAX_ENTRY_CHARS),
            ));
        }

        let mut queue = self.queues.entry(scope).or_insert_with(|| ServerQueue {
            entries: Vec::new(),
            last_used: Instant::now(),
        });
        if queue.entries.len() >= self.capacity {
            return Err(CoreError::invalid_argument(
                "cenas",
                "comprar",
                format!("a queue já tem {} entradas", self.capacity),
            ));
        }
        queue.last_used = Instant::now();
        queue.entries.push(QueueEntry {
            user,
            text: text.to_string(),
        });
        Ok(queue.entries.len())
    }

    pub fn entries(&self, scope: u64) -> Vec<QueueEntry> {
        self.queues
            .get(&scope)
            .map(|queue| queue.entries.clone())
            .unwrap_or_default()
    }

    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.queues.len();
        self.queues.retain(|_, queue| {
            now.saturating_duration_since(queue.last_used) <= self.idle_timeout
        });
        let evicted = before.saturating_sub(self.queues.len());
        if evicted > 0 {
            debug!(evicted, "evicted idle queues");
        }
        evicted
    }
}

pub fn render_queue(entries: &[QueueEntry]) -> Reply {
    if entries.is_empty() {
        return Reply::text("📭 A queue está vazia.");
    }
    let lines = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}. {} - {}", i + 1, entry.user.mention(), entry.text))
        .collect::<Vec<_>>()
        .join("\n");
    Reply::embed(
        EmbedSpec::new("📜 Queue atual")
            .description(lines)
            .colour(colours::BLUE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> QueueStore {
        QueueStore::new(2, Duration::from_secs(60))
    }

    #[test]
    fn test_queues_are_per_server() {
        let queues = store();
        assert_eq!(queues.push(1, UserId(10), "  bifana ").unwrap(), 1);
        assert_eq!(queues.push(1, UserId(11), "imperial").unwrap(), 2);
        assert_eq!(queues.push(2, UserId(12), "pastel").unwrap(), 1);

        assert_eq!(
            queues.entries(1),
            vec![
                QueueEntry {
                    user: UserId(10),
                    text: "bifana".to_string(),
                },
                QueueEntry {
                    user: UserId(11),
                    text: "imperial".to_string(),
                },
            ]
        );
        assert_eq!(queues.entries(2).len(), 1);
        assert!(queues.entries(3).is_empty());
    }

    #[test]
    fn test_rejects_empty_long_and_overflow() {
        let queues = store();
        assert!(matches!(
            queues.push(1, UserId(1), "   "),
            Err(CoreError::InvalidArgument { .. })
        ));
        assert!(queues.push(1, UserId(1), &"x".repeat(MAX_ENTRY_CHARS + 1)).is_err());

        queues.push(1, UserId(1), "a").unwrap();
        queues.push(1, UserId(1), "b").unwrap();
        let full = queues.push(1, UserId(1), "c").unwrap_err();
        assert_eq!(
            full.user_message(),
            "Argumento inválido `comprar`: a queue já tem 2 entradas"
        );
        assert_eq!(queues.entries(1).len(), 2);
    }

    #[test]
    fn test_idle_queues_are_dropped() {
        let queues = store();
        queues.push(1, UserId(1), "a").unwrap();
        assert_eq!(queues.evict_idle(Instant::now()), 0);
        assert_eq!(queues.evict_idle(Instant::now() + Duration::from_secs(61)), 1);
        assert!(queues.entries(1).is_empty());
    }

    #[test]
    fn test_render() {
        assert_eq!(
            render_queue(&[]).content.as_deref(),
            Some("📭 A queue está vazia.")
        );
        let reply = render_queue(&[QueueEntry {
            user: UserId(5),
            text: "bifana".to_string(),
        }]);
        let embed = reply.embed.unwrap();
        assert_eq!(embed.title.as_deref(), Some("📜 Queue atual"));
        assert_eq!(embed.description.as_deref(), Some("1. <@5> - bifana"));
    }
}
