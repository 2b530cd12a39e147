//! Long text split across embed pages with previous/next buttons.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::reply::{ButtonSpec, ButtonStyle, EmbedSpec, Reply};
use crate::{CoreError, Result};

/// Embed descriptions are capped at 4096 characters
pub const DEFAULT_CHUNK_SIZE: usize = 4000;

const PREFIX: &str = "page";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    pages: Vec<String>,
    index: usize,
    title: String,
    colour: u32,
}

impl Paginator {
    pub fn new(text: &str, title: impl Into<String>, colour: u32) -> Self {
        Self::with_chunk_size(text, title, colour, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(
        text: &str,
        title: impl Into<String>,
        colour: u32,
        chunk_size: usize,
    ) -> Self {
        let chunk_size = chunk_size.max(1);
        let chars: Vec<char> = text.chars().collect();
        let mut pages: Vec<String> = chars
            .chunks(chunk_size)
            .map(|chunk| chunk.iter().collect())
            .collect();
        if pages.is_empty() {
            pages.push(String::new());
        }

        Self {
            pages,
            index: 0,
            title: title.into(),
            colour,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &str {
        &self.pages[self.index]
    }

    pub fn next(&mut self) {
        self.index = (self.index + 1) % self.pages.len();
    }

    pub fn previous(&mut self) {
        self.index = (self.index + self.pages.len() - 1) % self.pages.len();
    }

    pub fn turn(&mut self, direction: PageDirection) {
        match direction {
            PageDirection::Previous => self.previous(),
            PageDirection::Next => self.next(),
        }
    }

    fn heading(&self) -> String {
        let counter = format!("Page {}/{}", self.index + 1, self.pages.len());
        if self.title.is_empty() {
            counter
        } else {
            format!("{} ({})", self.title, counter)
        }
    }

    /// Render the current page. `id` is the paginator's key in the store.
    pub fn page_reply(&self, id: u64) -> Reply {
        let single = self.pages.len() <= 1;
        let buttons = vec![
            ButtonSpec::new(
                PageComponent::new(id, PageDirection::Previous).to_string(),
                "◀️ Anterior",
                ButtonStyle::Primary,
            )
            .disabled(single),
            ButtonSpec::new(
                PageComponent::new(id, PageDirection::Next).to_string(),
                "Seguinte ▶️",
                ButtonStyle::Primary,
            )
            .disabled(single),
        ];

        Reply::embed(
            EmbedSpec::new(self.heading())
                .description(self.current())
                .colour(self.colour),
        )
        .with_row(buttons)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Previous,
    Next,
}

/// Button id of the form `page:<id>:<prev|next>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageComponent {
    pub id: u64,
    pub direction: PageDirection,
}

impl PageComponent {
    pub fn new(id: u64, direction: PageDirection) -> Self {
        Self { id, direction }
    }

    pub fn matches(custom_id: &str) -> bool {
        custom_id
            .split_once(':')
            .is_some_and(|(prefix, _)| prefix == PREFIX)
    }
}

impl fmt::Display for PageComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            PageDirection::Previous => "prev",
            PageDirection::Next => "next",
        };
        write!(f, "{}:{}:{}", PREFIX, self.id, direction)
    }
}

impl FromStr for PageComponent {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CoreError::invalid_argument("page", "custom_id", s.to_string());
        let mut parts = s.split(':');
        if parts.next() != Some(PREFIX) {
            return Err(invalid());
        }
        let id = parts
            .next()
            .and_then(|id| id.parse().ok())
            .ok_or_else(invalid)?;
        let direction = match parts.next() {
            Some("prev") => PageDirection::Previous,
            Some("next") => PageDirection::Next,
            _ => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { id, direction })
    }
}

struct StoredPaginator {
    paginator: Paginator,
    last_used: Instant,
}

/// Live paginators addressed by the id embedded in their buttons
#[derive(Clone)]
pub struct PaginatorStore {
    entries: Arc<DashMap<u64, StoredPaginator>>,
    next_id: Arc<AtomicU64>,
    idle_timeout: Duration,
}

impl PaginatorStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            idle_timeout,
        }
    }

    /// Store a paginator and return the first page
    pub fn insert(&self, paginator: Paginator) -> (u64, Reply) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let reply = paginator.page_reply(id);
        self.entries.insert(
            id,
            StoredPaginator {
                paginator,
                last_used: Instant::now(),
            },
        );
        (id, reply)
    }

    /// Apply a button press; `NotFound` once the paginator has expired
    pub fn turn(&self, component: PageComponent) -> Result<Reply> {
        let mut entry = self
            .entries
            .get_mut(&component.id)
            .ok_or_else(|| CoreError::not_found("página", component.id.to_string()))?;
        entry.last_used = Instant::now();
        entry.paginator.turn(component.direction);
        Ok(entry.paginator.page_reply(component.id))
    }

    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, stored| {
            now.saturating_duration_since(stored.last_used) <= self.idle_timeout
        });
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            debug!(evicted, "evicted idle paginators");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
