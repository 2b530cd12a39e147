//! Shared services handed to every command and component handler.

use std::sync::Arc;
use std::time::{Duration, Instant};

use deboche_core::joker::{MyMemoryTranslator, QuestionSource};
use deboche_core::{
    ApiClient, CommandRegistry, CooldownTracker, Database, DebocheConfig, PaginatorStore,
    QueueStore, SessionStore,
};
use tracing::debug;

use crate::commands::{self, CommandHandler};
use crate::error::Result;
use crate::timers::RoundTimers;

/// Paginators nobody has paged through for this long are dropped
pub const PAGINATOR_IDLE: Duration = Duration::from_secs(600);

pub type Registry = CommandRegistry<Arc<dyn CommandHandler>>;

#[derive(Clone)]
pub struct BotContext {
    pub config: Arc<DebocheConfig>,
    pub db: Database,
    pub sessions: SessionStore,
    pub paginators: PaginatorStore,
    pub cooldowns: CooldownTracker,
    pub queues: QueueStore,
    pub api: ApiClient,
    pub timers: RoundTimers,
    pub registry: Arc<Registry>,
}

impl BotContext {
    /// Open the database and wire the question feeds from configuration
    pub async fn from_config(config: DebocheConfig) -> Result<Self> {
        let api = ApiClient::from_config(&config.http)?;
        let translator = Arc::new(MyMemoryTranslator::new(
            api.http().clone(),
            config.joker.translate_url.clone(),
        ));
        let questions =
            QuestionSource::from_config(&config.joker, api.http().clone(), translator).await?;
        let db = Database::connect(&config.database).await?;
        Self::new(config, db, questions, api)
    }

    pub fn new(
        config: DebocheConfig,
        db: Database,
        questions: QuestionSource,
        api: ApiClient,
    ) -> Result<Self> {
        let sessions = SessionStore::new(
            questions,
            Duration::from_secs(config.joker.idle_grace_secs),
        );
        let queues = QueueStore::new(
            config.economy.queue_capacity,
            Duration::from_secs(config.economy.queue_idle_secs),
        );
        Ok(Self {
            config: Arc::new(config),
            db,
            sessions,
            paginators: PaginatorStore::new(PAGINATOR_IDLE),
            cooldowns: CooldownTracker::new(),
            queues,
            api,
            timers: RoundTimers::new(),
            registry: Arc::new(commands::build_registry()?),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.config.bot.prefix
    }

    /// Drop idle games (and their timers), idle paginators and idle queues.
    /// Returns how many games and paginators went.
    pub fn sweep_idle(&self, now: Instant) -> (usize, usize) {
        let games = self.sessions.evict_idle(now);
        for player in &games {
            self.timers.cancel(*player);
        }
        self.timers.prune();
        let pages = self.paginators.evict_idle(now);
        let queues = self.queues.evict_idle(now);
        if !games.is_empty() || pages > 0 || queues > 0 {
            debug!(games = games.len(), pages, queues, "swept idle state");
        }
        (games.len(), pages)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use deboche_core::config::DatabaseConfig;
    use deboche_core::db::MEMORY_PATH;
    use deboche_core::joker::{NoopTranslator, Question, QuestionProvider};
    use deboche_core::{CoreError, Result as CoreResult};

    /// Serves the same question forever; the right answer is always B
    pub struct FixedProvider;

    #[async_trait::async_trait]
    impl QuestionProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_question(&self) -> CoreResult<Question> {
            Question::new(
                "Qual é a capital de Portugal?",
                vec![
                    "Porto".to_string(),
                    "Lisboa".to_string(),
                    "Braga".to_string(),
                    "Faro".to_string(),
                ],
                1,
            )
        }
    }

    pub struct DownProvider;

    #[async_trait::async_trait]
    impl QuestionProvider for DownProvider {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn fetch_question(&self) -> CoreResult<Question> {
            Err(CoreError::provider_unavailable("down", "always failing"))
        }
    }

    pub async fn bot_with(provider: Arc<dyn QuestionProvider>) -> BotContext {
        let mut config = DebocheConfig::default();
        config.database = DatabaseConfig {
            path: MEMORY_PATH.into(),
            max_connections: 1,
        };
        let db = Database::connect(&config.database).await.unwrap();
        let api = ApiClient::from_config(&config.http).unwrap();
        let questions = QuestionSource::new(provider, Arc::new(NoopTranslator));
        BotContext::new(config, db, questions, api).unwrap()
    }

    pub async fn bot() -> BotContext {
        bot_with(Arc::new(FixedProvider)).await
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::bot;
    use deboche_core::UserId;

    #[tokio::test]
    async fn test_every_command_is_registered() {
        let bot = bot().await;
        for name in [
            "joker", "trabalhar", "pedir", "carteira", "dar", "slot", "perfil",
            "editar_perfil", "comandos", "cenas", "clima", "pokedex", "xkcd", "meme", "waifu",
            "ajuda",
        ] {
            assert!(bot.registry.get(name).is_some(), "missing {}", name);
        }
    }

    #[tokio::test]
    async fn test_sweep_with_nothing_idle() {
        let bot = bot().await;
        bot.sessions.start(UserId(5), false).await.unwrap();
        assert_eq!(bot.sweep_idle(std::time::Instant::now()), (0, 0));
        assert!(bot.sessions.contains(UserId(5)));
    }
}
