use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};

use super::question::{Question, TRIVIA_API};
use super::translate::Translator;
use crate::config::{JokerConfig, QuestionSourceKind};
use crate::{CoreError, Result};

/// Anything that can hand out quiz questions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fails with `ProviderUnavailable` when unreachable or the payload is unusable
    async fn fetch_question(&self) -> Result<Question>;
}

/// the-trivia-api.com v2
pub struct TriviaApiProvider {
    http: reqwest::Client,
    url: String,
}

impl TriviaApiProvider {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl QuestionProvider for TriviaApiProvider {
    fn name(&self) -> &'static str {
        TRIVIA_API
    }

    async fn fetch_question(&self) -> Result<Question> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("limit", "1")])
            .send()
            .await
            .map_err(|e| CoreError::provider_unavailable(TRIVIA_API, e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::provider_unavailable(
                TRIVIA_API,
                format!("HTTP {}", response.status()),
            ));
        }

        let payload: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| CoreError::provider_unavailable(TRIVIA_API, e.to_string()))?;

        let first = payload
            .first()
            .ok_or_else(|| CoreError::provider_unavailable(TRIVIA_API, "empty question list"))?;

        let question = Question::from_trivia_api(first, &mut rand::rng())?;
        debug!(text = %question.text, "fetched trivia question");
        Ok(question)
    }
}

/// Questions from a local JSON file: a list of `{text, options, correct}`
#[derive(Debug)]
pub struct FixtureProvider {
    path: PathBuf,
    questions: Vec<Question>,
}

impl FixtureProvider {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            CoreError::provider_unavailable("fixture", format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(path, &content)
    }

    pub fn from_json(path: &Path, content: &str) -> Result<Self> {
        let questions: Vec<Question> = serde_json::from_str(content).map_err(|e| {
            CoreError::provider_unavailable("fixture", format!("{}: {}", path.display(), e))
        })?;
        for question in &questions {
            question.validate("fixture")?;
        }
        info!(path = %path.display(), count = questions.len(), "loaded question fixture");
        Ok(Self {
            path: path.to_path_buf(),
            questions,
        })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[async_trait]
impl QuestionProvider for FixtureProvider {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn fetch_question(&self) -> Result<Question> {
        self.questions
            .choose(&mut rand::rng())
            .cloned()
            .ok_or_else(|| {
                CoreError::provider_unavailable(
                    "fixture",
                    format!("{} holds no questions", self.path.display()),
                )
            })
    }
}

/// Wraps a provider and translates every question it returns
pub struct TranslatingProvider {
    inner: Arc<dyn QuestionProvider>,
    translator: Arc<dyn Translator>,
}

impl TranslatingProvider {
    pub fn new(inner: Arc<dyn QuestionProvider>, translator: Arc<dyn Translator>) -> Self {
        Self { inner, translator }
    }
}

#[async_trait]
impl QuestionProvider for TranslatingProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch_question(&self) -> Result<Question> {
        let original = self.inner.fetch_question().await?;

        let text = self.translator.translate(&original.text);
        let options = join_all(
            original
                .options
                .iter()
                .map(|option| self.translator.translate(option)),
        );
        let (text, options) = futures::join!(text, options);

        let translated = Question {
            text,
            options,
            correct: original.correct,
        };

        // Two options can collapse into the same word once translated
        match translated.validate(self.name()) {
            Ok(()) => Ok(translated),
            Err(e) => {
                warn!("translated question unusable, keeping original: {}", e);
                Ok(original)
            }
        }
    }
}

/// The two question feeds a game can draw from
#[derive(Clone)]
pub struct QuestionSource {
    plain: Arc<dyn QuestionProvider>,
    translated: Arc<dyn QuestionProvider>,
}

impl QuestionSource {
    pub fn new(plain: Arc<dyn QuestionProvider>, translator: Arc<dyn Translator>) -> Self {
        let translated = Arc::new(TranslatingProvider::new(plain.clone(), translator));
        Self { plain, translated }
    }

    /// Build from configuration
    pub async fn from_config(
        config: &JokerConfig,
        http: reqwest::Client,
        translator: Arc<dyn Translator>,
    ) -> Result<Self> {
        let plain: Arc<dyn QuestionProvider> = match config.source {
            QuestionSourceKind::Remote => {
                Arc::new(TriviaApiProvider::new(http, config.trivia_url.clone()))
            }
            QuestionSourceKind::Fixture => {
                let path = config.fixture_path.as_deref().ok_or_else(|| {
                    CoreError::provider_unavailable("fixture", "joker.fixture_path is not set")
                })?;
                Arc::new(FixtureProvider::load(path).await?)
            }
        };
        Ok(Self::new(plain, translator))
    }

    pub fn provider(&self, translate: bool) -> &dyn QuestionProvider {
        if translate {
            self.translated.as_ref()
        } else {
            self.plain.as_ref()
        }
    }
}
