use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::{CoreError, Result};

pub const OPTION_COUNT: usize = 4;
pub const OPTION_LETTERS: [char; OPTION_COUNT] = ['A', 'B', 'C', 'D'];

/// One multiple-choice question. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    pub correct: usize,
}

impl Question {
    /// Build and validate a question
    pub fn new(text: impl Into<String>, options: Vec<String>, correct: usize) -> Result<Self> {
        let question = Self {
            text: text.into(),
            options,
            correct,
        };
        question.validate("question")?;
        Ok(question)
    }

    /// Reject anything the game cannot be played with
    pub fn validate(&self, provider: &str) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(CoreError::provider_unavailable(provider, "question text is empty"));
        }
        if self.options.len() != OPTION_COUNT {
            return Err(CoreError::provider_unavailable(
                provider,
                format!("expected {} options, got {}", OPTION_COUNT, self.options.len()),
            ));
        }
        if self.correct >= OPTION_COUNT {
            return Err(CoreError::provider_unavailable(
                provider,
                format!("correct index {} is out of range", self.correct),
            ));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err(CoreError::provider_unavailable(provider, "an option is empty"));
        }
        for (i, option) in self.options.iter().enumerate() {
            if self.options[i + 1..].contains(option) {
                return Err(CoreError::provider_unavailable(
                    provider,
                    format!("option '{}' appears twice", option),
                ));
            }
        }
        Ok(())
    }

    /// Parse one entry of the-trivia-api v2 response, shuffling the options
    pub fn from_trivia_api(value: &serde_json::Value, rng: &mut impl Rng) -> Result<Self> {
        let entry: TriviaApiEntry = serde_json::from_value(value.clone()).map_err(|e| {
            CoreError::provider_unavailable(TRIVIA_API, format!("malformed question: {}", e))
        })?;

        if entry.incorrect_answers.len() != OPTION_COUNT - 1 {
            return Err(CoreError::provider_unavailable(
                TRIVIA_API,
                format!(
                    "expected {} incorrect answers, got {}",
                    OPTION_COUNT - 1,
                    entry.incorrect_answers.len()
                ),
            ));
        }

        let mut options = entry.incorrect_answers;
        options.push(entry.correct_answer.clone());
        options.shuffle(rng);

        let correct = options
            .iter()
            .position(|o| *o == entry.correct_answer)
            .ok_or_else(|| CoreError::provider_unavailable(TRIVIA_API, "correct answer lost"))?;

        let question = Self {
            text: entry.question.text,
            options,
            correct,
        };
        question.validate(TRIVIA_API)?;
        Ok(question)
    }

    pub fn letter(index: usize) -> char {
        OPTION_LETTERS.get(index).copied().unwrap_or('?')
    }
}

pub(crate) const TRIVIA_API: &str = "the-trivia-api";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriviaApiEntry {
    question: TriviaApiText,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TriviaApiText {
    text: String,
}
