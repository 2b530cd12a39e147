use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::{CoreError, Result};

/// String-to-string translation. Never fails: on any error the input comes back unchanged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> String;
}

/// Leaves text alone
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTranslator;

#[async_trait]
impl Translator for NoopTranslator {
    async fn translate(&self, text: &str) -> String {
        text.to_string()
    }
}

/// MyMemory free translation API
pub struct MyMemoryTranslator {
    http: reqwest::Client,
    url: String,
    langpair: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_data: MyMemoryData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryData {
    translated_text: Option<String>,
}

const SERVICE: &str = "mymemory";

impl MyMemoryTranslator {
    /// English to European Portuguese
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            langpair: "en|pt".to_string(),
        }
    }

    pub fn with_langpair(mut self, langpair: impl Into<String>) -> Self {
        self.langpair = langpair.into();
        self
    }

    async fn try_translate(&self, text: &str) -> Result<String> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("q", text), ("langpair", self.langpair.as_str())])
            .send()
            .await
            .map_err(|e| CoreError::http(SERVICE, &self.url, e))?;

        if !response.status().is_success() {
            return Err(CoreError::UpstreamStatus {
                service: SERVICE.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: MyMemoryResponse = response
            .json()
            .await
            .map_err(|e| CoreError::http(SERVICE, &self.url, e))?;

        extract_translation(body).ok_or_else(|| CoreError::UpstreamStatus {
            service: SERVICE.to_string(),
            status: 200,
        })
    }
}

/// Quota warnings come back as a "translation"
fn extract_translation(body: MyMemoryResponse) -> Option<String> {
    body.response_data
        .translated_text
        .filter(|t| !t.trim().is_empty())
        .filter(|t| !t.starts_with("MYMEMORY WARNING"))
}

#[async_trait]
impl Translator for MyMemoryTranslator {
    async fn translate(&self, text: &str) -> String {
        match self.try_translate(text).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("translation failed, using original text: {}", e);
                text.to_string()
            }
        }
    }
}
