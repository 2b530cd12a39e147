//! Thin wrappers around the public JSON APIs behind the fun commands.
//!
//! Every wrapper fetches into a typed struct and has a pure `render` that turns
//! it into a [`Reply`](crate::reply::Reply), so the formatting can be tested
//! against captured payloads without the network.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::HttpConfig;
use crate::{CoreError, Result};

pub mod meme;
pub mod pokedex;
pub mod waifu;
pub mod weather;
pub mod xkcd;

/// One client shared by every outbound request
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| CoreError::http("client", "", e))
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    urls: HttpConfig,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, config: &HttpConfig) -> Self {
        Self {
            http,
            urls: config.clone(),
        }
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Ok(Self::new(build_http_client(config)?, config))
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn urls(&self) -> &HttpConfig {
        &self.urls
    }

    /// GET and decode JSON. `Ok(None)` on 404, `UpstreamStatus` on any other failure status.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        debug!(service, url, "GET");
        let response = self
            .http
            .get(url)
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| CoreError::http(service, url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CoreError::UpstreamStatus {
                service: service.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| CoreError::http(service, url, e))
    }
}

/// Trim trailing slashes so `{base}/{path}` never doubles up
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
