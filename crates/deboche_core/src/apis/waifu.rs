//! waifu.im search, SFW only.

use serde::Deserialize;

use super::{ApiClient, join_url};
use crate::reply::{EmbedSpec, Reply, colours};
use crate::{CoreError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub images: Vec<WaifuImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaifuImage {
    pub url: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub is_nsfw: bool,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub byte_size: Option<u64>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub artist: Option<Artist>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// Comma separated tags, blanks dropped
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

impl ApiClient {
    pub async fn waifu(&self, tags: &[String]) -> Result<WaifuImage> {
        let url = join_url(&self.urls().waifu_url, "search");
        let mut query: Vec<(&str, &str)> = tags
            .iter()
            .map(|tag| ("included_tags", tag.as_str()))
            .collect();
        query.push(("is_nsfw", "false"));

        let response: SearchResponse = self
            .get_json("waifu.im", &url, &query)
            .await?
            .unwrap_or(SearchResponse { images: Vec::new() });

        response
            .images
            .into_iter()
            .find(|image| !image.is_nsfw)
            .ok_or_else(|| CoreError::not_found("waifu com as tags", tags.join(", ")))
    }
}

fn or_unknown<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "??".to_string())
}

pub fn render(image: &WaifuImage) -> Reply {
    let tags = image
        .tags
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    Reply::embed(
        EmbedSpec::new("Waifu 🖼️")
            .description(format!(
                "**Artista:** {}\n**Fonte:** {}\n**Tags:** {}\n**Publicada:** {}",
                or_unknown(image.artist.as_ref().map(|a| a.name.as_str())),
                or_unknown(image.source.as_deref()),
                if tags.is_empty() { "??" } else { tags.as_str() },
                or_unknown(image.uploaded_at.as_deref()),
            ))
            .colour(colours::PURPLE)
            .image(image.url.clone())
            .footer(format!(
                "Dimensões: {}x{} | Bytes: {}",
                or_unknown(image.width),
                or_unknown(image.height),
                or_unknown(image.byte_size)
            )),
    )
}
