use serde::Deserialize;

use super::{ApiClient, join_url};
use crate::reply::{EmbedSpec, Reply, colours};
use crate::{CoreError, Result};

pub const DEFAULT_SUBREDDIT: &str = "gaming";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meme {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub post_link: Option<String>,
    pub subreddit: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
}

impl ApiClient {
    pub async fn random_meme(&self, subreddit: &str) -> Result<Meme> {
        let url = join_url(&self.urls().meme_url, &urlencoding::encode(subreddit));
        let meme: Meme = self
            .get_json("meme-api", &url, &[])
            .await?
            .ok_or_else(|| CoreError::not_found("subreddit", subreddit))?;
        if meme.nsfw {
            return Err(CoreError::not_found("meme", subreddit));
        }
        Ok(meme)
    }
}

pub fn render(meme: &Meme) -> Reply {
    let mut embed = EmbedSpec::new(meme.title.clone())
        .colour(colours::GREEN)
        .image(meme.url.clone())
        .footer(match &meme.author {
            Some(author) => format!("De r/{} por u/{}", meme.subreddit, author),
            None => format!("De r/{}", meme.subreddit),
        });
    if let Some(link) = &meme.post_link {
        embed = embed.url(link.clone());
    }
    Reply::embed(embed)
}
