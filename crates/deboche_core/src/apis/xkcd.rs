use serde::Deserialize;

use super::{ApiClient, join_url};
use crate::reply::{EmbedSpec, Reply};
use crate::{CoreError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Comic {
    pub num: u32,
    pub title: String,
    #[serde(default)]
    pub alt: String,
    pub img: String,
    pub day: String,
    pub month: String,
    pub year: String,
}

impl ApiClient {
    /// Today's comic
    pub async fn latest_comic(&self) -> Result<Comic> {
        let url = join_url(&self.urls().xkcd_url, "info.0.json");
        self.get_json("xkcd", &url, &[])
            .await?
            .ok_or_else(|| CoreError::not_found("comic", "latest"))
    }
}

pub fn render(comic: &Comic, base_url: &str) -> Reply {
    Reply::embed(
        EmbedSpec::new(format!("XKCD #{} — {}", comic.num, comic.title))
            .description(comic.alt.clone())
            .url(join_url(base_url, &format!("{}/", comic.num)))
            .colour(0xFFFFFF)
            .image(comic.img.clone())
            .footer(format!("{}/{}/{}", comic.day, comic.month, comic.year)),
    )
}
