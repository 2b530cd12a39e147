//! Platform-neutral outgoing messages.
//!
//! Handlers build a [`Reply`]; the chat adapter turns it into the platform's own
//! message, embed and button builders.

use serde::{Deserialize, Serialize};

/// Embed colours used across commands
pub mod colours {
    pub const BLUE: u32 = 0x3498DB;
    pub const GREEN: u32 = 0x2ECC71;
    pub const ORANGE: u32 = 0xE67E22;
    pub const RED: u32 = 0xE74C3C;
    pub const GOLD: u32 = 0xF1C40F;
    pub const PURPLE: u32 = 0x9B59B6;
    pub const GREY: u32 = 0x95A5A6;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub content: Option<String>,
    pub embed: Option<EmbedSpec>,
    pub rows: Vec<Vec<ButtonSpec>>,
    /// Only visible to the invoking user where the platform supports it
    pub ephemeral: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedSpec {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub colour: Option<u32>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonSpec {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
    pub disabled: bool,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: EmbedSpec) -> Self {
        Self {
            embed: Some(embed),
            ..Default::default()
        }
    }

    /// Ephemeral text, used for per-user errors
    pub fn error(message: impl Into<String>) -> Self {
        Self::text(message).ephemeral(true)
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_row(mut self, row: Vec<ButtonSpec>) -> Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    pub fn without_buttons(mut self) -> Self {
        self.rows.clear();
        self
    }

    /// Flattened view of every button, mostly for tests and logging
    pub fn buttons(&self) -> impl Iterator<Item = &ButtonSpec> {
        self.rows.iter().flatten()
    }
}

impl EmbedSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn colour(mut self, colour: u32) -> Self {
        self.colour = Some(colour);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn author(mut self, name: impl Into<String>) -> Self {
        self.author = Some(name.into());
        self
    }
}

impl ButtonSpec {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: label.into(),
            style,
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}
