//! Deboche Discord - serenity adapter
//!
//! Connects the platform-neutral pieces in `deboche-core` to Discord: slash
//! and prefix commands share one set of handlers through [`request::Request`],
//! quiz and paginator buttons are routed by custom id, and every Joker round
//! runs against a timer.

pub mod bot;
pub mod commands;
pub mod components;
pub mod context;
pub mod error;
pub mod render;
pub mod request;
pub mod timers;

pub use bot::{DebocheBot, DebocheBotBuilder, run_bot};
pub use commands::CommandHandler;
pub use context::BotContext;
pub use error::{DiscordError, Result};
pub use request::{ChannelPoster, Request, SlashRequest, TextRequest};

// Re-export serenity for convenience
pub use serenity;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        BotContext, ChannelPoster, CommandHandler, DebocheBot, DiscordError, Request, Result,
        SlashRequest, TextRequest,
    };
}
