//! One invocation of a command, whichever way it arrived.
//!
//! Handlers only talk to [`Request`]; slash commands and prefix text commands
//! each provide an implementation. [`ChannelPoster`] covers the messages sent
//! outside of a request, such as the next Joker question after a timeout.

use std::sync::Arc;

use async_trait::async_trait;
use deboche_core::joker::PromptLocation;
use deboche_core::{Reply, UserId};
use serenity::all::{
    ChannelId, CommandInteraction, CreateInteractionResponse, CreateInteractionResponseMessage,
    Http, Message, MessageId, UserId as DiscordUserId,
};
use tracing::debug;

use crate::error::{DiscordError, Result};
use crate::render;

/// Where a message ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel_id: u64,
    pub message_id: u64,
}

impl From<&Message> for PostedMessage {
    fn from(message: &Message) -> Self {
        Self {
            channel_id: message.channel_id.get(),
            message_id: message.id.get(),
        }
    }
}

impl From<PostedMessage> for PromptLocation {
    fn from(posted: PostedMessage) -> Self {
        Self {
            channel_id: posted.channel_id,
            message_id: posted.message_id,
        }
    }
}

impl From<PromptLocation> for PostedMessage {
    fn from(location: PromptLocation) -> Self {
        Self {
            channel_id: location.channel_id,
            message_id: location.message_id,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelPoster: Send + Sync {
    async fn post(&self, channel_id: u64, reply: Reply) -> Result<PostedMessage>;
    async fn edit(&self, location: PostedMessage, reply: Reply) -> Result<()>;
}

/// Posts straight through the REST client
pub struct HttpPoster {
    http: Arc<Http>,
}

impl HttpPoster {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    async fn send_part(&self, channel: ChannelId, part: &Reply) -> Result<PostedMessage> {
        channel
            .send_message(&self.http, render::channel_message(part))
            .await
            .map(|message| PostedMessage::from(&message))
            .map_err(|e| {
                DiscordError::send_failed(format!("channel {}", channel), content_length(part), e)
            })
    }
}

#[async_trait]
impl ChannelPoster for HttpPoster {
    async fn post(&self, channel_id: u64, reply: Reply) -> Result<PostedMessage> {
        let channel = ChannelId::new(channel_id);
        let (leading, last) = render::split_reply(reply);
        for part in &leading {
            self.send_part(channel, part).await?;
        }
        self.send_part(channel, &last).await
    }

    async fn edit(&self, location: PostedMessage, reply: Reply) -> Result<()> {
        ChannelId::new(location.channel_id)
            .edit_message(
                &self.http,
                MessageId::new(location.message_id),
                render::edit_message(&reply),
            )
            .await
            .map_err(|e| {
                DiscordError::send_failed(format!("message {}", location.message_id), 0, e)
            })?;
        Ok(())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Request: Send {
    fn user(&self) -> UserId;
    fn display_name(&self) -> String;
    fn channel_id(&self) -> u64;
    /// `None` in direct messages
    fn guild_id(&self) -> Option<u64>;
    fn is_slash(&self) -> bool;

    /// Best effort name for another user, falling back to a mention
    async fn display_name_of(&self, user: UserId) -> String;

    /// Acknowledge now, answer later. Needed before anything slow.
    async fn defer(&mut self) -> Result<()>;

    /// Send a reply; later calls add follow-up messages
    async fn respond(&mut self, reply: Reply) -> Result<PostedMessage>;

    fn poster(&self) -> Arc<dyn ChannelPoster>;
}

fn content_length(reply: &Reply) -> usize {
    reply.content.as_deref().map_or(0, |c| c.chars().count())
}

async fn fetch_display_name(http: &Arc<Http>, user: UserId) -> String {
    match DiscordUserId::new(user.get()).to_user(http).await {
        Ok(found) => found.display_name().to_string(),
        Err(e) => {
            debug!("could not fetch user {}: {}", user, e);
            user.mention()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseState {
    Fresh,
    Deferred,
    Responded,
}

pub struct SlashRequest {
    http: Arc<Http>,
    command: CommandInteraction,
    state: ResponseState,
}

impl SlashRequest {
    pub fn new(http: Arc<Http>, command: CommandInteraction) -> Self {
        Self {
            http,
            command,
            state: ResponseState::Fresh,
        }
    }

    pub fn command(&self) -> &CommandInteraction {
        &self.command
    }

    fn failed(&self, cause: serenity::Error) -> DiscordError {
        DiscordError::interaction_failed(
            "command",
            self.command.id.get(),
            self.command.user.id.get(),
            cause,
            self.state != ResponseState::Fresh,
        )
    }

    async fn send_part(&mut self, part: &Reply) -> Result<PostedMessage> {
        let message = match self.state {
            ResponseState::Fresh => {
                self.command
                    .create_response(
                        &self.http,
                        CreateInteractionResponse::Message(render::interaction_message(part)),
                    )
                    .await
                    .map_err(|e| self.failed(e))?;
                self.command
                    .get_response(&self.http)
                    .await
                    .map_err(|e| self.failed(e))?
            }
            // the deferred placeholder is public, so private replies go to a follow-up
            ResponseState::Deferred if part.ephemeral => {
                if let Err(e) = self.command.delete_response(&self.http).await {
                    debug!("could not delete deferred response: {}", e);
                }
                self.command
                    .create_followup(&self.http, render::followup(part))
                    .await
                    .map_err(|e| self.failed(e))?
            }
            ResponseState::Deferred => self
                .command
                .edit_response(&self.http, render::edit_interaction(part))
                .await
                .map_err(|e| self.failed(e))?,
            ResponseState::Responded => self
                .command
                .create_followup(&self.http, render::followup(part))
                .await
                .map_err(|e| self.failed(e))?,
        };
        self.state = ResponseState::Responded;
        Ok(PostedMessage::from(&message))
    }
}

#[async_trait]
impl Request for SlashRequest {
    fn user(&self) -> UserId {
        UserId(self.command.user.id.get())
    }

    fn display_name(&self) -> String {
        self.command.user.display_name().to_string()
    }

    fn channel_id(&self) -> u64 {
        self.command.channel_id.get()
    }

    fn guild_id(&self) -> Option<u64> {
        self.command.guild_id.map(|id| id.get())
    }

    fn is_slash(&self) -> bool {
        true
    }

    async fn display_name_of(&self, user: UserId) -> String {
        if user == self.user() {
            return self.display_name();
        }
        match self
            .command
            .data
            .resolved
            .users
            .get(&DiscordUserId::new(user.get()))
        {
            Some(found) => found.display_name().to_string(),
            None => fetch_display_name(&self.http, user).await,
        }
    }

    async fn defer(&mut self) -> Result<()> {
        if self.state != ResponseState::Fresh {
            return Ok(());
        }
        self.command
            .create_response(
                &self.http,
                CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
            )
            .await
            .map_err(|e| self.failed(e))?;
        self.state = ResponseState::Deferred;
        Ok(())
    }

    async fn respond(&mut self, reply: Reply) -> Result<PostedMessage> {
        let (leading, last) = render::split_reply(reply);
        for part in &leading {
            self.send_part(part).await?;
        }
        self.send_part(&last).await
    }

    fn poster(&self) -> Arc<dyn ChannelPoster> {
        Arc::new(HttpPoster::new(self.http.clone()))
    }
}

/// A prefix command typed in a channel. Ephemeral replies are sent as
/// ordinary replies since plain messages cannot be hidden.
pub struct TextRequest {
    http: Arc<Http>,
    message: Message,
    replied: bool,
}

impl TextRequest {
    pub fn new(http: Arc<Http>, message: Message) -> Self {
        Self {
            http,
            message,
            replied: false,
        }
    }

    async fn send_part(&mut self, part: &Reply) -> Result<PostedMessage> {
        let mut builder = render::channel_message(part);
        if !self.replied {
            builder = builder.reference_message(&self.message);
        }
        let sent = self
            .message
            .channel_id
            .send_message(&self.http, builder)
            .await
            .map_err(|e| {
                DiscordError::send_failed(
                    format!("channel {}", self.message.channel_id),
                    content_length(part),
                    e,
                )
            })?;
        self.replied = true;
        Ok(PostedMessage::from(&sent))
    }
}

#[async_trait]
impl Request for TextRequest {
    fn user(&self) -> UserId {
        UserId(self.message.author.id.get())
    }

    fn display_name(&self) -> String {
        self.message.author.display_name().to_string()
    }

    fn channel_id(&self) -> u64 {
        self.message.channel_id.get()
    }

    fn guild_id(&self) -> Option<u64> {
        self.message.guild_id.map(|id| id.get())
    }

    fn is_slash(&self) -> bool {
        false
    }

    async fn display_name_of(&self, user: UserId) -> String {
        if user == self.user() {
            return self.display_name();
        }
        match self
            .message
            .mentions
            .iter()
            .find(|mentioned| mentioned.id.get() == user.get())
        {
            Some(found) => found.display_name().to_string(),
            None => fetch_display_name(&self.http, user).await,
        }
    }

    async fn defer(&mut self) -> Result<()> {
        if let Err(e) = self.message.channel_id.broadcast_typing(&self.http).await {
            debug!("typing indicator failed: {}", e);
        }
        Ok(())
    }

    async fn respond(&mut self, reply: Reply) -> Result<PostedMessage> {
        let (leading, last) = render::split_reply(reply);
        for part in &leading {
            self.send_part(part).await?;
        }
        self.send_part(&last).await
    }

    fn poster(&self) -> Arc<dyn ChannelPoster> {
        Arc::new(HttpPoster::new(self.http.clone()))
    }
}
