//! Conversion of platform-neutral replies and command descriptors into
//! serenity builders, and of slash command options back into [`CommandArgs`].

use deboche_core::reply::{ButtonSpec, ButtonStyle, EmbedSpec, Reply};
use deboche_core::{ArgValue, CommandArgs, CommandDescriptor, OptionKind, UserId};
use serenity::all::{
    ButtonStyle as DiscordButtonStyle, CommandDataOption, CommandDataOptionValue, CommandOptionType,
    CreateActionRow, CreateButton, CreateCommand, CreateCommandOption, CreateEmbed,
    CreateEmbedAuthor, CreateEmbedFooter, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, EditInteractionResponse, EditMessage,
};

use crate::error::MESSAGE_LIMIT;

pub fn embed(spec: &EmbedSpec) -> CreateEmbed {
    let mut embed = CreateEmbed::new();
    if let Some(title) = &spec.title {
        embed = embed.title(title);
    }
    if let Some(description) = &spec.description {
        embed = embed.description(description);
    }
    if let Some(url) = &spec.url {
        embed = embed.url(url);
    }
    if let Some(colour) = spec.colour {
        embed = embed.colour(colour);
    }
    for field in &spec.fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &spec.footer {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(image) = &spec.image {
        embed = embed.image(image);
    }
    if let Some(thumbnail) = &spec.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    if let Some(author) = &spec.author {
        embed = embed.author(CreateEmbedAuthor::new(author));
    }
    embed
}

fn button_style(style: ButtonStyle) -> DiscordButtonStyle {
    match style {
        ButtonStyle::Primary => DiscordButtonStyle::Primary,
        ButtonStyle::Secondary => DiscordButtonStyle::Secondary,
        ButtonStyle::Success => DiscordButtonStyle::Success,
        ButtonStyle::Danger => DiscordButtonStyle::Danger,
    }
}

fn button(spec: &ButtonSpec) -> CreateButton {
    CreateButton::new(&spec.custom_id)
        .label(&spec.label)
        .style(button_style(spec.style))
        .disabled(spec.disabled)
}

pub fn action_rows(reply: &Reply) -> Vec<CreateActionRow> {
    reply
        .rows
        .iter()
        .map(|row| CreateActionRow::Buttons(row.iter().map(button).collect()))
        .collect()
}

fn embeds(reply: &Reply) -> Vec<CreateEmbed> {
    reply.embed.iter().map(embed).collect()
}

/// First response to a slash command or button press
pub fn interaction_message(reply: &Reply) -> CreateInteractionResponseMessage {
    let mut message = CreateInteractionResponseMessage::new()
        .embeds(embeds(reply))
        .components(action_rows(reply))
        .ephemeral(reply.ephemeral);
    if let Some(content) = &reply.content {
        message = message.content(content);
    }
    message
}

/// Replace the pressed message wholesale: missing parts are cleared
pub fn update_message(reply: &Reply) -> CreateInteractionResponseMessage {
    CreateInteractionResponseMessage::new()
        .content(reply.content.clone().unwrap_or_default())
        .embeds(embeds(reply))
        .components(action_rows(reply))
}

pub fn edit_interaction(reply: &Reply) -> EditInteractionResponse {
    EditInteractionResponse::new()
        .content(reply.content.clone().unwrap_or_default())
        .embeds(embeds(reply))
        .components(action_rows(reply))
}

pub fn followup(reply: &Reply) -> CreateInteractionResponseFollowup {
    let mut message = CreateInteractionResponseFollowup::new()
        .embeds(embeds(reply))
        .components(action_rows(reply))
        .ephemeral(reply.ephemeral);
    if let Some(content) = &reply.content {
        message = message.content(content);
    }
    message
}

pub fn channel_message(reply: &Reply) -> CreateMessage {
    let mut message = CreateMessage::new()
        .embeds(embeds(reply))
        .components(action_rows(reply));
    if let Some(content) = &reply.content {
        message = message.content(content);
    }
    message
}

pub fn edit_message(reply: &Reply) -> EditMessage {
    EditMessage::new()
        .content(reply.content.clone().unwrap_or_default())
        .embeds(embeds(reply))
        .components(action_rows(reply))
}

/// Split content on line boundaries so each chunk fits in one message
pub fn split_message(content: &str, max_length: usize) -> Vec<String> {
    if content.chars().count() <= max_length {
        return vec![content.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in content.lines() {
        let line_len = line.chars().count();
        if current_len + line_len + 1 > max_length {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }

            // If a single line is too long, split it
            if line_len > max_length {
                for chunk in line.chars().collect::<Vec<_>>().chunks(max_length) {
                    chunks.push(chunk.iter().collect());
                }
            } else {
                current = line.to_string();
                current_len = line_len;
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Break a reply whose content exceeds Discord's limit into leading text
/// parts and a final part that carries the embed and buttons.
pub fn split_reply(reply: Reply) -> (Vec<Reply>, Reply) {
    let Some(content) = reply.content.as_deref() else {
        return (Vec::new(), reply);
    };
    let mut chunks = split_message(content, MESSAGE_LIMIT);
    let Some(last) = chunks.pop().filter(|_| !chunks.is_empty()) else {
        return (Vec::new(), reply);
    };

    let leading = chunks
        .into_iter()
        .map(|chunk| Reply::text(chunk).ephemeral(reply.ephemeral))
        .collect();
    let last = Reply {
        content: Some(last),
        ..reply
    };
    (leading, last)
}

fn option_type(kind: OptionKind) -> CommandOptionType {
    match kind {
        OptionKind::String => CommandOptionType::String,
        OptionKind::Integer => CommandOptionType::Integer,
        OptionKind::Boolean => CommandOptionType::Boolean,
        OptionKind::User => CommandOptionType::User,
    }
}

/// Slash command definition for a registry entry
pub fn create_command(descriptor: &CommandDescriptor) -> CreateCommand {
    descriptor.options.iter().fold(
        CreateCommand::new(descriptor.name).description(descriptor.description),
        |command, option| {
            command.add_option(
                CreateCommandOption::new(option_type(option.kind), option.name, option.description)
                    .required(option.required),
            )
        },
    )
}

pub fn create_commands<'a>(
    descriptors: impl IntoIterator<Item = &'a CommandDescriptor>,
) -> Vec<CreateCommand> {
    descriptors.into_iter().map(create_command).collect()
}

/// Typed arguments from the options Discord resolved for us.
/// Options the descriptor does not know, or of an unexpected type, are skipped.
pub fn args_from_options(
    descriptor: &CommandDescriptor,
    options: &[CommandDataOption],
) -> CommandArgs {
    let mut args = CommandArgs::new();
    for option in options {
        let Some(spec) = descriptor.options.iter().find(|o| o.name == option.name) else {
            continue;
        };
        let value = match (spec.kind, &option.value) {
            (OptionKind::String, CommandDataOptionValue::String(s)) => ArgValue::String(s.clone()),
            (OptionKind::Integer, CommandDataOptionValue::Integer(i)) => ArgValue::Integer(*i),
            (OptionKind::Boolean, CommandDataOptionValue::Boolean(b)) => ArgValue::Boolean(*b),
            (OptionKind::User, CommandDataOptionValue::User(id)) => {
                ArgValue::User(UserId(id.get()))
            }
            _ => continue,
        };
        args.insert(spec.name, value);
    }
    args
}
