use deboche_core::CoreError;
use miette::Diagnostic;
use serenity::gateway::GatewayError;
use thiserror::Error;

/// Discord's hard limit on message content
pub const MESSAGE_LIMIT: usize = 2000;

#[derive(Error, Diagnostic, Debug)]
pub enum DiscordError {
    #[error("Discord authentication failed")]
    #[diagnostic(
        code(deboche::discord::auth_failed),
        help("Check that your Discord bot token is valid and has not been regenerated")
    )]
    AuthenticationFailed {
        #[source]
        cause: serenity::Error,
        token_preview: String, // First/last few chars of token for debugging
    },

    #[error("Message send failed")]
    #[diagnostic(
        code(deboche::discord::message_send_failed),
        help("Failed to send message to {destination}")
    )]
    MessageSendFailed {
        destination: String,
        message_length: usize,
        #[source]
        cause: serenity::Error,
    },

    #[error("Command registration failed")]
    #[diagnostic(
        code(deboche::discord::command_registration_failed),
        help("Failed to register slash commands: {}", command_names.join(", "))
    )]
    CommandRegistrationFailed {
        command_names: Vec<String>,
        guild_id: Option<u64>,
        #[source]
        cause: serenity::Error,
    },

    #[error("Handler not found")]
    #[diagnostic(
        code(deboche::discord::handler_not_found),
        help("No handler registered for {handler_type} '{handler_name}'")
    )]
    HandlerNotFound {
        handler_type: String, // "command", "component"
        handler_name: String,
        available_handlers: Vec<String>,
    },

    #[error("Interaction failed")]
    #[diagnostic(
        code(deboche::discord::interaction_failed),
        help("Failed to answer Discord interaction of type '{interaction_type}'")
    )]
    InteractionFailed {
        interaction_type: String,
        interaction_id: u64,
        user_id: u64,
        #[source]
        cause: serenity::Error,
        responded: bool,
    },

    #[error("Invalid bot configuration")]
    #[diagnostic(
        code(deboche::discord::invalid_bot_config),
        help("Bot configuration error: {issues}")
    )]
    InvalidBotConfiguration {
        issues: String,
        missing_fields: Vec<String>,
    },

    #[error("Discord gateway connection failed")]
    #[diagnostic(
        code(deboche::discord::gateway_failed),
        help("The connection to Discord dropped and could not be resumed")
    )]
    GatewayFailed {
        #[source]
        cause: serenity::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, DiscordError>;

// Helper functions for creating common errors
impl DiscordError {
    pub fn auth_failed(cause: serenity::Error, token: &str) -> Self {
        // Show first 6 and last 4 characters of token for debugging
        let token_preview = if token.len() > 10 && token.is_ascii() {
            format!("{}...{}", &token[..6], &token[token.len() - 4..])
        } else {
            "***".to_string()
        };

        Self::AuthenticationFailed {
            cause,
            token_preview,
        }
    }

    pub fn send_failed(
        destination: impl Into<String>,
        message_length: usize,
        cause: serenity::Error,
    ) -> Self {
        Self::MessageSendFailed {
            destination: destination.into(),
            message_length,
            cause,
        }
    }

    pub fn interaction_failed(
        interaction_type: impl Into<String>,
        interaction_id: u64,
        user_id: u64,
        cause: serenity::Error,
        responded: bool,
    ) -> Self {
        Self::InteractionFailed {
            interaction_type: interaction_type.into(),
            interaction_id,
            user_id,
            cause,
            responded,
        }
    }

    /// Sort a failure from building or running the client. Only rejected
    /// tokens are reported as authentication errors.
    pub fn client_failed(cause: serenity::Error, token: &str) -> Self {
        match &cause {
            serenity::Error::Gateway(
                GatewayError::InvalidAuthentication | GatewayError::NoAuthentication,
            ) => Self::auth_failed(cause, token),
            serenity::Error::Http(http)
                if http.status_code().is_some_and(|status| status.as_u16() == 401) =>
            {
                Self::auth_failed(cause, token)
            }
            serenity::Error::Gateway(
                GatewayError::DisallowedGatewayIntents | GatewayError::InvalidGatewayIntents,
            ) => Self::InvalidBotConfiguration {
                issues: "privileged intents are not enabled for this application".to_string(),
                missing_fields: vec!["MESSAGE_CONTENT".to_string()],
            },
            _ => Self::GatewayFailed { cause },
        }
    }

    /// What the player should see when this error ends a command
    pub fn user_message(&self) -> String {
        match self {
            Self::Core(e) => e.user_message(),
            _ => "Ocorreu um erro interno.".to_string(),
        }
    }

    /// True when the failure is the player's doing rather than ours
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::Core(e) => e.is_user_error(),
            _ => false,
        }
    }
}
