//! Handler failures and their translation into user-facing replies.

use discord_types::{
    DiscordApiError, ErrorCategory, Interaction, InteractionResponse, MessageData,
};

/// Reply body for failures the router has nothing better to say about.
pub const UNLUCKY_ERROR: &str = "You've found a super unlucky error. Try again later!";

/// Error returned by a handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The Discord REST API rejected a call the handler made.
    #[error(transparent)]
    Discord(#[from] DiscordApiError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn other(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Other(anyhow::Error::msg(message))
    }
}

/// Turns a recognised Discord API error into a reply.
///
/// `None` means there is no specific message and the generic fallback is used.
pub trait ErrorTranslator: Send + Sync + 'static {
    fn translate(
        &self,
        interaction: &Interaction,
        error: &DiscordApiError,
    ) -> Option<InteractionResponse>;
}

/// Default translator: one ephemeral message per error category.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscordErrorMessages;

impl ErrorTranslator for DiscordErrorMessages {
    fn translate(
        &self,
        interaction: &Interaction,
        error: &DiscordApiError,
    ) -> Option<InteractionResponse> {
        let content = match error.category() {
            ErrorCategory::PermissionDenied => {
                if interaction.guild_id.is_some() {
                    "I don't have permission to do that here. Check my role's permissions and the channel overrides."
                } else {
                    "I'm not allowed to do that in this conversation."
                }
            }
            ErrorCategory::NotFound => {
                "Something I needed no longer exists. It may have been deleted."
            }
            ErrorCategory::RateLimit => "I'm being rate limited by Discord. Try again in a moment.",
            ErrorCategory::PayloadTooLarge => "That was too large for Discord to accept.",
            ErrorCategory::InvalidInput => {
                "Discord rejected that request. Check your input and try again."
            }
            ErrorCategory::Unknown => return None,
        };
        Some(InteractionResponse::message(
            MessageData::content(content).ephemeral(),
        ))
    }
}
