//! Classification of verified request bodies into typed events.

use discord_types::{
    CommandData, CommandType, ComponentData, Interaction, InteractionType, ModalSubmitData,
};

use crate::path::{QualifiedPath, WalkedPath, resolve};

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("invalid interaction body: {0}")]
    InvalidBody(#[source] serde_json::Error),
    #[error("{kind} interaction has no data")]
    MissingData { kind: &'static str },
    #[error("invalid {kind} data: {source}")]
    InvalidData {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Command or autocomplete invocation, with its routing discriminants.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    pub command_type: CommandType,
    /// Lowercased command name.
    pub name: String,
    pub path: QualifiedPath,
    pub data: CommandData,
}

impl CommandInvocation {
    fn from_data(data: CommandData) -> Self {
        let command_type = data.command_type();
        // Context-menu commands have no option tree worth walking.
        let walked = match command_type {
            CommandType::ChatInput => WalkedPath::walk(&data.options),
            _ => WalkedPath::default(),
        };
        Self {
            command_type,
            name: data.name.to_lowercase(),
            path: resolve(&walked),
            data,
        }
    }

    /// `{name} {path}`, the label commands are traced under.
    pub fn route(&self) -> String {
        format!("{} {}", self.name, self.path)
    }
}

/// One inbound interaction, classified by its `type`.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Ping,
    Command(CommandInvocation),
    Autocomplete(CommandInvocation),
    Component(ComponentData),
    ModalSubmit(ModalSubmitData),
    /// An interaction type this router does not handle.
    Unknown(u32),
}

impl InboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Command(_) => "command",
            Self::Autocomplete(_) => "autocomplete",
            Self::Component(_) => "component",
            Self::ModalSubmit(_) => "modal_submit",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Parses a verified body into the envelope and its typed event.
///
/// Must only be called after signature verification succeeded.
pub fn classify(body: &[u8]) -> Result<(Interaction, InboundEvent), ClassifyError> {
    let interaction: Interaction =
        serde_json::from_slice(body).map_err(ClassifyError::InvalidBody)?;

    let event = match interaction.interaction_type() {
        InteractionType::Ping => InboundEvent::Ping,
        InteractionType::ApplicationCommand => {
            InboundEvent::Command(CommandInvocation::from_data(data(&interaction, "command")?))
        }
        InteractionType::ApplicationCommandAutocomplete => InboundEvent::Autocomplete(
            CommandInvocation::from_data(data(&interaction, "autocomplete")?),
        ),
        InteractionType::MessageComponent => {
            InboundEvent::Component(data(&interaction, "component")?)
        }
        InteractionType::ModalSubmit => InboundEvent::ModalSubmit(data(&interaction, "modal")?),
        InteractionType::Unknown(raw) => InboundEvent::Unknown(raw),
    };

    Ok((interaction, event))
}

fn data<T: serde::de::DeserializeOwned>(
    interaction: &Interaction,
    kind: &'static str,
) -> Result<T, ClassifyError> {
    let value = interaction
        .data
        .clone()
        .ok_or(ClassifyError::MissingData { kind })?;
    serde_json::from_value(value).map_err(|source| ClassifyError::InvalidData { kind, source })
}
