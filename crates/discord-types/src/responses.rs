//! Outbound interaction responses.
//!
//! The body of the HTTP reply to an interaction POST. Discord expects exactly
//! one of these within 3 seconds.

use serde::Serialize;

/// Message flag hiding the reply from everyone but the invoker.
pub const EPHEMERAL: u64 = 1 << 6;

/// Most choices Discord accepts in an autocomplete result.
pub const MAX_AUTOCOMPLETE_CHOICES: usize = 25;

/// Interaction callback `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackType {
    Pong,
    ChannelMessageWithSource,
    DeferredChannelMessageWithSource,
    DeferredUpdateMessage,
    UpdateMessage,
    ApplicationCommandAutocompleteResult,
    Modal,
}

impl CallbackType {
    pub fn as_raw(&self) -> u8 {
        match self {
            Self::Pong => 1,
            Self::ChannelMessageWithSource => 4,
            Self::DeferredChannelMessageWithSource => 5,
            Self::DeferredUpdateMessage => 6,
            Self::UpdateMessage => 7,
            Self::ApplicationCommandAutocompleteResult => 8,
            Self::Modal => 9,
        }
    }
}

impl Serialize for CallbackType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_raw())
    }
}

/// Message payload for message replies, updates and deferred acknowledgements.
///
/// `components: None` leaves existing components untouched on an update;
/// `Some(vec![])` clears them.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MessageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mentions: Option<serde_json::Value>,
}

impl MessageData {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.flags = Some(self.flags.unwrap_or(0) | EPHEMERAL);
        self
    }

    pub fn with_embed(mut self, embed: serde_json::Value) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn with_components(mut self, components: Vec<serde_json::Value>) -> Self {
        self.components = Some(components);
        self
    }
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AutocompleteChoice {
    pub name: String,
    /// String, integer or number, matching the option being completed.
    pub value: serde_json::Value,
}

impl AutocompleteChoice {
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Modal popup shown in response to a command or component.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModalData {
    pub custom_id: String,
    pub title: String,
    pub components: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CallbackData {
    Message(MessageData),
    Autocomplete { choices: Vec<AutocompleteChoice> },
    Modal(ModalData),
}

/// Interaction response body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: CallbackType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CallbackData>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: CallbackType::Pong,
            data: None,
        }
    }

    pub fn message(data: MessageData) -> Self {
        Self {
            kind: CallbackType::ChannelMessageWithSource,
            data: Some(CallbackData::Message(data)),
        }
    }

    /// Acknowledge now, send the message later through the follow-up webhook.
    pub fn deferred_message(ephemeral: bool) -> Self {
        Self {
            kind: CallbackType::DeferredChannelMessageWithSource,
            data: ephemeral.then(|| CallbackData::Message(MessageData::default().ephemeral())),
        }
    }

    pub fn deferred_update() -> Self {
        Self {
            kind: CallbackType::DeferredUpdateMessage,
            data: None,
        }
    }

    /// Edit the message the component is attached to.
    pub fn update_message(data: MessageData) -> Self {
        Self {
            kind: CallbackType::UpdateMessage,
            data: Some(CallbackData::Message(data)),
        }
    }

    /// Autocomplete result, truncated to [`MAX_AUTOCOMPLETE_CHOICES`].
    pub fn autocomplete(mut choices: Vec<AutocompleteChoice>) -> Self {
        choices.truncate(MAX_AUTOCOMPLETE_CHOICES);
        Self {
            kind: CallbackType::ApplicationCommandAutocompleteResult,
            data: Some(CallbackData::Autocomplete { choices }),
        }
    }

    pub fn modal(data: ModalData) -> Self {
        Self {
            kind: CallbackType::Modal,
            data: Some(CallbackData::Modal(data)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pong_shape() {
        let json = serde_json::to_value(InteractionResponse::pong()).unwrap();
        assert_eq!(json, json!({ "type": 1 }));
    }

    #[test]
    fn test_ephemeral_message_shape() {
        let response = InteractionResponse::message(MessageData::content("hi").ephemeral());
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(
            json,
            json!({ "type": 4, "data": { "content": "hi", "flags": 64 } })
        );
    }

    #[test]
    fn test_update_message_clears_components() {
        let response = InteractionResponse::update_message(
            MessageData::content("Dismissed.").with_components(vec![]),
        );
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(
            json,
            json!({ "type": 7, "data": { "content": "Dismissed.", "components": [] } })
        );
    }

    #[test]
    fn test_autocomplete_truncates_to_limit() {
        let choices = (0..40)
            .map(|i| AutocompleteChoice::new(format!("choice {i}"), i))
            .collect();
        let response = InteractionResponse::autocomplete(choices);
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["type"], 8);
        assert_eq!(json["data"]["choices"].as_array().unwrap().len(), 25);
        assert_eq!(json["data"]["choices"][24]["value"], 24);
    }

    #[test]
    fn test_deferred_message_without_flags() {
        let json = serde_json::to_value(InteractionResponse::deferred_message(false)).unwrap();
        assert_eq!(json, json!({ "type": 5 }));

        let json = serde_json::to_value(InteractionResponse::deferred_message(true)).unwrap();
        assert_eq!(json, json!({ "type": 5, "data": { "flags": 64 } }));
    }

    #[test]
    fn test_modal_shape() {
        let response = InteractionResponse::modal(ModalData {
            custom_id: "t_abc".to_string(),
            title: "Edit".to_string(),
            components: vec![json!({ "type": 1, "components": [] })],
        });
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["type"], 9);
        assert_eq!(json["data"]["custom_id"], "t_abc");
        assert_eq!(json["data"]["title"], "Edit");
    }
}
