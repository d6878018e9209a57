//! What a handler gets to work with.

use std::sync::Arc;
use std::time::Duration;

use discord_types::{
    CommandOption, ComponentData, ComponentType, Interaction, ModalSubmitData, OptionType,
};

use crate::config::Environment;
use crate::errors::HandlerError;
use crate::event::{CommandInvocation, InboundEvent};
use crate::routing::{RoutingKey, RoutingState, RoutingToken};
use crate::store::CallbackStore;

/// Deployment values exposed to every handler.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub application_id: String,
    pub environment: Environment,
    pub bot_token: Option<String>,
    pub development_guild_id: Option<String>,
    pub site_origin: Option<String>,
    /// Lifetime of routing state created through the context.
    pub state_ttl: Duration,
}

/// Context for one handler invocation.
///
/// Carries the raw interaction, the classified event, the routing state that
/// selected the handler (managed components and modals only) and a handle to
/// the callback store for emitting new managed components.
#[derive(Clone)]
pub struct InteractionContext<S> {
    interaction: Arc<Interaction>,
    event: Arc<InboundEvent>,
    state: Option<RoutingState>,
    bindings: Arc<Bindings>,
    store: S,
}

impl<S: CallbackStore> InteractionContext<S> {
    pub fn new(
        interaction: Arc<Interaction>,
        event: Arc<InboundEvent>,
        state: Option<RoutingState>,
        bindings: Arc<Bindings>,
        store: S,
    ) -> Self {
        Self {
            interaction,
            event,
            state,
            bindings,
            store,
        }
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn event(&self) -> &InboundEvent {
        &self.event
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Routing state looked up for this invocation, if it was store-routed.
    pub fn state(&self) -> Option<&RoutingState> {
        self.state.as_ref()
    }

    pub fn command(&self) -> Option<&CommandInvocation> {
        match self.event.as_ref() {
            InboundEvent::Command(invocation) | InboundEvent::Autocomplete(invocation) => {
                Some(invocation)
            }
            _ => None,
        }
    }

    pub fn component(&self) -> Option<&ComponentData> {
        match self.event.as_ref() {
            InboundEvent::Component(data) => Some(data),
            _ => None,
        }
    }

    pub fn modal(&self) -> Option<&ModalSubmitData> {
        match self.event.as_ref() {
            InboundEvent::ModalSubmit(data) => Some(data),
            _ => None,
        }
    }

    /// Argument `name` of the invoked (sub)command.
    pub fn option(&self, name: &str) -> Option<&CommandOption> {
        leaf_options(&self.command()?.data.options)
            .iter()
            .find(|option| option.name == name)
    }

    pub fn string_option(&self, name: &str) -> Option<&str> {
        self.option(name)?.value.as_ref()?.as_str()
    }

    pub fn integer_option(&self, name: &str) -> Option<i64> {
        self.option(name)?.value.as_ref()?.as_i64()
    }

    pub fn boolean_option(&self, name: &str) -> Option<bool> {
        self.option(name)?.value.as_ref()?.as_bool()
    }

    /// The argument being typed during autocomplete.
    pub fn focused_option(&self) -> Option<&CommandOption> {
        leaf_options(&self.command()?.data.options)
            .iter()
            .find(|option| option.focused)
    }

    /// Persists routing state for a new managed component and returns the
    /// custom id to put on it.
    pub async fn register_component(
        &self,
        component_type: ComponentType,
        state: RoutingState,
    ) -> Result<String, HandlerError> {
        let token = RoutingToken::generate();
        let key = RoutingKey::component(component_type.as_raw(), token.clone());
        self.put(&key, state).await?;
        Ok(token.into_string())
    }

    /// Persists routing state for a new managed modal and returns its custom id.
    pub async fn register_modal(&self, state: RoutingState) -> Result<String, HandlerError> {
        let token = RoutingToken::generate();
        self.put(&RoutingKey::modal(token.clone()), state).await?;
        Ok(token.into_string())
    }

    async fn put(&self, key: &RoutingKey, state: RoutingState) -> Result<(), HandlerError> {
        self.store
            .put(key, state, self.bindings.state_ttl)
            .await
            .map_err(|e| HandlerError::Other(anyhow::Error::new(e)))
    }
}

/// Options of the innermost subcommand, or the top level if there is none.
fn leaf_options(options: &[CommandOption]) -> &[CommandOption] {
    match options.iter().find(|option| {
        matches!(
            option.option_type(),
            OptionType::Subcommand | OptionType::SubcommandGroup
        )
    }) {
        Some(nested) => leaf_options(&nested.options),
        None => options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::classify;
    use crate::store::MemoryCallbackStore;
    use serde_json::json;

    fn bindings() -> Arc<Bindings> {
        Arc::new(Bindings {
            application_id: "2".to_string(),
            environment: Environment::Dev,
            bot_token: None,
            development_guild_id: None,
            site_origin: None,
            state_ttl: Duration::from_secs(60),
        })
    }

    fn context(
        kind: u8,
        data: serde_json::Value,
        store: MemoryCallbackStore,
    ) -> InteractionContext<MemoryCallbackStore> {
        let body = serde_json::to_vec(&json!({
            "id": "1", "application_id": "2", "type": kind, "token": "tok", "data": data
        }))
        .unwrap();
        let (interaction, event) = classify(&body).unwrap();
        InteractionContext::new(Arc::new(interaction), Arc::new(event), None, bindings(), store)
    }

    #[test]
    fn test_options_of_nested_subcommand() {
        let ctx = context(
            2,
            json!({ "id": "9", "name": "backup", "options": [
                { "name": "schedule", "type": 2, "options": [
                    { "name": "create", "type": 1, "options": [
                        { "name": "cron", "type": 3, "value": "0 * * * *" },
                        { "name": "keep", "type": 4, "value": 7 },
                        { "name": "notify", "type": 5, "value": true }
                    ]}
                ]}
            ]}),
            MemoryCallbackStore::new(),
        );
        assert_eq!(ctx.string_option("cron"), Some("0 * * * *"));
        assert_eq!(ctx.integer_option("keep"), Some(7));
        assert_eq!(ctx.boolean_option("notify"), Some(true));
        assert_eq!(ctx.string_option("keep"), None);
        assert!(ctx.option("missing").is_none());
        assert!(ctx.component().is_none());
    }

    #[test]
    fn test_focused_option() {
        let ctx = context(
            4,
            json!({ "id": "9", "name": "faq", "options": [
                { "name": "tag", "type": 3, "value": "wel", "focused": true }
            ]}),
            MemoryCallbackStore::new(),
        );
        assert_eq!(ctx.focused_option().unwrap().name, "tag");
    }

    #[tokio::test]
    async fn register_component_writes_state_under_managed_token() {
        let store = MemoryCallbackStore::new();
        let ctx = context(
            2,
            json!({ "id": "9", "name": "info" }),
            store.clone(),
        );

        let custom_id = ctx
            .register_component(ComponentType::Button, RoutingState::new("dismiss").once())
            .await
            .unwrap();

        let token = RoutingToken::parse(&custom_id).unwrap();
        let key = RoutingKey::component(2, token);
        let state = store.get(&key).await.unwrap().unwrap();
        assert_eq!(state.routing_family, "dismiss");
        assert!(state.once);
    }

    #[tokio::test]
    async fn register_modal_writes_state_under_modal_key() {
        let store = MemoryCallbackStore::new();
        let ctx = context(2, json!({ "id": "9", "name": "info" }), store.clone());

        let custom_id = ctx.register_modal(RoutingState::new("rename")).await.unwrap();
        let key = RoutingKey::modal(RoutingToken::parse(&custom_id).unwrap());
        assert!(store.contains(&key));
    }
}
