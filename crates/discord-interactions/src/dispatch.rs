//! Interaction dispatch: classify, route, invoke, reply.
//!
//! The dispatcher is the only place handler errors are caught. Every path
//! through [`Dispatcher::dispatch`] for a well-formed body ends in a
//! [`Reply`]; routing misses and handler failures become structured
//! `{"error": ...}` bodies rather than HTTP errors.

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod dispatch_tests;

use std::sync::Arc;

use discord_types::{ComponentData, Interaction, InteractionResponse, ModalSubmitData};
use tracing::{Span, error, field, instrument, warn};

use crate::context::{Bindings, InteractionContext};
use crate::errors::{DiscordErrorMessages, ErrorTranslator, HandlerError, UNLUCKY_ERROR};
use crate::event::{ClassifyError, CommandInvocation, InboundEvent, classify};
use crate::registry::{CommandLookup, Handler, HandlerRegistry};
use crate::reply::{Dispatched, Reply};
use crate::routing::{CustomIdRoute, RoutingKey, RoutingState};
use crate::store::CallbackStore;

pub const UNKNOWN_COMMAND: &str = "Unknown command";
pub const CANNOT_HANDLE_COMMAND: &str = "Cannot handle this command";
pub const UNKNOWN_COMPONENT: &str = "Unknown component";
pub const UNKNOWN_MODAL: &str = "Unknown modal";
pub const UNKNOWN_TYPE: &str = "Unknown Type";

#[derive(Debug, Clone, Copy)]
enum Routed {
    Component,
    Modal,
}

impl Routed {
    fn unknown(self) -> &'static str {
        match self {
            Self::Component => UNKNOWN_COMPONENT,
            Self::Modal => UNKNOWN_MODAL,
        }
    }
}

pub struct Dispatcher<S> {
    registry: Arc<HandlerRegistry<S>>,
    store: S,
    bindings: Arc<Bindings>,
    translator: Arc<dyn ErrorTranslator>,
}

impl<S: Clone> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            store: self.store.clone(),
            bindings: self.bindings.clone(),
            translator: self.translator.clone(),
        }
    }
}

impl<S: CallbackStore> Dispatcher<S> {
    pub fn new(registry: HandlerRegistry<S>, store: S, bindings: Bindings) -> Self {
        Self {
            registry: Arc::new(registry),
            store,
            bindings: Arc::new(bindings),
            translator: Arc::new(DiscordErrorMessages),
        }
    }

    pub fn with_translator(mut self, translator: impl ErrorTranslator) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Dispatches a verified request body.
    ///
    /// Only fails when the body is not an interaction at all.
    #[instrument(
        name = "interactions.dispatch",
        skip_all,
        fields(
            interaction_type = field::Empty,
            interaction_id = field::Empty,
            route = field::Empty,
        )
    )]
    pub async fn dispatch(&self, body: &[u8]) -> Result<Dispatched, ClassifyError> {
        let (interaction, event) = classify(body)?;

        let span = Span::current();
        span.record("interaction_type", event.kind());
        span.record("interaction_id", interaction.id.as_str());

        let interaction = Arc::new(interaction);
        let event = Arc::new(event);

        let dispatched = match event.as_ref() {
            InboundEvent::Ping => Dispatched::reply(InteractionResponse::pong()),
            InboundEvent::Command(invocation) => {
                self.command(&interaction, &event, invocation).await
            }
            InboundEvent::Autocomplete(invocation) => {
                self.autocomplete(&interaction, &event, invocation).await
            }
            InboundEvent::Component(data) => self.component(&interaction, &event, data).await,
            InboundEvent::ModalSubmit(data) => self.modal(&interaction, &event, data).await,
            InboundEvent::Unknown(raw) => {
                warn!(raw_type = raw, "Unknown interaction type");
                Dispatched::reply(Reply::error(UNKNOWN_TYPE))
            }
        };
        Ok(dispatched)
    }

    async fn command(
        &self,
        interaction: &Arc<Interaction>,
        event: &Arc<InboundEvent>,
        invocation: &CommandInvocation,
    ) -> Dispatched {
        Span::current().record("route", invocation.route().as_str());

        match self.registry.command(invocation) {
            CommandLookup::Found(handler) => {
                self.invoke(handler, interaction, event, None, None).await
            }
            CommandLookup::UnknownPath => {
                warn!("No handler for command path");
                Dispatched::reply(Reply::error(CANNOT_HANDLE_COMMAND))
            }
            CommandLookup::UnknownCommand => {
                warn!("Unknown command");
                Dispatched::reply(Reply::error(UNKNOWN_COMMAND))
            }
        }
    }

    async fn autocomplete(
        &self,
        interaction: &Arc<Interaction>,
        event: &Arc<InboundEvent>,
        invocation: &CommandInvocation,
    ) -> Dispatched {
        Span::current().record("route", invocation.route().as_str());

        let no_choices = || Dispatched::reply(InteractionResponse::autocomplete(Vec::new()));

        let Some(handler) = self.registry.autocomplete(invocation) else {
            return no_choices();
        };

        match handler(self.context(interaction, event, None)).await {
            Ok(choices) => Dispatched::reply(InteractionResponse::autocomplete(choices)),
            Err(e) => {
                error!(error = %e, "Autocomplete handler failed");
                no_choices()
            }
        }
    }

    async fn component(
        &self,
        interaction: &Arc<Interaction>,
        event: &Arc<InboundEvent>,
        data: &ComponentData,
    ) -> Dispatched {
        match CustomIdRoute::of(&data.custom_id) {
            CustomIdRoute::Managed(token) => {
                let key = RoutingKey::component(data.component_type, token);
                self.routed(interaction, event, key, Routed::Component).await
            }
            CustomIdRoute::Static(id) => {
                Span::current().record("route", id.name);
                match self.registry.static_component(id.name) {
                    Some(handler) => {
                        self.invoke(handler, interaction, event, None, None).await
                    }
                    None => {
                        warn!(custom_id = %data.custom_id, "No handler for static component");
                        Dispatched::reply(Reply::error(UNKNOWN_COMPONENT))
                    }
                }
            }
            CustomIdRoute::Unmanaged => {
                warn!(custom_id = %data.custom_id, "Unrouteable component");
                Dispatched::reply(Reply::error(UNKNOWN_COMPONENT))
            }
        }
    }

    async fn modal(
        &self,
        interaction: &Arc<Interaction>,
        event: &Arc<InboundEvent>,
        data: &ModalSubmitData,
    ) -> Dispatched {
        match CustomIdRoute::of(&data.custom_id) {
            CustomIdRoute::Managed(token) => {
                self.routed(interaction, event, RoutingKey::modal(token), Routed::Modal)
                    .await
            }
            CustomIdRoute::Static(id) => {
                Span::current().record("route", id.name);
                match self.registry.static_modal(id.name) {
                    Some(handler) => {
                        self.invoke(handler, interaction, event, None, None).await
                    }
                    None => {
                        warn!(custom_id = %data.custom_id, "No handler for static modal");
                        Dispatched::reply(Reply::error(UNKNOWN_MODAL))
                    }
                }
            }
            CustomIdRoute::Unmanaged => {
                warn!(custom_id = %data.custom_id, "Unrouteable modal");
                Dispatched::reply(Reply::error(UNKNOWN_MODAL))
            }
        }
    }

    /// Store-routed invocation of a managed component or modal.
    async fn routed(
        &self,
        interaction: &Arc<Interaction>,
        event: &Arc<InboundEvent>,
        key: RoutingKey,
        kind: Routed,
    ) -> Dispatched {
        let state = match self.store.get(&key).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                warn!(key = %key, "No routing state (expired or never issued)");
                return Dispatched::reply(Reply::error(kind.unknown()));
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to read routing state");
                return Dispatched::reply(Reply::error(UNLUCKY_ERROR));
            }
        };

        Span::current().record("route", state.routing_family.as_str());

        let handler = match kind {
            Routed::Component => self.registry.component_family(&state.routing_family),
            Routed::Modal => self.registry.modal_family(&state.routing_family),
        };
        let Some(handler) = handler else {
            warn!(key = %key, family = %state.routing_family, "Unknown routing family");
            return Dispatched::reply(Reply::error(kind.unknown()));
        };

        let cleanup = state.once.then(|| key.clone());
        self.invoke(handler, interaction, event, Some(state), cleanup)
            .await
    }

    /// Runs a handler. On success, deletes `cleanup` (best-effort) before the
    /// reply is built, so a failed delete never changes the reply.
    async fn invoke(
        &self,
        handler: &Handler<S>,
        interaction: &Arc<Interaction>,
        event: &Arc<InboundEvent>,
        state: Option<RoutingState>,
        cleanup: Option<RoutingKey>,
    ) -> Dispatched {
        match handler(self.context(interaction, event, state)).await {
            Ok(result) => {
                if let Some(key) = cleanup {
                    if let Err(e) = self.store.delete(&key).await {
                        warn!(key = %key, error = %e, "Failed to delete one-shot routing state");
                    }
                }
                let (response, deferred) = result.into_parts();
                Dispatched {
                    reply: response.into(),
                    deferred,
                }
            }
            Err(e) => Dispatched::reply(self.failure(interaction, e)),
        }
    }

    fn failure(&self, interaction: &Interaction, err: HandlerError) -> Reply {
        match err {
            HandlerError::Discord(api_error) => {
                if let Some(response) = self.translator.translate(interaction, &api_error) {
                    warn!(error = %api_error, "Handler hit a Discord API error");
                    return response.into();
                }
                error!(error = %api_error, "Handler failed with an untranslated Discord API error");
            }
            HandlerError::Other(e) => {
                error!(error = %e, "Handler failed");
            }
        }
        Reply::error(UNLUCKY_ERROR)
    }

    fn context(
        &self,
        interaction: &Arc<Interaction>,
        event: &Arc<InboundEvent>,
        state: Option<RoutingState>,
    ) -> InteractionContext<S> {
        InteractionContext::new(
            interaction.clone(),
            event.clone(),
            state,
            self.bindings.clone(),
            self.store.clone(),
        )
    }
}
