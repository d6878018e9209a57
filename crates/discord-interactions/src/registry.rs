//! Handler registry.
//!
//! Built once at startup with [`HandlerRegistryBuilder`] and read-only after
//! that. Commands are keyed by `(command type, lowercase name, qualified
//! path)`; autocomplete handlers live in their own namespace under the same
//! key. Managed components and modals are keyed by routing family, static
//! ones by the `name` in `a_{name}_{data}`.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use discord_types::{AutocompleteChoice, CommandType};
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::warn;

use crate::context::InteractionContext;
use crate::errors::HandlerError;
use crate::event::CommandInvocation;
use crate::path::QualifiedPath;
use crate::reply::HandlerResult;

/// Handler for commands, components and modals.
pub type Handler<S> = Arc<
    dyn Fn(InteractionContext<S>) -> BoxFuture<'static, Result<HandlerResult, HandlerError>>
        + Send
        + Sync,
>;

/// Handler producing autocomplete suggestions.
pub type AutocompleteHandler<S> = Arc<
    dyn Fn(InteractionContext<S>) -> BoxFuture<'static, Result<Vec<AutocompleteChoice>, HandlerError>>
        + Send
        + Sync,
>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CommandKey {
    command_type: CommandType,
    name: String,
    path: QualifiedPath,
}

impl CommandKey {
    fn new(command_type: CommandType, name: &str, path: QualifiedPath) -> Self {
        Self {
            command_type,
            name: name.to_lowercase(),
            path,
        }
    }

    fn of(invocation: &CommandInvocation) -> Self {
        Self::new(
            invocation.command_type,
            &invocation.name,
            invocation.path.clone(),
        )
    }
}

/// Result of looking up a command handler.
pub enum CommandLookup<'a, S> {
    Found(&'a Handler<S>),
    /// The command is registered, but not under this path.
    UnknownPath,
    UnknownCommand,
}

pub struct HandlerRegistry<S> {
    known_commands: HashSet<(CommandType, String)>,
    commands: HashMap<CommandKey, Handler<S>>,
    autocomplete: HashMap<CommandKey, AutocompleteHandler<S>>,
    component_families: HashMap<String, Handler<S>>,
    modal_families: HashMap<String, Handler<S>>,
    static_components: HashMap<String, Handler<S>>,
    static_modals: HashMap<String, Handler<S>>,
}

impl<S> HandlerRegistry<S> {
    pub fn builder() -> HandlerRegistryBuilder<S> {
        HandlerRegistryBuilder::default()
    }

    pub fn command(&self, invocation: &CommandInvocation) -> CommandLookup<'_, S> {
        if let Some(handler) = self.commands.get(&CommandKey::of(invocation)) {
            return CommandLookup::Found(handler);
        }
        if self
            .known_commands
            .contains(&(invocation.command_type, invocation.name.clone()))
        {
            CommandLookup::UnknownPath
        } else {
            CommandLookup::UnknownCommand
        }
    }

    pub fn autocomplete(&self, invocation: &CommandInvocation) -> Option<&AutocompleteHandler<S>> {
        self.autocomplete.get(&CommandKey::of(invocation))
    }

    pub fn component_family(&self, family: &str) -> Option<&Handler<S>> {
        self.component_families.get(family)
    }

    pub fn modal_family(&self, family: &str) -> Option<&Handler<S>> {
        self.modal_families.get(family)
    }

    pub fn static_component(&self, name: &str) -> Option<&Handler<S>> {
        self.static_components.get(name)
    }

    pub fn static_modal(&self, name: &str) -> Option<&Handler<S>> {
        self.static_modals.get(name)
    }

    /// Number of registered command handlers, across all paths.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

pub struct HandlerRegistryBuilder<S> {
    registry: HandlerRegistry<S>,
}

impl<S> Default for HandlerRegistryBuilder<S> {
    fn default() -> Self {
        Self {
            registry: HandlerRegistry {
                known_commands: HashSet::new(),
                commands: HashMap::new(),
                autocomplete: HashMap::new(),
                component_families: HashMap::new(),
                modal_families: HashMap::new(),
                static_components: HashMap::new(),
                static_modals: HashMap::new(),
            },
        }
    }
}

fn boxed<S: 'static, F, Fut>(handler: F) -> Handler<S>
where
    F: Fn(InteractionContext<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerResult, HandlerError>> + Send + 'static,
{
    Arc::new(move |ctx: InteractionContext<S>| handler(ctx).boxed())
}

fn insert<K: Hash + Eq, V>(map: &mut HashMap<K, V>, key: K, value: V, what: &'static str) {
    if map.insert(key, value).is_some() {
        warn!(what, "Handler registered twice; keeping the last one");
    }
}

impl<S: 'static> HandlerRegistryBuilder<S> {
    /// Registers a command handler under `path` (`"BASE"` or `""` for the
    /// command itself, `"set"`, `"schedule create"`, ...).
    pub fn command<F, Fut>(
        mut self,
        command_type: CommandType,
        name: &str,
        path: &str,
        handler: F,
    ) -> Self
    where
        F: Fn(InteractionContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerResult, HandlerError>> + Send + 'static,
    {
        let key = CommandKey::new(command_type, name, QualifiedPath::new(path));
        self.registry
            .known_commands
            .insert((key.command_type, key.name.clone()));
        insert(&mut self.registry.commands, key, boxed(handler), "command");
        self
    }

    /// Shorthand for a chat-input (slash) command.
    pub fn chat_command<F, Fut>(self, name: &str, path: &str, handler: F) -> Self
    where
        F: Fn(InteractionContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerResult, HandlerError>> + Send + 'static,
    {
        self.command(CommandType::ChatInput, name, path, handler)
    }

    pub fn autocomplete<F, Fut>(
        mut self,
        command_type: CommandType,
        name: &str,
        path: &str,
        handler: F,
    ) -> Self
    where
        F: Fn(InteractionContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<AutocompleteChoice>, HandlerError>> + Send + 'static,
    {
        let key = CommandKey::new(command_type, name, QualifiedPath::new(path));
        let handler: AutocompleteHandler<S> =
            Arc::new(move |ctx: InteractionContext<S>| handler(ctx).boxed());
        insert(&mut self.registry.autocomplete, key, handler, "autocomplete");
        self
    }

    /// Handler family for managed components, selected by routing state.
    pub fn component<F, Fut>(mut self, family: &str, handler: F) -> Self
    where
        F: Fn(InteractionContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerResult, HandlerError>> + Send + 'static,
    {
        insert(
            &mut self.registry.component_families,
            family.to_string(),
            boxed(handler),
            "component",
        );
        self
    }

    /// Handler family for managed modals, selected by routing state.
    pub fn modal<F, Fut>(mut self, family: &str, handler: F) -> Self
    where
        F: Fn(InteractionContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerResult, HandlerError>> + Send + 'static,
    {
        insert(
            &mut self.registry.modal_families,
            family.to_string(),
            boxed(handler),
            "modal",
        );
        self
    }

    /// Handler for static component ids `a_{name}_{data}`.
    pub fn static_component<F, Fut>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(InteractionContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerResult, HandlerError>> + Send + 'static,
    {
        insert(
            &mut self.registry.static_components,
            name.to_string(),
            boxed(handler),
            "static component",
        );
        self
    }

    /// Handler for static modal ids `a_{name}_{data}`.
    pub fn static_modal<F, Fut>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(InteractionContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerResult, HandlerError>> + Send + 'static,
    {
        insert(
            &mut self.registry.static_modals,
            name.to_string(),
            boxed(handler),
            "static modal",
        );
        self
    }

    pub fn build(self) -> HandlerRegistry<S> {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{InboundEvent, classify};
    use crate::store::MemoryCallbackStore;
    use discord_types::InteractionResponse;

    type Registry = HandlerRegistry<MemoryCallbackStore>;

    async fn pong(_: InteractionContext<MemoryCallbackStore>) -> Result<HandlerResult, HandlerError> {
        Ok(InteractionResponse::pong().into())
    }

    fn invocation(command_type: u8, name: &str, options: serde_json::Value) -> CommandInvocation {
        let body = serde_json::to_vec(&serde_json::json!({
            "id": "1", "application_id": "2", "type": 2, "token": "tok",
            "data": { "id": "9", "name": name, "type": command_type, "options": options }
        }))
        .unwrap();
        match classify(&body).unwrap().1 {
            InboundEvent::Command(invocation) => invocation,
            other => panic!("unexpected event {other:?}"),
        }
    }

    fn registry() -> Registry {
        HandlerRegistry::builder()
            .chat_command("Welcomer", "set", pong)
            .chat_command("info", "BASE", pong)
            .command(CommandType::Message, "quote", "", pong)
            .autocomplete(CommandType::ChatInput, "welcomer", "set", |_| async {
                Ok(vec![AutocompleteChoice::new("general", "1")])
            })
            .component("dismiss", pong)
            .static_component("refresh", pong)
            .modal("rename", pong)
            .build()
    }

    #[test]
    fn test_command_lookup_by_path() {
        let registry = registry();
        let set = invocation(1, "welcomer", serde_json::json!([{ "name": "set", "type": 1 }]));
        assert!(matches!(registry.command(&set), CommandLookup::Found(_)));

        let unset = invocation(1, "welcomer", serde_json::json!([{ "name": "unset", "type": 1 }]));
        assert!(matches!(registry.command(&unset), CommandLookup::UnknownPath));

        let base = invocation(1, "welcomer", serde_json::json!([]));
        assert!(matches!(registry.command(&base), CommandLookup::UnknownPath));

        let other = invocation(1, "backup", serde_json::json!([]));
        assert!(matches!(registry.command(&other), CommandLookup::UnknownCommand));
    }

    #[test]
    fn test_command_type_is_part_of_the_key() {
        let registry = registry();
        assert!(matches!(
            registry.command(&invocation(3, "quote", serde_json::json!([]))),
            CommandLookup::Found(_)
        ));
        assert!(matches!(
            registry.command(&invocation(1, "quote", serde_json::json!([]))),
            CommandLookup::UnknownCommand
        ));
    }

    #[test]
    fn test_autocomplete_namespace_is_separate() {
        let registry = registry();
        let set = invocation(1, "welcomer", serde_json::json!([{ "name": "set", "type": 1 }]));
        assert!(registry.autocomplete(&set).is_some());
        let info = invocation(1, "info", serde_json::json!([]));
        assert!(registry.autocomplete(&info).is_none());
    }

    #[test]
    fn test_families_and_static_names() {
        let registry = registry();
        assert!(registry.component_family("dismiss").is_some());
        assert!(registry.component_family("rename").is_none());
        assert!(registry.modal_family("rename").is_some());
        assert!(registry.static_component("refresh").is_some());
        assert!(registry.static_modal("refresh").is_none());
        assert_eq!(registry.command_count(), 3);
    }
}
