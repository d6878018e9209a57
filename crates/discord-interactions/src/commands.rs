//! Built-in handlers.

use discord_interactions::context::InteractionContext;
use discord_interactions::errors::HandlerError;
use discord_interactions::registry::HandlerRegistryBuilder;
use discord_interactions::reply::HandlerResult;
use discord_interactions::routing::RoutingState;
use discord_interactions::store::CallbackStore;
use discord_types::{ComponentType, InteractionResponse, MessageData};
use serde_json::json;

pub const DISMISS_FAMILY: &str = "dismiss";

/// Button style `Secondary`.
const SECONDARY: u8 = 2;

pub fn register<S: CallbackStore>(builder: HandlerRegistryBuilder<S>) -> HandlerRegistryBuilder<S> {
    builder
        .chat_command("info", "BASE", info::<S>)
        .component(DISMISS_FAMILY, dismiss::<S>)
}

/// `/info`: where this deployment runs, with a one-shot dismiss button.
async fn info<S: CallbackStore>(ctx: InteractionContext<S>) -> Result<HandlerResult, HandlerError> {
    let custom_id = ctx
        .register_component(
            ComponentType::Button,
            RoutingState::new(DISMISS_FAMILY).once(),
        )
        .await?;

    let bindings = ctx.bindings();
    let content = format!(
        "Application `{}` running in `{}`.",
        bindings.application_id,
        bindings.environment.as_str()
    );
    let row = json!({
        "type": ComponentType::ActionRow.as_raw(),
        "components": [{
            "type": ComponentType::Button.as_raw(),
            "style": SECONDARY,
            "label": "Dismiss",
            "custom_id": custom_id,
        }]
    });

    Ok(InteractionResponse::message(
        MessageData::content(content)
            .ephemeral()
            .with_components(vec![row]),
    )
    .into())
}

async fn dismiss<S: CallbackStore>(
    _ctx: InteractionContext<S>,
) -> Result<HandlerResult, HandlerError> {
    Ok(InteractionResponse::update_message(
        MessageData::content("Dismissed.").with_components(Vec::new()),
    )
    .into())
}
