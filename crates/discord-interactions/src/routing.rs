//! Routing tokens, store keys and persisted routing state for components
//! and modals.
//!
//! A component or modal whose handler needs state gets a *managed* custom id
//! (`t_` + random hex). The id itself says nothing about the handler; the
//! store entry under its [`RoutingKey`] names the handler family and carries
//! the caller's payload. Custom ids without the managed prefix never reach
//! the store. Those following the `a_{name}_{data}` convention are routed by
//! `name` alone.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Prefix marking a custom id as a managed routing token.
pub const MANAGED_PREFIX: &str = "t_";
/// Prefix of static custom ids routed by name.
pub const STATIC_PREFIX: &str = "a_";

/// An opaque, store-backed custom id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingToken(String);

impl RoutingToken {
    pub fn generate() -> Self {
        Self(format!("{MANAGED_PREFIX}{}", Uuid::new_v4().simple()))
    }

    /// Returns `None` unless `custom_id` carries the managed prefix.
    pub fn parse(custom_id: &str) -> Option<Self> {
        custom_id
            .starts_with(MANAGED_PREFIX)
            .then(|| Self(custom_id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RoutingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A static custom id, `a_{name}_{data}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticId<'a> {
    pub name: &'a str,
    pub data: &'a str,
}

impl<'a> StaticId<'a> {
    pub fn parse(custom_id: &'a str) -> Option<Self> {
        let rest = custom_id.strip_prefix(STATIC_PREFIX)?;
        let (name, data) = rest.split_once('_').unwrap_or((rest, ""));
        (!name.is_empty()).then_some(Self { name, data })
    }

    pub fn format(name: &str, data: &str) -> String {
        format!("{STATIC_PREFIX}{name}_{data}")
    }
}

/// How a component or modal custom id is routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomIdRoute<'a> {
    Managed(RoutingToken),
    Static(StaticId<'a>),
    Unmanaged,
}

impl<'a> CustomIdRoute<'a> {
    pub fn of(custom_id: &'a str) -> Self {
        if let Some(token) = RoutingToken::parse(custom_id) {
            Self::Managed(token)
        } else if let Some(id) = StaticId::parse(custom_id) {
            Self::Static(id)
        } else {
            Self::Unmanaged
        }
    }
}

/// Store key of a routing state entry.
///
/// Component keys include the component type since two kinds of component
/// may share a custom id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutingKey {
    Component { component_type: u8, token: RoutingToken },
    Modal { token: RoutingToken },
}

impl RoutingKey {
    pub fn component(component_type: u8, token: RoutingToken) -> Self {
        Self::Component {
            component_type,
            token,
        }
    }

    pub fn modal(token: RoutingToken) -> Self {
        Self::Modal { token }
    }

    pub fn token(&self) -> &RoutingToken {
        match self {
            Self::Component { token, .. } | Self::Modal { token } => token,
        }
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component {
                component_type,
                token,
            } => write!(f, "component-{component_type}-{token}"),
            Self::Modal { token } => write!(f, "modal-{token}"),
        }
    }
}

/// Persisted routing metadata for one managed token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingState {
    /// Handler family to invoke.
    #[serde(rename = "componentRoutingId")]
    pub routing_family: String,
    /// Delete the entry after the first successful invocation.
    #[serde(rename = "componentOnce", default)]
    pub once: bool,
    /// Unix seconds after which the entry reads as absent. Set by the store.
    #[serde(rename = "expiresAt", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    /// Caller-defined fields, stored beside the routing fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl RoutingState {
    pub fn new(routing_family: impl Into<String>) -> Self {
        Self {
            routing_family: routing_family.into(),
            once: false,
            expires_at: None,
            payload: Map::new(),
        }
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Payload must serialise to a JSON object; anything else is dropped.
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        if let Value::Object(fields) = serde_json::to_value(payload)? {
            self.payload = fields;
        }
        Ok(self)
    }

    /// Reads the payload back into a caller type.
    pub fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.payload.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_tokens_are_managed_and_unique() {
        let a = RoutingToken::generate();
        let b = RoutingToken::generate();
        assert!(a.as_str().starts_with("t_"));
        assert_eq!(a.as_str().len(), 34);
        assert_ne!(a, b);
        assert_eq!(RoutingToken::parse(a.as_str()), Some(a));
    }

    #[test]
    fn test_custom_id_routes() {
        assert!(matches!(CustomIdRoute::of("t_abc"), CustomIdRoute::Managed(_)));
        assert_eq!(
            CustomIdRoute::of("a_poll-vote_3"),
            CustomIdRoute::Static(StaticId {
                name: "poll-vote",
                data: "3"
            })
        );
        assert_eq!(
            CustomIdRoute::of("a_refresh"),
            CustomIdRoute::Static(StaticId {
                name: "refresh",
                data: ""
            })
        );
        assert_eq!(CustomIdRoute::of("a__x"), CustomIdRoute::Unmanaged);
        assert_eq!(CustomIdRoute::of("plain"), CustomIdRoute::Unmanaged);
    }

    #[test]
    fn test_static_id_format_parses_back() {
        let id = StaticId::format("poll-vote", "3_extra");
        let parsed = StaticId::parse(&id).unwrap();
        assert_eq!(parsed.name, "poll-vote");
        assert_eq!(parsed.data, "3_extra");
    }

    #[test]
    fn test_key_format() {
        let token = RoutingToken::parse("t_abc").unwrap();
        assert_eq!(
            RoutingKey::component(2, token.clone()).to_string(),
            "component-2-t_abc"
        );
        assert_eq!(RoutingKey::modal(token).to_string(), "modal-t_abc");
    }

    #[test]
    fn test_state_wire_shape() {
        let state = RoutingState::new("dismiss")
            .once()
            .with_payload(&json!({ "messageId": "42" }))
            .unwrap();
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({ "componentRoutingId": "dismiss", "componentOnce": true, "messageId": "42" })
        );

        let read: RoutingState = serde_json::from_value(json!({
            "componentRoutingId": "edit-flow",
            "expiresAt": 1700000000u64,
            "flowId": 7
        }))
        .unwrap();
        assert!(!read.once);
        assert_eq!(read.expires_at, Some(1_700_000_000));
        assert_eq!(read.payload.get("flowId"), Some(&json!(7)));
        assert!(!read.payload.contains_key("expiresAt"));
    }

    #[test]
    fn test_typed_payload() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Edit {
            flow_id: u64,
        }
        let state = RoutingState::new("edit").with_payload(&Edit { flow_id: 9 }).unwrap();
        assert_eq!(state.payload::<Edit>().unwrap(), Edit { flow_id: 9 });
    }
}
