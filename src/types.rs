//! Plan, import and metadata types exchanged with the host.
//!
//! These wrap the protobuf messages so resource code can work with
//! `serde_json::Value` instead of JSON-encoded byte strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A change to a single top-level attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The attribute name.
    pub path: String,
    /// Value before the change; `None` when the attribute was unset.
    pub before: Option<Value>,
    /// Value after the change; `None` when the attribute becomes unset.
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create an attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }
}

fn decode_value(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(bytes).ok()
    }
}

fn encode_value(value: Option<Value>) -> Vec<u8> {
    value
        .and_then(|v| serde_json::to_vec(&v).ok())
        .unwrap_or_default()
}

impl From<crate::generated::AttributeChange> for AttributeChange {
    fn from(proto: crate::generated::AttributeChange) -> Self {
        Self {
            before: decode_value(&proto.before),
            after: decode_value(&proto.after),
            path: proto.path,
        }
    }
}

impl From<AttributeChange> for crate::generated::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        Self {
            path: change.path,
            before: encode_value(change.before),
            after: encode_value(change.after),
        }
    }
}

/// The result of planning a resource change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The state the resource will have once applied.
    pub planned_state: Value,
    /// Attributes that differ from the prior state.
    pub changes: Vec<AttributeChange>,
    /// Whether applying the plan destroys and recreates the resource.
    pub requires_replace: bool,
}

impl PlanResult {
    /// A plan that leaves the resource as it is.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// A plan with the given changes.
    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// Whether applying the plan does anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// A resource adopted by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The full state read from the API.
    pub state: Value,
}

impl ImportedResource {
    /// Create an imported resource.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata returned by GetMetadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
}

/// Server capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Whether the provider wants to be asked to plan destroys.
    pub plan_destroy: bool,
}

/// The protocol version announced in the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// The first field of the handshake line.
pub const HANDSHAKE_PREFIX: &str = "FOLGE_PROVIDER";
