//! Declarative capability descriptors.
//!
//! Descriptors advertise what a factory's bees accept and produce. Nothing
//! enforces them at runtime; each bee is responsible for matching its own
//! declaration.

use serde::{Deserialize, Serialize};

use crate::placeholder::PlaceholderType;

/// One named, typed field an event, action or state will carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PlaceholderType,
}

impl PlaceholderDescriptor {
    pub fn new(name: &str, description: &str, kind: PlaceholderType) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
        }
    }
}

/// A configuration knob accepted by a factory's bees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeeOptionDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PlaceholderType,
    /// Value used when the option is not configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub mandatory: bool,
}

impl BeeOptionDescriptor {
    pub fn new(name: &str, description: &str, kind: PlaceholderType) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            default: None,
            mandatory: false,
        }
    }

    #[must_use]
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<serde_json::Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A piece of state a bee exposes. Structured state lists its fields in
/// `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PlaceholderType,
    #[serde(default)]
    pub options: Vec<PlaceholderDescriptor>,
}

/// An event a bee may emit, with the placeholders each event carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    /// ID of the factory whose bees emit this event.
    pub namespace: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub options: Vec<PlaceholderDescriptor>,
}

/// An action a bee accepts, with the placeholders it expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// ID of the factory whose bees accept this action.
    pub namespace: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub options: Vec<PlaceholderDescriptor>,
}
