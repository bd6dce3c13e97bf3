use {
    serde::{Deserialize, Serialize},
    tokio::sync::mpsc,
};

use crate::placeholder::Placeholders;

/// Something a running bee reports to the hive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Name of the bee instance that emitted the event.
    pub bee: String,
    pub name: String,
    #[serde(default)]
    pub options: Placeholders,
}

impl Event {
    pub fn new(bee: impl Into<String>, name: impl Into<String>, options: Placeholders) -> Self {
        Self {
            bee: bee.into(),
            name: name.into(),
            options,
        }
    }
}

/// A request the hive dispatches into one bee instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Name of the bee instance the action is for.
    pub bee: String,
    pub name: String,
    #[serde(default)]
    pub options: Placeholders,
}

impl Action {
    pub fn new(bee: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bee: bee.into(),
            name: name.into(),
            options: Placeholders::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: Placeholders) -> Self {
        self.options = options;
        self
    }
}

/// Sending end of the hive's event channel. Sends wait while the channel is
/// full, so a slow hive applies backpressure to emitting bees.
pub type EventSender = mpsc::Sender<Event>;

/// Receiving end of the hive's event channel.
pub type EventReceiver = mpsc::Receiver<Event>;

/// Create the bounded event channel shared by all bees of a hive.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(capacity.max(1))
}
