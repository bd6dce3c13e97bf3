use std::sync::{OnceLock, RwLock};

use {async_trait::async_trait, tracing::debug};

use crate::{
    error::{Error, Result},
    event::{Action, Event, EventSender},
    options::BeeOptions,
    placeholder::Placeholders,
};

/// A running module instance.
///
/// All methods take `&self`; a bee guards its own mutable state so the hive
/// can call [`Bee::action`] while [`Bee::reload_options`] or a background
/// task spawned from [`Bee::run`] is in flight.
#[async_trait]
pub trait Bee: Send + Sync {
    /// Instance name, unique within a hive. Every emitted event carries it.
    fn name(&self) -> &str;

    /// ID of the factory that built this bee.
    fn namespace(&self) -> &str;

    fn description(&self) -> &str;

    /// Apply a new configuration. Called once before [`Bee::run`] and again
    /// whenever the configuration changes.
    async fn reload_options(&self, options: BeeOptions) -> Result<()>;

    /// Start the bee. The sender is the only channel the bee may emit on for
    /// the rest of its life.
    async fn run(&self, events: EventSender) -> Result<()>;

    /// Perform one action. Fails with [`Error::UnknownAction`] for names the
    /// factory does not declare.
    async fn action(&self, action: Action) -> Result<Placeholders>;
}

/// Shared plumbing for bee implementations: identity, the current options
/// and the event channel handed over by [`Bee::run`].
#[derive(Debug)]
pub struct BeeBase {
    name: String,
    namespace: String,
    description: String,
    options: RwLock<BeeOptions>,
    events: OnceLock<EventSender>,
}

impl BeeBase {
    pub fn new(name: &str, namespace: &str, description: &str, options: BeeOptions) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            description: description.to_string(),
            options: RwLock::new(options),
            events: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Snapshot of the current options.
    pub fn options(&self) -> BeeOptions {
        self.options
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_options(&self, options: BeeOptions) {
        *self
            .options
            .write()
            .unwrap_or_else(|e| e.into_inner()) = options;
    }

    /// Keep the event channel for the rest of the bee's life. A second call
    /// fails and the first channel stays in place.
    pub fn attach(&self, events: EventSender) -> Result<()> {
        self.events
            .set(events)
            .map_err(|_| Error::already_running(&self.name))?;
        debug!(bee = %self.name, namespace = %self.namespace, "bee attached to event channel");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.events.get().is_some()
    }

    /// True once the hive dropped the receiving end of the attached channel.
    pub fn is_closed(&self) -> bool {
        self.events.get().is_some_and(|tx| tx.is_closed())
    }

    /// Emit an event stamped with this bee's name. Waits while the channel
    /// is full.
    pub async fn emit(&self, name: &str, options: Placeholders) -> Result<()> {
        let sender = self
            .events
            .get()
            .ok_or_else(|| Error::not_running(&self.name))?;
        sender
            .send(Event::new(self.name.as_str(), name, options))
            .await
            .map_err(|_| Error::channel_closed(&self.name))
    }

    /// The error every bee returns for an action it does not declare.
    pub fn unknown_action(&self, action: &Action) -> Error {
        Error::unknown_action(&self.name, &action.name)
    }
}
