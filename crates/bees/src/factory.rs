use std::sync::Arc;

use {
    async_trait::async_trait,
    hive_oauth::OAuthTokens,
    serde::Serialize,
};

use crate::{
    bee::Bee,
    descriptor::{ActionDescriptor, BeeOptionDescriptor, EventDescriptor, StateDescriptor},
    error::{Error, Result},
    options::BeeOptions,
};

/// Logo color reported by factories that do not pick their own.
pub const DEFAULT_LOGO_COLOR: &str = "#010000";

/// Constructs bees and advertises their capabilities.
///
/// Only identity and construction are required. The provided methods are
/// the documented defaults (no image, [`DEFAULT_LOGO_COLOR`], no OAuth2,
/// empty descriptor lists); a factory overrides just what differs.
///
/// A factory owns no runtime state and its descriptors must not change for
/// the life of the process.
#[async_trait]
pub trait BeeFactory: Send + Sync {
    /// Globally unique, stable identifier. Registry key and namespace of the
    /// factory's events and actions.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Image file name or URL shown next to the factory. Empty by default.
    fn image(&self) -> &str {
        ""
    }

    fn logo_color(&self) -> &str {
        DEFAULT_LOGO_COLOR
    }

    /// Exchange an OAuth2 authorization code for tokens.
    ///
    /// Factories without an OAuth2-protected service keep this default,
    /// which always fails with [`Error::Unsupported`].
    async fn oauth2_access_token(
        &self,
        _client_id: &str,
        _client_secret: &str,
        _code: &str,
    ) -> Result<OAuthTokens> {
        Err(Error::unsupported(format!(
            "factory {} does not implement OAuth2",
            self.id()
        )))
    }

    /// Options the factory's bees accept.
    fn options(&self) -> Vec<BeeOptionDescriptor> {
        Vec::new()
    }

    /// States the factory's bees expose.
    fn states(&self) -> Vec<StateDescriptor> {
        Vec::new()
    }

    /// Events the factory's bees emit.
    fn events(&self) -> Vec<EventDescriptor> {
        Vec::new()
    }

    /// Actions the factory's bees accept.
    fn actions(&self) -> Vec<ActionDescriptor> {
        Vec::new()
    }

    /// Construct one bee. Must not start any background work; that only
    /// happens once the hive calls [`Bee::run`].
    fn new_bee(&self, name: &str, description: &str, options: BeeOptions) -> Arc<dyn Bee>;
}

/// Serializable snapshot of a factory's metadata and descriptors.
#[derive(Debug, Clone, Serialize)]
pub struct FactoryInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub logo_color: String,
    pub options: Vec<BeeOptionDescriptor>,
    pub states: Vec<StateDescriptor>,
    pub events: Vec<EventDescriptor>,
    pub actions: Vec<ActionDescriptor>,
}

impl FactoryInfo {
    pub fn from_factory(factory: &dyn BeeFactory) -> Self {
        Self {
            id: factory.id().to_string(),
            name: factory.name().to_string(),
            description: factory.description().to_string(),
            image: factory.image().to_string(),
            logo_color: factory.logo_color().to_string(),
            options: factory.options(),
            states: factory.states(),
            events: factory.events(),
            actions: factory.actions(),
        }
    }
}
