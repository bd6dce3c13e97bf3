use std::{collections::HashMap, sync::Arc};

use tracing::{debug, warn};

#[cfg(feature = "metrics")]
use metrics::gauge;

use crate::{
    error::{Error, Result},
    factory::BeeFactory,
};

/// Gauge of factories currently registered.
#[cfg(feature = "metrics")]
pub const FACTORIES_REGISTERED: &str = "hive_factories_registered";

/// Every known bee factory, keyed by ID.
///
/// Filled through `&mut self` during start-up, then typically wrapped in an
/// `Arc` and only read from. Registering an ID twice replaces the earlier
/// factory.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: HashMap<String, Arc<dyn BeeFactory>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Arc<dyn BeeFactory>) {
        let id = factory.id().to_string();
        debug!(factory = %id, name = factory.name(), "registering bee factory");
        if self.factories.insert(id.clone(), factory).is_some() {
            warn!(factory = %id, "bee factory registered twice, replacing");
        }
        #[cfg(feature = "metrics")]
        gauge!(FACTORIES_REGISTERED).set(self.factories.len() as f64);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn BeeFactory>> {
        self.factories.get(id).cloned()
    }

    /// Like [`FactoryRegistry::get`], failing with [`Error::UnknownFactory`].
    pub fn try_get(&self, id: &str) -> Result<Arc<dyn BeeFactory>> {
        self.get(id).ok_or_else(|| Error::unknown_factory(id))
    }

    /// All factories, sorted by ID.
    pub fn factories(&self) -> Vec<Arc<dyn BeeFactory>> {
        let mut all: Vec<_> = self.factories.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("factories", &self.ids())
            .finish()
    }
}
