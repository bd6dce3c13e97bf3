//! The hive: owns the factory registry, the running bees and the receiving
//! end of their shared event channel.

pub mod error;
pub mod hive;
pub mod pump;

use std::sync::Arc;

use hive_bees::FactoryRegistry;

pub use {
    error::{Error, Result},
    hive::Hive,
    pump::{EventHandler, EventPump, LogHandler},
};

#[cfg(feature = "metrics")]
pub mod hive_metrics {
    pub const EVENTS_TOTAL: &str = "hive_events_total";
    pub const ACTIONS_TOTAL: &str = "hive_actions_total";
    pub const ACTION_ERRORS_TOTAL: &str = "hive_action_errors_total";
}

/// Registry with every factory shipped in this workspace.
pub fn builtin_registry() -> FactoryRegistry {
    let mut registry = FactoryRegistry::new();
    registry.register(Arc::new(hive_mixcloud::MixcloudFactory));
    registry
}
