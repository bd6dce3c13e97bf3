use {
    hive_bees::BeeOptions,
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

/// Event channel capacity used when the config does not set one.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiveConfig {
    /// Capacity of the shared event channel. Bees wait when it is full.
    pub event_buffer: usize,
    pub bees: Vec<BeeConfig>,
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            event_buffer: DEFAULT_EVENT_BUFFER,
            bees: Vec::new(),
        }
    }
}

impl HiveConfig {
    pub fn bee(&self, name: &str) -> Option<&BeeConfig> {
        self.bees.iter().find(|b| b.name == name)
    }
}

/// One configured bee instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeeConfig {
    /// Instance name, unique within the hive.
    pub name: String,
    /// ID of the factory that builds the bee.
    pub class: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl BeeConfig {
    pub fn bee_options(&self) -> BeeOptions {
        self.options
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
