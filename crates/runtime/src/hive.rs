use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use {
    hive_bees::{
        Action, Bee, BeeOptions, EventReceiver, EventSender, FactoryRegistry, OptionIssue,
        Placeholders, event_channel,
    },
    hive_config::{BeeConfig, HiveConfig},
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use {crate::hive_metrics, metrics::counter};

use crate::error::{Error, Result};

/// Running bees plus the sending half of their event channel.
///
/// Bees are started one by one; a name can only be taken once. Actions are
/// dispatched by bee name and may run concurrently with each other.
pub struct Hive {
    registry: Arc<FactoryRegistry>,
    bees: RwLock<HashMap<String, Arc<dyn Bee>>>,
    events: EventSender,
}

impl Hive {
    /// Create a hive and the receiver every started bee will emit to.
    pub fn new(registry: Arc<FactoryRegistry>, capacity: usize) -> (Self, EventReceiver) {
        let (events, rx) = event_channel(capacity);
        let hive = Self {
            registry,
            bees: RwLock::new(HashMap::new()),
            events,
        };
        (hive, rx)
    }

    pub fn from_config(registry: Arc<FactoryRegistry>, config: &HiveConfig) -> (Self, EventReceiver) {
        Self::new(registry, config.event_buffer)
    }

    pub fn registry(&self) -> &FactoryRegistry {
        &self.registry
    }

    /// Build, configure and run one bee.
    ///
    /// Declared defaults fill options the config leaves out. A missing
    /// mandatory option fails the start; unknown or mistyped options are
    /// logged and left for the bee to deal with.
    pub async fn start_bee(&self, config: &BeeConfig) -> Result<Arc<dyn Bee>> {
        if self.bee(&config.name).is_some() {
            return Err(Error::duplicate_bee(&config.name));
        }
        let factory = self.registry.try_get(&config.class)?;
        let descriptors = factory.options();
        let options = config.bee_options().with_defaults(&descriptors);
        for issue in options.check(&descriptors) {
            match issue {
                OptionIssue::Missing { name } => {
                    return Err(Error::MissingOption {
                        bee: config.name.clone(),
                        option: name,
                    });
                },
                issue => warn!(bee = %config.name, factory = %config.class, %issue, "bee option issue"),
            }
        }

        let bee = factory.new_bee(&config.name, &config.description, options.clone());
        bee.reload_options(options).await?;

        {
            let mut bees = self.bees.write().unwrap_or_else(|e| e.into_inner());
            if bees.contains_key(&config.name) {
                return Err(Error::duplicate_bee(&config.name));
            }
            bees.insert(config.name.clone(), Arc::clone(&bee));
        }
        if let Err(e) = bee.run(self.events.clone()).await {
            self.bees
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&config.name);
            return Err(e.into());
        }

        info!(bee = %config.name, factory = %config.class, "bee started");
        Ok(bee)
    }

    /// Start every configured bee, stopping at the first failure.
    pub async fn start_all(&self, config: &HiveConfig) -> Result<usize> {
        for bee in &config.bees {
            self.start_bee(bee).await?;
        }
        Ok(config.bees.len())
    }

    pub fn bee(&self, name: &str) -> Option<Arc<dyn Bee>> {
        self.bees
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Names of all running bees, sorted.
    pub fn bee_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .bees
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Hand a running bee new options, with declared defaults applied.
    pub async fn reload_bee(&self, name: &str, options: BeeOptions) -> Result<()> {
        let bee = self.bee(name).ok_or_else(|| Error::unknown_bee(name))?;
        let factory = self.registry.try_get(bee.namespace())?;
        let options = options.with_defaults(&factory.options());
        bee.reload_options(options).await?;
        debug!(bee = name, "bee options reloaded");
        Ok(())
    }

    /// Run one action on the bee it names.
    ///
    /// An action the bee does not declare aborts the dispatch with a contract
    /// violation; it is logged at error level and never retried.
    pub async fn dispatch(&self, action: Action) -> Result<Placeholders> {
        let bee = self
            .bee(&action.bee)
            .ok_or_else(|| Error::unknown_bee(&action.bee))?;
        let bee_name = action.bee.clone();
        let action_name = action.name.clone();

        #[cfg(feature = "metrics")]
        counter!(hive_metrics::ACTIONS_TOTAL).increment(1);

        debug!(bee = %bee_name, action = %action_name, "dispatching action");
        match bee.action(action).await {
            Ok(out) => Ok(out),
            Err(e) => {
                #[cfg(feature = "metrics")]
                counter!(hive_metrics::ACTION_ERRORS_TOTAL).increment(1);

                if e.is_contract_violation() {
                    error!(bee = %bee_name, action = %action_name, error = %e, "bee contract violation, dispatch aborted");
                } else {
                    warn!(bee = %bee_name, action = %action_name, error = %e, "action failed");
                }
                Err(e.into())
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        hive_bees::{BeeBase, BeeFactory, BeeOptionDescriptor, PlaceholderType},
        serde_json::{Map, json},
    };

    /// Echoes the `greeting` option as an event on `greet`.
    struct EchoBee(BeeBase);

    #[async_trait]
    impl Bee for EchoBee {
        fn name(&self) -> &str {
            self.0.name()
        }

        fn namespace(&self) -> &str {
            self.0.namespace()
        }

        fn description(&self) -> &str {
            self.0.description()
        }

        async fn reload_options(&self, options: BeeOptions) -> hive_bees::Result<()> {
            let mut greeting = String::new();
            options.bind("greeting", &mut greeting)?;
            self.0.set_options(options);
            Ok(())
        }

        async fn run(&self, events: EventSender) -> hive_bees::Result<()> {
            self.0.attach(events)
        }

        async fn action(&self, action: Action) -> hive_bees::Result<Placeholders> {
            match action.name.as_str() {
                "greet" => {
                    let options = self.0.options();
                    let greeting = options
                        .value("greeting")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    self.0
                        .emit("greeted", Placeholders::new().with("text", greeting.clone()))
                        .await?;
                    Ok(Placeholders::new().with("text", greeting))
                },
                _ => Err(self.0.unknown_action(&action)),
            }
        }
    }

    struct EchoFactory;

    impl BeeFactory for EchoFactory {
        fn id(&self) -> &str {
            "echobee"
        }

        fn name(&self) -> &str {
            "Echo"
        }

        fn description(&self) -> &str {
            "echoes its greeting"
        }

        fn options(&self) -> Vec<BeeOptionDescriptor> {
            vec![
                BeeOptionDescriptor::new("greeting", "", PlaceholderType::String)
                    .with_default("hello"),
                BeeOptionDescriptor::new("target", "", PlaceholderType::String).mandatory(),
            ]
        }

        fn new_bee(&self, name: &str, description: &str, options: BeeOptions) -> Arc<dyn Bee> {
            Arc::new(EchoBee(BeeBase::new(name, self.id(), description, options)))
        }
    }

    fn hive() -> (Hive, EventReceiver) {
        let mut registry = FactoryRegistry::new();
        registry.register(Arc::new(EchoFactory));
        Hive::new(Arc::new(registry), 8)
    }

    fn echo(name: &str) -> BeeConfig {
        let mut options = Map::new();
        options.insert("target".into(), json!("world"));
        BeeConfig {
            name: name.into(),
            class: "echobee".into(),
            description: String::new(),
            options,
        }
    }

    #[tokio::test]
    async fn started_bee_emits_with_its_name() {
        let (hive, mut rx) = hive();
        hive.start_bee(&echo("echo-1")).await.unwrap();

        let out = hive
            .dispatch(Action::new("echo-1", "greet"))
            .await
            .unwrap();
        assert_eq!(out.value("text").unwrap().to_string(), "hello");
        let event = rx.recv().await.unwrap();
        assert_eq!(event.bee, "echo-1");
        assert_eq!(event.name, "greeted");
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let (hive, _rx) = hive();
        hive.start_bee(&echo("echo-1")).await.unwrap();
        let err = hive.start_bee(&echo("echo-1")).await.err().unwrap();
        assert!(matches!(err, Error::DuplicateBee { .. }));
        assert_eq!(hive.bee_names(), ["echo-1"]);
    }

    #[tokio::test]
    async fn unknown_class_is_an_error() {
        let (hive, _rx) = hive();
        let mut config = echo("ghost");
        config.class = "nosuchbee".into();
        let err = hive.start_bee(&config).await.err().unwrap();
        assert!(matches!(
            err,
            Error::Bee(hive_bees::Error::UnknownFactory { .. })
        ));
        assert!(hive.bee("ghost").is_none());
    }

    #[tokio::test]
    async fn missing_mandatory_option_fails_start() {
        let (hive, _rx) = hive();
        let mut config = echo("echo-1");
        config.options.clear();
        let err = hive.start_bee(&config).await.err().unwrap();
        assert!(matches!(err, Error::MissingOption { ref option, .. } if option == "target"));
    }

    #[tokio::test]
    async fn undeclared_action_aborts_dispatch() {
        let (hive, mut rx) = hive();
        hive.start_bee(&echo("echo-1")).await.unwrap();
        let err = hive
            .dispatch(Action::new("echo-1", "explode"))
            .await
            .unwrap_err();
        assert!(err.is_contract_violation());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dispatch_to_unknown_bee() {
        let (hive, _rx) = hive();
        let err = hive
            .dispatch(Action::new("nobody", "greet"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownBee { .. }));
        assert!(!err.is_contract_violation());
    }

    #[tokio::test]
    async fn reload_applies_defaults() {
        let (hive, _rx) = hive();
        hive.start_bee(&echo("echo-1")).await.unwrap();
        hive.reload_bee("echo-1", BeeOptions::new().with("target", "moon"))
            .await
            .unwrap();
        let out = hive
            .dispatch(Action::new("echo-1", "greet"))
            .await
            .unwrap();
        assert_eq!(out.value("text").unwrap().to_string(), "hello");
    }

    #[tokio::test]
    async fn start_all_starts_every_bee() {
        let (hive, _rx) = hive();
        let config = HiveConfig {
            bees: vec![echo("b"), echo("a")],
            ..HiveConfig::default()
        };
        assert_eq!(hive.start_all(&config).await.unwrap(), 2);
        assert_eq!(hive.bee_names(), ["a", "b"]);
    }
}
