use std::sync::Arc;

use {
    async_trait::async_trait,
    hive_bees::{
        ActionDescriptor, Bee, BeeFactory, BeeOptionDescriptor, BeeOptions, EventDescriptor,
        PlaceholderDescriptor, PlaceholderType,
    },
};

use crate::{
    bee::{MixcloudBee, NEW_CLOUDCAST, POLL_FEED},
    client::DEFAULT_BASE_URL,
};

/// Factory ID of the Mixcloud bee.
pub const MIXCLOUD_FACTORY_ID: &str = "mixcloudbee";

/// Builds [`MixcloudBee`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct MixcloudFactory;

#[async_trait]
impl BeeFactory for MixcloudFactory {
    fn id(&self) -> &str {
        MIXCLOUD_FACTORY_ID
    }

    fn name(&self) -> &str {
        "Mixcloud"
    }

    fn description(&self) -> &str {
        "Reacts to new cloudcasts in a Mixcloud feed"
    }

    fn image(&self) -> &str {
        "mixcloud.png"
    }

    fn logo_color(&self) -> &str {
        "#5000ff"
    }

    fn options(&self) -> Vec<BeeOptionDescriptor> {
        vec![
            BeeOptionDescriptor::new("baseUrl", "Mixcloud API endpoint", PlaceholderType::Url)
                .with_default(DEFAULT_BASE_URL),
            BeeOptionDescriptor::new(
                "feed",
                "Feed to watch, e.g. a user name",
                PlaceholderType::String,
            )
            .mandatory(),
            BeeOptionDescriptor::new(
                "interval",
                "Seconds between polls, 0 to poll only on demand",
                PlaceholderType::Integer,
            )
            .with_default(0),
        ]
    }

    fn events(&self) -> Vec<EventDescriptor> {
        vec![EventDescriptor {
            namespace: self.id().to_string(),
            name: NEW_CLOUDCAST.to_string(),
            description: "A new cloudcast appeared in the feed".to_string(),
            options: vec![
                PlaceholderDescriptor::new(
                    "name",
                    "Title of the cloudcast",
                    PlaceholderType::String,
                ),
                PlaceholderDescriptor::new("url", "Link to the cloudcast", PlaceholderType::Url),
                PlaceholderDescriptor::new(
                    "slug",
                    "URL slug of the cloudcast",
                    PlaceholderType::String,
                ),
            ],
        }]
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        vec![ActionDescriptor {
            namespace: self.id().to_string(),
            name: POLL_FEED.to_string(),
            description: "Fetch new cloudcasts now".to_string(),
            options: Vec::new(),
        }]
    }

    fn new_bee(&self, name: &str, description: &str, options: BeeOptions) -> Arc<dyn Bee> {
        Arc::new(MixcloudBee::new(name, self.id(), description, options))
    }
}
