//! Mixcloud bee: emits `new_cloudcast` for every upload in a feed.
//!
//! Polling is triggered by the `poll_feed` action or, when `interval` is
//! set, by a background task started from [`hive_bees::Bee::run`].

pub mod bee;
pub mod client;
pub mod error;
pub mod factory;
pub mod watermark;

pub use {
    bee::MixcloudBee,
    client::{Cloudcast, CloudcastPage, CloudcastSource, MixcloudClient, Paging, collect_cloudcasts},
    error::{Error, Result},
    factory::MixcloudFactory,
    watermark::{PollWindow, Watermark},
};
