//! Bee module system.
//!
//! A bee is a pluggable module: a [`BeeFactory`] advertises what it can do
//! (options, states, events, actions) and constructs [`Bee`] instances; a
//! running bee reports [`Event`]s through the single event channel it was
//! started with and answers [`Action`]s dispatched by the hive.
//!
//! Factories are collected in a [`FactoryRegistry`] during start-up. The
//! registry is filled through `&mut` access and then shared read-only, so
//! every registration completes before the first lookup.
//!
//! # Concurrency
//!
//! [`Bee`] methods take `&self` and may be called concurrently with each
//! other and with any background work a bee spawned from [`Bee::run`].
//! Every bee must guard its mutable state itself, either behind a lock or
//! by funnelling it through a single task.

pub mod bee;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod factory;
pub mod options;
pub mod placeholder;
pub mod registry;

pub use {
    bee::{Bee, BeeBase},
    descriptor::{
        ActionDescriptor, BeeOptionDescriptor, EventDescriptor, PlaceholderDescriptor,
        StateDescriptor,
    },
    error::{Error, Result},
    event::{Action, Event, EventReceiver, EventSender, event_channel},
    factory::{BeeFactory, DEFAULT_LOGO_COLOR, FactoryInfo},
    options::{BeeOption, BeeOptions, OptionIssue},
    placeholder::{Placeholder, PlaceholderType, PlaceholderValue, Placeholders},
    registry::FactoryRegistry,
};
