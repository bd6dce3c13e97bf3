//! OAuth2 support for bee factories.
//!
//! Factories that talk to OAuth2-protected services override
//! `BeeFactory::oauth2_access_token` and delegate to [`CodeExchange`].

pub mod error;
pub mod exchange;
pub mod types;

pub use {
    error::{Error, Result},
    exchange::CodeExchange,
    types::{OAuthTokens, serialize_option_secret, serialize_secret},
};
