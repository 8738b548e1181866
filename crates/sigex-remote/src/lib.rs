//! Sigex Remote - ThreatExchange privacy group client
//!
//! Only the calls the `config api fb_threatexchange` commands need: list the
//! privacy groups an app can see and fetch one by id.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

mod client;
mod error;

pub use client::{
    is_valid_app_token, PrivacyGroup, PrivacyGroupSource, ThreatExchangeClient, DEFAULT_BASE_URL,
};
pub use error::{RemoteError, RemoteResult};
