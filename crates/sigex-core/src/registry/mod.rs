//! Type registry: content types, signal types and APIs

mod api;
pub mod builtin;
mod content;

pub use api::{
    ApiFactory, ApiMapping, ApiType, FactoryError, RegisteredApi, SignalExchangeApi,
};
pub use content::{ContentType, SignalType, SignalTypeMapping};
