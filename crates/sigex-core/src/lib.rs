//! Sigex Core - Collab configuration engine
//!
//! This crate turns declarative collab schemas into CLI edit surfaces,
//! resolves edits into records in a SQLite store, and validates extension
//! modules against the type registry.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod collab;
pub mod command;
pub mod error;
pub mod extension;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod storage;

pub use collab::{ApplyOutcome, CollabConfig, CollabMediator};
pub use error::{SigexError, SigexResult};
pub use settings::Settings;
