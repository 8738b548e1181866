//! CLI command implementations

pub mod api;
pub mod collab;
pub mod extensions;
pub mod types;
