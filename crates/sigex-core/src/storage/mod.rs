//! Storage layer (`SQLite`)

pub mod collabs;
pub mod db;
pub mod extensions;
pub mod migrations;
pub mod settings;

pub use collabs::{CollabStore, SqliteCollabStore};
pub use db::{Database, DatabaseError};
pub use extensions::ExtensionStore;
pub use settings::SettingsStore;
