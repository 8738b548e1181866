//! Scalar settings bag (API tokens, credentials)

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::db::DatabaseError;

/// Key for the default ThreatExchange API token
pub const FB_THREATEXCHANGE_API_TOKEN: &str = "fb_threatexchange_api_token";
/// Key for the NCMEC `(username, password)` pair
pub const NCMEC_CREDENTIALS: &str = "ncmec_credentials";

/// Key/value settings storage; values are stored as JSON
pub struct SettingsStore<'a> {
    conn: &'a Connection,
}

impl<'a> SettingsStore<'a> {
    /// Create a new settings store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Read a setting
    ///
    /// # Errors
    /// Returns an error if the query fails or the stored value has another shape
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| {
                DatabaseError::Serialization(format!("Failed to parse setting '{key}': {e}"))
            })
        })
        .transpose()
    }

    /// Write a setting, replacing any previous value
    ///
    /// # Errors
    /// Returns an error if the value cannot be serialized or written
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(value).map_err(|e| {
            DatabaseError::Serialization(format!("Failed to serialize setting '{key}': {e}"))
        })?;

        self.conn.execute(
            r"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
