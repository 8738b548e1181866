//! Collab storage operations (CRUD)

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::collab::CollabConfig;
use crate::storage::db::DatabaseError;

/// What the mediator needs from a collab store
///
/// Implementations must give read-your-writes consistency within a
/// process. Locking across processes is not part of the contract.
pub trait CollabStore {
    /// Look up a collab by its unique name
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    fn find(&self, name: &str) -> Result<Option<CollabConfig>, DatabaseError>;

    /// All collabs, ordered by name
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    fn list(&self) -> Result<Vec<CollabConfig>, DatabaseError>;

    /// Persist a new collab
    ///
    /// # Errors
    /// Returns an error if the name is taken or the write fails
    fn create(&self, config: &CollabConfig) -> Result<(), DatabaseError>;

    /// Overwrite an existing collab
    ///
    /// # Errors
    /// Returns an error if the collab does not exist or the write fails
    fn update(&self, config: &CollabConfig) -> Result<(), DatabaseError>;

    /// Remove a collab, returning whether a row was deleted
    ///
    /// # Errors
    /// Returns an error if the write fails
    fn delete(&self, config: &CollabConfig) -> Result<bool, DatabaseError>;
}

/// `SQLite`-backed collab store
pub struct SqliteCollabStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCollabStore<'a> {
    /// Create a new collab store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse(json: &str) -> Result<CollabConfig, DatabaseError> {
        serde_json::from_str(json)
            .map_err(|e| DatabaseError::Serialization(format!("Failed to parse collab: {e}")))
    }

    fn serialize(config: &CollabConfig) -> Result<String, DatabaseError> {
        serde_json::to_string(config)
            .map_err(|e| DatabaseError::Serialization(format!("Failed to serialize collab: {e}")))
    }
}

impl CollabStore for SqliteCollabStore<'_> {
    fn find(&self, name: &str) -> Result<Option<CollabConfig>, DatabaseError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM collabs WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        json.as_deref().map(Self::parse).transpose()
    }

    fn list(&self) -> Result<Vec<CollabConfig>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM collabs ORDER BY name")?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut collabs = Vec::new();
        for row in rows {
            collabs.push(Self::parse(&row?)?);
        }
        Ok(collabs)
    }

    fn create(&self, config: &CollabConfig) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            r"
            INSERT INTO collabs (name, api, enabled, data, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                config.name,
                config.api,
                config.enabled,
                Self::serialize(config)?,
                now,
                now,
            ],
        )?;

        Ok(())
    }

    fn update(&self, config: &CollabConfig) -> Result<(), DatabaseError> {
        let updated = self.conn.execute(
            r"
            UPDATE collabs
            SET api = ?1, enabled = ?2, data = ?3, updated_at = ?4
            WHERE name = ?5
            ",
            params![
                config.api,
                config.enabled,
                Self::serialize(config)?,
                Utc::now().to_rfc3339(),
                config.name,
            ],
        )?;

        if updated == 0 {
            return Err(DatabaseError::Serialization(format!(
                "Collab not found: {}",
                config.name
            )));
        }

        Ok(())
    }

    fn delete(&self, config: &CollabConfig) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn
            .execute("DELETE FROM collabs WHERE name = ?1", params![config.name])?;
        Ok(deleted > 0)
    }
}
