//! Persisted extension module references

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::db::DatabaseError;

/// Extension reference storage
pub struct ExtensionStore<'a> {
    conn: &'a Connection,
}

impl<'a> ExtensionStore<'a> {
    /// Create a new extension store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All module references, sorted
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub fn list(&self) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT module FROM extensions ORDER BY module")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::from)
    }

    /// Whether a module reference has been added
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub fn contains(&self, module: &str) -> Result<bool, DatabaseError> {
        Ok(self.added_at(module)?.is_some())
    }

    /// When a module reference was added
    ///
    /// # Errors
    /// Returns an error if the database query fails
    pub fn added_at(&self, module: &str) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        let added: Option<String> = self
            .conn
            .query_row(
                "SELECT added_at FROM extensions WHERE module = ?1",
                params![module],
                |row| row.get(0),
            )
            .optional()?;

        added
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| DatabaseError::Serialization(format!("Invalid datetime: {e}")))
            })
            .transpose()
    }

    /// Add a module reference, returning false if it was already present
    ///
    /// # Errors
    /// Returns an error if the database operation fails
    pub fn add(&self, module: &str) -> Result<bool, DatabaseError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO extensions (module, added_at) VALUES (?1, ?2)",
            params![module, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    /// Remove a module reference, returning false if it was not present
    ///
    /// # Errors
    /// Returns an error if the database operation fails
    pub fn remove(&self, module: &str) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn
            .execute("DELETE FROM extensions WHERE module = ?1", params![module])?;
        Ok(deleted > 0)
    }
}
