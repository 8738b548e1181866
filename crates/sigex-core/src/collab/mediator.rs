//! Create/update/delete of collab records from resolved edits

use serde_json::Value;
use tracing::debug;

use super::CollabConfig;
use crate::command::{EditSet, ResolvedEdit};
use crate::error::{SigexError, SigexResult};
use crate::schema::CollabSchema;
use crate::storage::CollabStore;

/// What a successful `apply` did
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Created(CollabConfig),
    Updated(CollabConfig),
}

impl ApplyOutcome {
    /// The record as persisted
    #[must_use]
    pub fn config(&self) -> &CollabConfig {
        match self {
            Self::Created(config) | Self::Updated(config) => config,
        }
    }
}

/// Enforces the identity rules for collab records on top of a store
///
/// A record's name never changes and its api never changes. Nothing is
/// written unless the whole edit validates.
pub struct CollabMediator<'s, S: CollabStore> {
    store: &'s S,
}

impl<'s, S: CollabStore> CollabMediator<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// All records, ordered by name
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn list(&self) -> SigexResult<Vec<CollabConfig>> {
        Ok(self.store.list()?)
    }

    /// Apply a resolved edit against the record of `schema`'s API
    ///
    /// # Errors
    /// - `DuplicateCollab` when creating over an existing name
    /// - `CrossApi` when the stored record or the edit names another API
    /// - `EditTargetMissing` when editing a record that does not exist
    /// - `MissingField`/`InvalidValue` when the edit does not fit the schema
    pub fn apply(&self, schema: &CollabSchema, edit: &ResolvedEdit) -> SigexResult<ApplyOutcome> {
        match (self.store.find(&edit.identifier)?, edit.is_create) {
            (Some(_), true) => Err(SigexError::DuplicateCollab(edit.identifier.clone())),
            (Some(existing), false) => self.update(schema, existing, &edit.edit_set),
            (None, true) => self.create(schema, &edit.edit_set),
            (None, false) => Err(SigexError::EditTargetMissing(edit.identifier.clone())),
        }
    }

    /// Create a record for something fetched from a remote API
    ///
    /// The record is always created enabled and named `name`.
    ///
    /// # Errors
    /// Returns `DuplicateCollab` if the name is taken, or a schema error if
    /// the fields do not construct a valid record
    pub fn import(
        &self,
        name: &str,
        schema: &CollabSchema,
        fields: EditSet,
    ) -> SigexResult<CollabConfig> {
        if self.store.find(name)?.is_some() {
            return Err(SigexError::DuplicateCollab(name.to_string()));
        }

        let mut edit_set = fields;
        edit_set.set("name", Value::String(name.to_string()));
        edit_set.set("enabled", Value::Bool(true));
        edit_set.set("api", Value::String(schema.api.clone()));

        match self.create(schema, &edit_set)? {
            ApplyOutcome::Created(config) | ApplyOutcome::Updated(config) => Ok(config),
        }
    }

    /// Delete a record by name
    ///
    /// # Errors
    /// Returns `CollabNotFound` if there is no such record
    pub fn delete(&self, name: &str) -> SigexResult<CollabConfig> {
        let existing = self
            .store
            .find(name)?
            .ok_or_else(|| SigexError::CollabNotFound(name.to_string()))?;

        if !self.store.delete(&existing)? {
            return Err(SigexError::CollabNotFound(name.to_string()));
        }

        debug!(collab = %existing.name, api = %existing.api, "Deleted collab");
        Ok(existing)
    }

    fn create(&self, schema: &CollabSchema, edit_set: &EditSet) -> SigexResult<ApplyOutcome> {
        let config = CollabConfig::construct(schema, edit_set)?;
        self.store.create(&config)?;

        debug!(collab = %config.name, api = %config.api, "Created collab");
        Ok(ApplyOutcome::Created(config))
    }

    fn update(
        &self,
        schema: &CollabSchema,
        existing: CollabConfig,
        edit_set: &EditSet,
    ) -> SigexResult<ApplyOutcome> {
        if existing.api != schema.api {
            return Err(SigexError::CrossApi {
                existing: existing.api,
                target: schema.api.clone(),
            });
        }

        let mut config = existing;
        for (field, value) in edit_set.iter() {
            config.assign(schema, field, value.clone())?;
        }
        self.store.update(&config)?;

        debug!(
            collab = %config.name,
            api = %config.api,
            fields = ?edit_set.keys().collect::<Vec<_>>(),
            "Updated collab"
        );
        Ok(ApplyOutcome::Updated(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, TypeTag};
    use crate::storage::{Database, SqliteCollabStore};
    use serde_json::json;

    fn schema() -> CollabSchema {
        CollabSchema::new("demo").field(FieldSpec::required("group", TypeTag::Int))
    }

    fn resolved(identifier: &str, is_create: bool, pairs: &[(&str, Value)]) -> ResolvedEdit {
        let mut edit_set = EditSet::new();
        if is_create {
            edit_set.set("name", json!(identifier));
            edit_set.set("enabled", json!(true));
            edit_set.set("api", json!("demo"));
        }
        for (k, v) in pairs {
            edit_set.set(*k, v.clone());
        }
        ResolvedEdit {
            identifier: identifier.to_string(),
            edit_set,
            is_create,
        }
    }

    #[test]
    fn test_create_then_update() {
        let db = Database::in_memory().unwrap();
        let store = SqliteCollabStore::new(db.connection());
        let mediator = CollabMediator::new(&store);

        let created = mediator
            .apply(&schema(), &resolved("c1", true, &[("group", json!(1))]))
            .unwrap();
        assert!(matches!(created, ApplyOutcome::Created(_)));

        let updated = mediator
            .apply(&schema(), &resolved("c1", false, &[("group", json!(2))]))
            .unwrap();
        assert!(matches!(updated, ApplyOutcome::Updated(_)));
        assert_eq!(updated.config().attribute("group"), Some(&json!(2)));
        assert_eq!(store.find("c1").unwrap().unwrap().attribute("group"), Some(&json!(2)));
    }

    #[test]
    fn test_edit_missing_hints_create() {
        let db = Database::in_memory().unwrap();
        let store = SqliteCollabStore::new(db.connection());
        let mediator = CollabMediator::new(&store);

        let err = mediator
            .apply(&schema(), &resolved("ghost", false, &[("group", json!(1))]))
            .unwrap_err();
        assert!(err.to_string().contains("--create"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_failed_update_leaves_record() {
        let db = Database::in_memory().unwrap();
        let store = SqliteCollabStore::new(db.connection());
        let mediator = CollabMediator::new(&store);

        mediator
            .apply(&schema(), &resolved("c1", true, &[("group", json!(1))]))
            .unwrap();
        let before = store.find("c1").unwrap();

        // enabled flips first, then group fails; nothing may be written
        let err = mediator
            .apply(
                &schema(),
                &resolved("c1", false, &[("enabled", json!(false)), ("group", json!("x"))]),
            )
            .unwrap_err();
        assert!(matches!(err, SigexError::InvalidValue { .. }));
        assert_eq!(store.find("c1").unwrap(), before);
    }

    #[test]
    fn test_delete_missing() {
        let db = Database::in_memory().unwrap();
        let store = SqliteCollabStore::new(db.connection());
        let mediator = CollabMediator::new(&store);

        assert!(matches!(
            mediator.delete("nope"),
            Err(SigexError::CollabNotFound(_))
        ));
    }
}
