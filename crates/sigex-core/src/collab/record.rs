//! Persisted collaboration config records

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::command::EditSet;
use crate::error::{SigexError, SigexResult};
use crate::schema::{CollabSchema, COMMON_FIELDS};

/// A named collaboration bound to one API
///
/// `name` is unique across the store and `api` never changes once the
/// record exists. API-specific fields live in `attributes` and always
/// conform to the API's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollabConfig {
    pub name: String,
    pub api: String,
    pub enabled: bool,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl CollabConfig {
    /// Construct a new record of `schema` from an edit set
    ///
    /// Absent fields take the schema default; a missing field without one
    /// is a `MissingField` error.
    ///
    /// # Errors
    /// Returns an error for missing required fields, mistyped values, or a
    /// key the schema does not declare
    pub fn construct(schema: &CollabSchema, edit: &EditSet) -> SigexResult<Self> {
        for (key, _) in edit.iter() {
            if schema.get(key).is_none() {
                return Err(SigexError::Internal(format!(
                    "'{key}' is not a field of the {} collab schema",
                    schema.api
                )));
            }
        }

        let name = match edit.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(SigexError::InvalidValue {
                    field: "name".into(),
                    message: format!("expected str, got {other}"),
                })
            }
            None => return Err(SigexError::MissingField("name".into())),
        };
        if name.is_empty() {
            return Err(SigexError::UserInput("Collab name cannot be empty".into()));
        }

        let mut config = Self {
            name,
            api: schema.api.clone(),
            enabled: true,
            attributes: Map::new(),
        };

        for field in &schema.fields {
            if field.name == "name" {
                continue;
            }
            let value = match (edit.get(field.name), &field.default) {
                (Some(value), _) => value.clone(),
                (None, Some(default)) => default.clone(),
                (None, None) if field.name == "api" => Value::String(schema.api.clone()),
                (None, None) => return Err(SigexError::MissingField(field.name.into())),
            };
            config.assign(schema, field.name, value)?;
        }

        Ok(config)
    }

    /// Assign one field, checking it against the schema
    ///
    /// # Errors
    /// Returns an error for unknown fields, mistyped values, or an attempt
    /// to change `name` or `api`
    pub fn assign(&mut self, schema: &CollabSchema, field: &str, value: Value) -> SigexResult<()> {
        let spec = schema.get(field).ok_or_else(|| {
            SigexError::Internal(format!(
                "'{field}' is not a field of the {} collab schema",
                schema.api
            ))
        })?;

        spec.ty.check(&value).map_err(|message| SigexError::InvalidValue {
            field: field.to_string(),
            message,
        })?;

        match (field, value) {
            ("name", Value::String(name)) => {
                if name != self.name {
                    return Err(SigexError::Internal(format!(
                        "cannot rename collab '{}' to '{name}'",
                        self.name
                    )));
                }
            }
            ("api", Value::String(api)) => {
                if api != self.api {
                    return Err(SigexError::CrossApi {
                        existing: self.api.clone(),
                        target: api,
                    });
                }
            }
            ("enabled", Value::Bool(enabled)) => self.enabled = enabled,
            (name, value) => {
                debug_assert!(!COMMON_FIELDS.contains(&name));
                self.attributes.insert(name.to_string(), value);
            }
        }

        Ok(())
    }

    /// Look up an API-specific attribute
    #[must_use]
    pub fn attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// Deserialize the API-specific attributes into a typed struct
    ///
    /// # Errors
    /// Returns an error if the attributes do not fit `T`
    pub fn attributes_as<T: DeserializeOwned>(&self) -> SigexResult<T> {
        serde_json::from_value(Value::Object(self.attributes.clone())).map_err(|e| {
            SigexError::Internal(format!(
                "collab '{}' does not match its {} config: {e}",
                self.name, self.api
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumSpec, FieldSpec, TypeTag};
    use serde_json::json;

    fn schema() -> CollabSchema {
        CollabSchema::new("demo")
            .field(FieldSpec::required("group", TypeTag::Int))
            .field(FieldSpec::with_default(
                "mode",
                TypeTag::Enum(EnumSpec::new("Mode", &["Fast", "Slow"])),
                json!("Fast"),
            ))
    }

    fn edit(pairs: &[(&str, Value)]) -> EditSet {
        let mut set = EditSet::new();
        for (k, v) in pairs {
            set.set(*k, v.clone());
        }
        set
    }

    #[test]
    fn test_construct_applies_defaults() {
        let config =
            CollabConfig::construct(&schema(), &edit(&[("name", json!("c1")), ("group", json!(7))]))
                .unwrap();
        assert_eq!(config.name, "c1");
        assert_eq!(config.api, "demo");
        assert!(config.enabled);
        assert_eq!(config.attribute("group"), Some(&json!(7)));
        assert_eq!(config.attribute("mode"), Some(&json!("Fast")));
    }

    #[test]
    fn test_construct_missing_required() {
        let err = CollabConfig::construct(&schema(), &edit(&[("name", json!("c1"))])).unwrap_err();
        assert!(matches!(err, SigexError::MissingField(ref f) if f == "group"));
    }

    #[test]
    fn test_construct_rejects_wrong_api() {
        let err = CollabConfig::construct(
            &schema(),
            &edit(&[("name", json!("c1")), ("group", json!(1)), ("api", json!("other"))]),
        )
        .unwrap_err();
        assert!(matches!(err, SigexError::CrossApi { .. }));
    }

    #[test]
    fn test_assign_type_checks() {
        let mut config =
            CollabConfig::construct(&schema(), &edit(&[("name", json!("c1")), ("group", json!(7))]))
                .unwrap();
        assert!(config.assign(&schema(), "mode", json!("Medium")).is_err());
        assert!(config.assign(&schema(), "nope", json!(1)).is_err());
        config.assign(&schema(), "enabled", json!(false)).unwrap();
        assert!(!config.enabled);
    }

    #[test]
    fn test_serializes_flat() {
        let config =
            CollabConfig::construct(&schema(), &edit(&[("name", json!("c1")), ("group", json!(7))]))
                .unwrap();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["group"], json!(7));
        assert_eq!(value["api"], json!("demo"));
        let back: CollabConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_attributes_as() {
        #[derive(Deserialize)]
        struct Demo {
            group: i64,
            mode: String,
        }
        let config =
            CollabConfig::construct(&schema(), &edit(&[("name", json!("c1")), ("group", json!(7))]))
                .unwrap();
        let demo: Demo = config.attributes_as().unwrap();
        assert_eq!(demo.group, 7);
        assert_eq!(demo.mode, "Fast");
    }
}
