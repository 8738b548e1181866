//! Edit-set resolution
//!
//! Merges the JSON payload, create-mode identity fields, the enable/disable
//! toggle and individual field flags into one ordered field -> value map.
//! Later layers win.

use serde_json::{Map, Value};

use crate::error::{SigexError, SigexResult};
use crate::schema::FieldDescriptor;

/// Ordered field -> value assignments for a single command invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditSet {
    entries: Vec<(String, Value)>,
}

impl EditSet {
    /// Create an empty edit set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, overwriting in place if it is already present
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        match self.entries.iter_mut().find(|(k, _)| *k == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    /// Get the value for a field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// Parsed arguments of a `config collab edit <api>` invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditArgs {
    /// The positional: a collab name, or a JSON document with `--json`
    pub collab_name: String,
    pub create: bool,
    /// `--enable[=0|1]` / `--disable`; `None` when neither was given
    pub enable: Option<u8>,
    pub is_json: bool,
    /// Field flags that were actually supplied, in descriptor order
    pub fields: Vec<(String, Value)>,
}

/// Result of resolving an invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEdit {
    pub identifier: String,
    pub edit_set: EditSet,
    pub is_create: bool,
}

/// Resolve parsed arguments into the identifier and edit set to apply
///
/// # Errors
/// Returns a user-input error for malformed JSON, a payload without a
/// string `name`, or payload keys/values the schema does not accept
pub fn resolve(
    api: &str,
    descriptors: &[FieldDescriptor],
    args: &EditArgs,
) -> SigexResult<ResolvedEdit> {
    let mut edit_set = EditSet::new();
    let mut identifier = args.collab_name.clone();

    if args.is_json {
        let payload = parse_payload(&args.collab_name)?;
        identifier = match payload.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(_) => {
                return Err(SigexError::UserInput(
                    "JSON 'name' must be a string".into(),
                ))
            }
            None => {
                return Err(SigexError::UserInput(
                    "JSON payload is missing the 'name' key".into(),
                ))
            }
        };
        for (key, value) in payload {
            check_payload_entry(descriptors, &key, &value)?;
            edit_set.set(key, value);
        }
    }

    if args.create {
        edit_set.set("name", Value::String(identifier.clone()));
        edit_set.set("enabled", Value::Bool(true));
        edit_set.set("api", Value::String(api.to_string()));
    }

    if let Some(enable) = args.enable {
        edit_set.set("enabled", Value::Bool(enable != 0));
    }

    for descriptor in descriptors {
        if let Some((_, value)) = args.fields.iter().find(|(k, _)| *k == descriptor.name) {
            edit_set.set(descriptor.name.clone(), value.clone());
        }
    }

    Ok(ResolvedEdit {
        identifier,
        edit_set,
        is_create: args.create,
    })
}

fn parse_payload(raw: &str) -> SigexResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(SigexError::UserInput(format!(
            "JSON payload must be an object, got {other}"
        ))),
    }
}

fn check_payload_entry(
    descriptors: &[FieldDescriptor],
    key: &str,
    value: &Value,
) -> SigexResult<()> {
    let type_error = |expected: &str| SigexError::InvalidValue {
        field: key.to_string(),
        message: format!("expected {expected}, got {value}"),
    };

    match key {
        "name" | "api" if !value.is_string() => Err(type_error("str")),
        "enabled" if !value.is_boolean() => Err(type_error("bool")),
        "name" | "api" | "enabled" => Ok(()),
        _ => {
            let descriptor = descriptors
                .iter()
                .find(|d| d.name == key)
                .ok_or_else(|| SigexError::UserInput(format!("Unknown field in JSON: '{key}'")))?;
            descriptor
                .declared_type
                .check(value)
                .map_err(|message| SigexError::InvalidValue {
                    field: key.to_string(),
                    message,
                })
        }
    }
}
