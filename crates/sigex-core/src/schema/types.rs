//! Declarative field tables for collab schemas

use serde_json::Value;
use std::fmt;

/// Field names every collab carries, handled outside the generic field machinery
pub const COMMON_FIELDS: [&str; 3] = ["name", "api", "enabled"];

/// Enumerated set of named values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSpec {
    /// Display name of the enum type
    pub name: &'static str,
    /// Member names, in declaration order
    pub members: Vec<&'static str>,
}

impl EnumSpec {
    /// Create a new enum spec
    pub fn new(name: &'static str, members: &[&'static str]) -> Self {
        Self {
            name,
            members: members.to_vec(),
        }
    }

    /// Whether `value` names a member
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.members.iter().any(|m| *m == value)
    }
}

/// Declared type of a collab field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    Str,
    Int,
    Float,
    Bool,
    Enum(EnumSpec),
    Optional(Box<TypeTag>),
    List(Box<TypeTag>),
}

impl TypeTag {
    /// Wrap a type as optional
    #[must_use]
    pub fn optional(inner: TypeTag) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Wrap a type as a list
    #[must_use]
    pub fn list(inner: TypeTag) -> Self {
        Self::List(Box::new(inner))
    }

    /// Strip an optional wrapper; the type used for argument parsing
    #[must_use]
    pub fn unwrapped(&self) -> &TypeTag {
        match self {
            Self::Optional(inner) => inner,
            other => other,
        }
    }

    /// The enum spec, if the (unwrapped) type is an enum
    #[must_use]
    pub fn as_enum(&self) -> Option<&EnumSpec> {
        match self.unwrapped() {
            Self::Enum(spec) => Some(spec),
            _ => None,
        }
    }

    /// Name shown in help output
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Str => "str".into(),
            Self::Int => "int".into(),
            Self::Float => "float".into(),
            Self::Bool => "bool".into(),
            Self::Enum(spec) => spec.name.into(),
            Self::Optional(inner) => inner.display_name(),
            Self::List(inner) => format!("{},...", inner.display_name()),
        }
    }

    /// Check that a JSON value inhabits this type
    ///
    /// # Errors
    /// Returns a description of the mismatch
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match (self, value) {
            (Self::Optional(_), Value::Null) => Ok(()),
            (Self::Optional(inner), v) => inner.check(v),
            (Self::Str, Value::String(_)) | (Self::Bool, Value::Bool(_)) => Ok(()),
            (Self::Int, Value::Number(n)) if n.is_i64() => Ok(()),
            (Self::Float, Value::Number(_)) => Ok(()),
            (Self::Enum(spec), Value::String(s)) => {
                if spec.contains(s) {
                    Ok(())
                } else {
                    Err(format!(
                        "'{s}' is not one of [{}]",
                        spec.members.join(",")
                    ))
                }
            }
            (Self::List(inner), Value::Array(items)) => {
                items.iter().try_for_each(|item| inner.check(item))
            }
            (ty, v) => Err(format!("expected {}, got {v}", ty.display_name())),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One row of a schema's descriptor table
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: TypeTag,
    /// Value used when the field is absent on create
    pub default: Option<Value>,
    /// Whether the field gets a generic CLI flag
    pub editable: bool,
    pub help: Option<&'static str>,
    pub metavar: Option<&'static str>,
}

impl FieldSpec {
    /// A field that must be supplied on create
    pub fn required(name: &'static str, ty: TypeTag) -> Self {
        Self {
            name,
            ty,
            default: None,
            editable: true,
            help: None,
            metavar: None,
        }
    }

    /// A field that falls back to `default` on create
    pub fn with_default(name: &'static str, ty: TypeTag, default: Value) -> Self {
        Self {
            default: Some(default),
            ..Self::required(name, ty)
        }
    }

    /// Set help text
    #[must_use]
    pub fn help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    /// Override the metavar shown in help output
    #[must_use]
    pub fn metavar(mut self, metavar: &'static str) -> Self {
        self.metavar = Some(metavar);
        self
    }

    /// Exclude the field from the generated flags
    #[must_use]
    pub fn not_editable(mut self) -> Self {
        self.editable = false;
        self
    }
}

/// The declarative field set for one API's collab configs
#[derive(Debug, Clone, PartialEq)]
pub struct CollabSchema {
    /// Name of the API this schema belongs to
    pub api: String,
    /// Common fields first, then API-specific ones
    pub fields: Vec<FieldSpec>,
}

impl CollabSchema {
    /// Create a schema with just the common `name`/`api`/`enabled` fields
    pub fn new(api: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            fields: vec![
                FieldSpec::required("name", TypeTag::Str).not_editable(),
                FieldSpec::required("api", TypeTag::Str).not_editable(),
                FieldSpec::with_default("enabled", TypeTag::Bool, Value::Bool(true))
                    .not_editable(),
            ],
        }
    }

    /// Append an API-specific field
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields specific to this API (everything but the common ones)
    pub fn api_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(|f| !COMMON_FIELDS.contains(&f.name))
    }
}
