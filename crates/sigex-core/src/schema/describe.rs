//! Schema introspection: descriptor table -> editable field descriptors

use serde_json::Value;
use std::collections::HashSet;

use super::types::{CollabSchema, FieldSpec, TypeTag};
use crate::error::{SigexError, SigexResult};

/// Help text used when a schema author left a field undocumented
pub const MISSING_HELP: &str = "[missing] add a help annotation to the collab schema";

/// Everything needed to expose one schema field as a CLI flag
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    /// The type as declared (may be optional)
    pub declared_type: TypeTag,
    pub is_enum: bool,
    /// Enum member names, empty unless `is_enum`
    pub enum_values: Vec<String>,
    pub has_default: bool,
    pub default: Option<Value>,
    pub metavar: String,
    pub help_text: String,
}

impl FieldDescriptor {
    /// The type used for argument parsing (optional wrapper removed)
    #[must_use]
    pub fn arg_type(&self) -> &TypeTag {
        self.declared_type.unwrapped()
    }

    /// Only fields without a default must be given on create
    #[must_use]
    pub fn required(&self) -> bool {
        !self.has_default
    }

    /// Long flag name (`--privacy-group` for `privacy_group`)
    #[must_use]
    pub fn flag(&self) -> String {
        self.name.replace('_', "-")
    }
}

/// Extract the ordered list of editable field descriptors from a schema
///
/// # Errors
/// Returns `SigexError::Schema` if the descriptor table is malformed
pub fn describe(schema: &CollabSchema) -> SigexResult<Vec<FieldDescriptor>> {
    validate_schema(schema)?;

    Ok(schema
        .fields
        .iter()
        .filter(|f| f.editable)
        .map(describe_field)
        .collect())
}

fn describe_field(field: &FieldSpec) -> FieldDescriptor {
    let target = field.ty.unwrapped();

    let (is_enum, enum_values, mut metavar) = match target {
        TypeTag::Enum(spec) => (
            true,
            spec.members.iter().map(ToString::to_string).collect(),
            format!("[{}]", spec.members.join(",")),
        ),
        other => (false, Vec::new(), other.display_name()),
    };
    if let Some(explicit) = field.metavar {
        metavar = explicit.to_string();
    }

    FieldDescriptor {
        name: field.name.to_string(),
        declared_type: field.ty.clone(),
        is_enum,
        enum_values,
        has_default: field.default.is_some(),
        default: field.default.clone(),
        metavar,
        help_text: field.help.unwrap_or(MISSING_HELP).to_string(),
    }
}

fn validate_schema(schema: &CollabSchema) -> SigexResult<()> {
    let mut seen = HashSet::new();

    for field in &schema.fields {
        if !is_snake_identifier(field.name) {
            return Err(SigexError::schema(
                &schema.api,
                format!("field name '{}' is not a snake_case identifier", field.name),
            ));
        }
        if !seen.insert(field.name) {
            return Err(SigexError::schema(
                &schema.api,
                format!("field '{}' declared twice", field.name),
            ));
        }
        validate_type(schema, field.name, &field.ty, false)?;
        if let Some(default) = &field.default {
            field.ty.check(default).map_err(|e| {
                SigexError::schema(
                    &schema.api,
                    format!("default for '{}' does not match its type: {e}", field.name),
                )
            })?;
        }
    }

    Ok(())
}

fn validate_type(
    schema: &CollabSchema,
    field: &str,
    ty: &TypeTag,
    inside_optional: bool,
) -> SigexResult<()> {
    match ty {
        TypeTag::Optional(_) if inside_optional => Err(SigexError::schema(
            &schema.api,
            format!("field '{field}' nests an optional inside an optional"),
        )),
        TypeTag::Optional(inner) => validate_type(schema, field, inner, true),
        TypeTag::List(inner) => validate_type(schema, field, inner, inside_optional),
        TypeTag::Enum(spec) => {
            if spec.members.is_empty() {
                return Err(SigexError::schema(
                    &schema.api,
                    format!("enum {} for '{field}' has no members", spec.name),
                ));
            }
            let unique: HashSet<_> = spec.members.iter().collect();
            if unique.len() != spec.members.len() {
                return Err(SigexError::schema(
                    &schema.api,
                    format!("enum {} for '{field}' repeats a member", spec.name),
                ));
            }
            Ok(())
        }
        TypeTag::Str | TypeTag::Int | TypeTag::Float | TypeTag::Bool => Ok(()),
    }
}

fn is_snake_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
