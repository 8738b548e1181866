//! Collab schemas
//!
//! Each API registers a descriptor table for its collab configs. The
//! introspector turns a table into the editable field descriptors that
//! drive the generated `config collab edit <api>` commands.

mod describe;
mod types;

pub use describe::{describe, FieldDescriptor, MISSING_HELP};
pub use types::{CollabSchema, EnumSpec, FieldSpec, TypeTag, COMMON_FIELDS};
