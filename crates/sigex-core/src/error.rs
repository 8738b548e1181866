//! Error types for sigex operations

use thiserror::Error;

use crate::storage::db::DatabaseError;

/// Result type for sigex operations
pub type SigexResult<T> = Result<T, SigexError>;

/// Errors that can occur while configuring collaborations and extensions
#[derive(Debug, Error)]
pub enum SigexError {
    /// A collab schema descriptor table is malformed (author mistake)
    #[error("Schema error in '{api}': {message}")]
    Schema { api: String, message: String },

    /// Malformed user input (bad JSON, missing `name`, ...)
    #[error("{0}")]
    UserInput(String),

    /// A field without a default was not supplied on create
    #[error("Missing required field: --{}", .0.replace('_', "-"))]
    MissingField(String),

    /// A value does not match the declared type of its field
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Create was requested but the name is taken
    #[error("There's an existing collaboration named \"{0}\"")]
    DuplicateCollab(String),

    /// Edit targets a record that belongs to another API
    #[error("The existing collab is for the {existing} api, delete that one first")]
    CrossApi { existing: String, target: String },

    /// No record with the given name
    #[error("No such collab: {0}")]
    CollabNotFound(String),

    /// Edit without --create on a missing record
    #[error("No such config \"{0}\"! Did you mean to use --create?")]
    EditTargetMissing(String),

    /// Two registry entries share a name
    #[error("Duplicate {kind} registration: '{name}'")]
    DuplicateRegistration { kind: &'static str, name: String },

    /// Signal type applies to a content type nobody registered
    #[error("Signal type '{signal_type}' references unknown content type '{content_type}'")]
    IncompatibleSignalType {
        signal_type: String,
        content_type: String,
    },

    /// Module reference does not resolve to a manifest
    #[error("No extension module named '{0}'")]
    UnknownExtension(String),

    /// Module reference is already in the persisted list
    #[error("Extension '{0}' is already added")]
    ExtensionAlreadyAdded(String),

    /// Module reference is not in the persisted list
    #[error("You haven't added {0}")]
    ExtensionNotAdded(String),

    /// An extension API could not be constructed
    #[error("Not able to instantiate API {api} - {message}")]
    Instantiation { api: String, message: String },

    /// Storage layer failure
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    /// Remote API failure
    #[error("Remote error: {0}")]
    Remote(String),

    /// Programming error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SigexError {
    /// Build a schema error for the given API
    pub fn schema(api: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            api: api.into(),
            message: message.into(),
        }
    }

    /// Get the error code for CLI output
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "SCHEMA_ERROR",
            Self::UserInput(_) | Self::MissingField(_) | Self::InvalidValue { .. } => {
                "USER_INPUT"
            }
            Self::DuplicateCollab(_) => "DUPLICATE_COLLAB",
            Self::CrossApi { .. } => "CROSS_API",
            Self::CollabNotFound(_) | Self::EditTargetMissing(_) => "COLLAB_NOT_FOUND",
            Self::DuplicateRegistration { .. } => "DUPLICATE_REGISTRATION",
            Self::IncompatibleSignalType { .. } => "INCOMPATIBLE_TYPE",
            Self::UnknownExtension(_) => "UNKNOWN_EXTENSION",
            Self::ExtensionAlreadyAdded(_) => "EXTENSION_EXISTS",
            Self::ExtensionNotAdded(_) => "EXTENSION_NOT_FOUND",
            Self::Instantiation { .. } => "INSTANTIATION_FAILED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Remote(_) => "REMOTE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the user caused this and can fix it by reissuing the command
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            Self::Schema { .. } | Self::Storage(_) | Self::Remote(_) | Self::Internal(_)
        )
    }

    /// Process exit code: 2 for user/validation errors, 1 for everything else
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_user_error() {
            2
        } else {
            1
        }
    }
}

impl From<serde_json::Error> for SigexError {
    fn from(err: serde_json::Error) -> Self {
        Self::UserInput(format!("Invalid JSON: {err}"))
    }
}
