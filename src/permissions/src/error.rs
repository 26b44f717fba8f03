//! Error types for the permission engine

use crate::types::{Module, Role};
use thiserror::Error;

/// Permission engine errors
#[derive(Debug, Error)]
pub enum PermissionError {
    /// Mutation targets a role with no stored profile
    #[error("Role not found: {0}")]
    RoleNotFound(Role),

    /// Mutation targets a module missing from the role's profile
    #[error("Module '{module}' not found in profile of role '{role}'")]
    ModuleNotFound {
        /// Role whose profile was searched
        role: Role,
        /// Missing module
        module: Module,
    },

    /// Import payload is missing or has a malformed field
    #[error("Invalid import payload: {0}")]
    ImportValidation(String),

    /// Backend write failed
    #[error("Failed to persist '{key}': {message}")]
    PersistenceWrite {
        /// Backend key being written
        key: String,
        /// Backend-reported cause
        message: String,
    },

    /// Backend read failed or stored data could not be decoded
    #[error("Failed to load '{key}': {message}")]
    PersistenceRead {
        /// Backend key being read
        key: String,
        /// Backend-reported cause
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-native failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl PermissionError {
    /// Whether this error came from the persistence layer.
    ///
    /// Persistence failures never abort a mutation; callers that surface
    /// errors to users can use this to decide between "rejected" and
    /// "applied but not saved".
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            PermissionError::PersistenceWrite { .. }
                | PermissionError::PersistenceRead { .. }
                | PermissionError::Backend(_)
        )
    }
}

#[cfg(feature = "sled-backend")]
impl From<sled::Error> for PermissionError {
    fn from(err: sled::Error) -> Self {
        PermissionError::Backend(err.to_string())
    }
}

/// Result type for permission operations
pub type Result<T> = std::result::Result<T, PermissionError>;
