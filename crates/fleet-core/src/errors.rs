//! Unified error system for Fleet
//!
//! Every crate in the workspace reports failures through [`FleetError`]. The
//! first six variants are the request-level taxonomy surfaced to callers; the
//! rest cover handler and runtime failures. Transport adapters translate them
//! with [`FleetError::status_code`].

use serde::{Deserialize, Serialize};

/// Unified error type for all Fleet operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum FleetError {
    /// Unknown group or device identifier
    #[error("Not found: {message}")]
    NotFound {
        /// What was looked up and missed
        message: String,
    },

    /// Namespace or permission mismatch between the caller's scope and the target
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Why the request was rejected
        message: String,
    },

    /// Group name (or external device id) already taken within the namespace
    #[error("Duplicate name: {name} already exists in namespace {namespace}")]
    DuplicateName {
        /// Namespace the collision happened in
        namespace: String,
        /// The colliding name
        name: String,
    },

    /// Dynamic group predicate failed to parse
    #[error("Invalid expression: {message}")]
    InvalidExpression {
        /// Parser diagnostic
        message: String,
    },

    /// Attempt to assign membership of a dynamic group
    #[error("Group type mismatch: {message}")]
    GroupTypeMismatch {
        /// Description of the rejected mutation
        message: String,
    },

    /// Unparsable or structurally invalid input document
    #[error("Malformed payload: {message}")]
    MalformedPayload {
        /// Description of the parse failure
        message: String,
    },

    /// Persistence handler failure
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Must-succeed notification could not be published. The write it
    /// follows has already been committed.
    #[error("Publish error: {message}")]
    Publish {
        /// Error message describing the publish failure
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl FleetError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a duplicate name error
    pub fn duplicate_name(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create an invalid expression error
    pub fn invalid_expression(message: impl Into<String>) -> Self {
        Self::InvalidExpression {
            message: message.into(),
        }
    }

    /// Create a group type mismatch error
    pub fn group_type_mismatch(message: impl Into<String>) -> Self {
        Self::GroupTypeMismatch {
            message: message.into(),
        }
    }

    /// Create a malformed payload error
    pub fn malformed_payload(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a publish error
    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Status code the transport boundary reports for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Forbidden { .. } => 403,
            Self::DuplicateName { .. }
            | Self::InvalidExpression { .. }
            | Self::MalformedPayload { .. } => 400,
            Self::GroupTypeMismatch { .. } => 409,
            Self::Storage { .. }
            | Self::Publish { .. }
            | Self::Config { .. }
            | Self::Internal { .. } => 500,
        }
    }

    /// Whether this failure was caused by the request itself rather than the service
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

/// Standard Result type for Fleet operations
pub type Result<T> = std::result::Result<T, FleetError>;

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed_payload(err.to_string())
    }
}

impl From<std::io::Error> for FleetError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FleetError::duplicate_name("acme", "sensors");
        assert_eq!(
            err.to_string(),
            "Duplicate name: sensors already exists in namespace acme"
        );

        let err = FleetError::not_found("group 42");
        assert_eq!(err.to_string(), "Not found: group 42");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(FleetError::not_found("x").status_code(), 404);
        assert_eq!(FleetError::forbidden("x").status_code(), 403);
        assert_eq!(FleetError::duplicate_name("n", "x").status_code(), 400);
        assert_eq!(FleetError::invalid_expression("x").status_code(), 400);
        assert_eq!(FleetError::malformed_payload("x").status_code(), 400);
        assert_eq!(FleetError::group_type_mismatch("x").status_code(), 409);
        assert_eq!(FleetError::publish("x").status_code(), 500);

        assert!(FleetError::forbidden("x").is_client_error());
        assert!(!FleetError::storage("x").is_client_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = FleetError::from(json_err);
        assert!(matches!(err, FleetError::MalformedPayload { .. }));
    }
}
