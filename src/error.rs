#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code constants for type-safe error handling
pub mod code {
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const UNKNOWN_COMMAND: &str = "UNKNOWN_COMMAND";
    pub const MALFORMED_PARAMETER: &str = "MALFORMED_PARAMETER";
    pub const MISSING_PARAMETER: &str = "MISSING_PARAMETER";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const QUOTA_EXCEEDED: &str = "QUOTA_EXCEEDED";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const UNKNOWN_ACTION: &str = "UNKNOWN_ACTION";
    pub const INTERNAL: &str = "INTERNAL";
}

/// The single discriminant carried by every failed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    PermissionDenied,
    UnknownCommand,
    MalformedParameter,
    MissingParameter,
    NotFound,
    QuotaExceeded,
    Timeout,
    UnknownAction,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PermissionDenied => code::PERMISSION_DENIED,
            Self::UnknownCommand => code::UNKNOWN_COMMAND,
            Self::MalformedParameter => code::MALFORMED_PARAMETER,
            Self::MissingParameter => code::MISSING_PARAMETER,
            Self::NotFound => code::NOT_FOUND,
            Self::QuotaExceeded => code::QUOTA_EXCEEDED,
            Self::Timeout => code::TIMEOUT,
            Self::UnknownAction => code::UNKNOWN_ACTION,
            Self::Internal => code::INTERNAL,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Permission denied: group '{group}' lacks the '{permission}' permission")]
    PermissionDenied { group: String, permission: String },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Malformed parameter {field}: {value}")]
    MalformedParameter { field: String, value: String },

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    pub fn malformed(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::MalformedParameter {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Collapses ambient failures (config, IO, serialization) into `Internal`.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::UnknownCommand(_) => ErrorKind::UnknownCommand,
            Self::MalformedParameter { .. } => ErrorKind::MalformedParameter,
            Self::MissingParameter(_) => ErrorKind::MissingParameter,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::UnknownAction(_) => ErrorKind::UnknownAction,
            Self::ConfigError(_)
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the protocol error code for this error
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Returns the exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigError(_) => 2,
            Self::IoError(_) => 3,
            Self::SerializationError(_) => 4,
            Self::PermissionDenied { .. } | Self::UnknownCommand(_) => 5,
            Self::MalformedParameter { .. }
            | Self::MissingParameter(_)
            | Self::UnknownAction(_) => 6,
            Self::NotFound(_) | Self::QuotaExceeded(_) => 7,
            Self::Timeout(_) => 8,
            Self::Internal(_) => 9,
        }
    }
}

/// Protocol error codes as documented in the CLI help
pub const ERROR_CODES: &[(&str, &str, &str)] = &[
    (
        code::PERMISSION_DENIED,
        "Group is not granted the command's permission",
        "Add the permission to group.<name>.permissions in the config file",
    ),
    (
        code::UNKNOWN_COMMAND,
        "No handler is registered under that command name",
        "Check the command key for typos",
    ),
    (
        code::MALFORMED_PARAMETER,
        "A parameter value could not be parsed",
        "Send timestamps as YYYY-MM-DDTHH:MM:SS and indexes as non-negative integers",
    ),
    (
        code::MISSING_PARAMETER,
        "A required parameter was not supplied",
        "Add the missing key,value pair to the message",
    ),
    (
        code::NOT_FOUND,
        "The addressed entry or target does not exist",
        "List entries first and use a valid index",
    ),
    (
        code::QUOTA_EXCEEDED,
        "The group reached its configured maximum",
        "Remove entries or raise group.<name>.schedules",
    ),
    (
        code::TIMEOUT,
        "No correlated reply arrived before the deadline",
        "Increase services_timeout_ms and retry",
    ),
    (
        code::UNKNOWN_ACTION,
        "The action key is missing or not recognised",
        "Use one of the actions documented for the command",
    ),
    (
        code::INTERNAL,
        "Unexpected internal failure",
        "Inspect logs and retry command",
    ),
];

/// Get error code details (description and fix) for a given error code
#[must_use]
pub fn get_error_info(error_code: &str) -> Option<(&'static str, &'static str)> {
    ERROR_CODES
        .iter()
        .find(|(code, _, _)| *code == error_code)
        .map(|(_, desc, fix)| (*desc, *fix))
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_documented_error_info() {
        let kinds = [
            ErrorKind::PermissionDenied,
            ErrorKind::UnknownCommand,
            ErrorKind::MalformedParameter,
            ErrorKind::MissingParameter,
            ErrorKind::NotFound,
            ErrorKind::QuotaExceeded,
            ErrorKind::Timeout,
            ErrorKind::UnknownAction,
            ErrorKind::Internal,
        ];
        for kind in kinds {
            assert!(get_error_info(kind.as_str()).is_some(), "{kind}");
        }
        assert_eq!(ERROR_CODES.len(), kinds.len());
        assert!(get_error_info("NOPE").is_none());
    }

    #[test]
    fn ambient_failures_map_to_internal_kind() {
        let io = BridgeError::IoError(std::io::Error::other("disk"));
        assert_eq!(io.kind(), ErrorKind::Internal);
        assert_eq!(
            BridgeError::ConfigError("bad".to_string()).code(),
            code::INTERNAL
        );
        assert_eq!(
            BridgeError::malformed("time", "yesterday").kind(),
            ErrorKind::MalformedParameter
        );
    }

    #[test]
    fn display_includes_field_and_value() {
        let error = BridgeError::malformed("index", "-1");
        assert_eq!(error.to_string(), "Malformed parameter index: -1");
    }
}
