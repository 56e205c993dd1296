//! Settings error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or resolving settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Base settings file not found.
    #[error("settings file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read a base settings file.
    #[error("failed to read settings file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML settings: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON settings: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid settings value.
    #[error("invalid settings value for {field}: {reason}")]
    InvalidValue {
        /// The field with the invalid value.
        field: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },

    /// Missing required setting.
    #[error("missing required setting: {field}")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },

    /// Both object-storage backends were configured under the reject policy.
    #[error("conflicting storage backends: {first} and {second} are both configured")]
    ConflictingStorage {
        /// The bucket variable of the first backend.
        first: String,
        /// The bucket variable of the second backend.
        second: String,
    },

    /// Validation error after resolution.
    #[error("settings validation failed: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a new environment variable parse error.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Create a new storage conflict error.
    pub fn conflicting_storage(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::ConflictingStorage {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create a new validation error.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::read_error("/etc/bakery/base.toml", io);
        assert!(err.to_string().contains("/etc/bakery/base.toml"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_file_not_found_error() {
        let err = ConfigError::file_not_found("/etc/bakery/base.toml");
        assert!(err.to_string().contains("/etc/bakery/base.toml"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("base_url", "relative URL without base");
        assert!(err.to_string().contains("base_url"));
        assert!(err.to_string().contains("relative URL without base"));
    }

    #[test]
    fn test_missing_field_error() {
        let err = ConfigError::missing_field("base_url");
        assert_eq!(err.to_string(), "missing required setting: base_url");
    }

    #[test]
    fn test_env_parse_error() {
        let err = ConfigError::env_parse_error("ELASTICSEARCH_PORT", "expected integer");
        assert!(err.to_string().contains("ELASTICSEARCH_PORT"));
        assert!(err.to_string().contains("expected integer"));
    }

    #[test]
    fn test_conflicting_storage_error() {
        let err = ConfigError::conflicting_storage("AWS_STORAGE_BUCKET_NAME", "GS_BUCKET_NAME");
        let message = err.to_string();
        assert!(message.contains("AWS_STORAGE_BUCKET_NAME"));
        assert!(message.contains("GS_BUCKET_NAME"));
    }

    #[test]
    fn test_validation_error() {
        let err = ConfigError::validation_error("allowed_hosts must not be empty");
        assert!(err.to_string().contains("allowed_hosts must not be empty"));
    }
}
