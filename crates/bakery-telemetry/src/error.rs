//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur during telemetry setup.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Failed to initialize the error-reporting client.
    #[error("Failed to initialize error reporting: {0}")]
    ErrorReportingInit(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::LoggingInit("failed".to_string());
        assert_eq!(err.to_string(), "Failed to initialize logging: failed");
    }

    #[test]
    fn test_error_variants() {
        let err = TelemetryError::ErrorReportingInit("bad dsn".to_string());
        assert!(err.to_string().contains("bad dsn"));
        let err = TelemetryError::InvalidConfig("unknown level".to_string());
        assert!(err.to_string().contains("unknown level"));
    }
}
