//! Logging and error reporting for the bakery site.
//!
//! This crate applies the observability parts of resolved
//! [`SiteSettings`](bakery_settings::SiteSettings):
//!
//! - **Logging**: the logging tree becomes a `tracing-subscriber` registry
//! - **Error reporting**: the optional descriptor starts a Sentry client,
//!   and log events are forwarded to it when the tracing integration is on
//!
//! # Example
//!
//! ```rust,ignore
//! use bakery_settings::ConfigLoader;
//! use bakery_telemetry::{init_telemetry, LogConfig};
//!
//! let settings = ConfigLoader::new().load()?;
//! let _guard = init_telemetry(&settings, &LogConfig::for_debug(settings.debug))?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod reporting;

use bakery_settings::SiteSettings;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use reporting::init_error_reporting;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Guard that flushes the error-reporting client on drop.
///
/// Keep this alive for the lifetime of the application.
pub struct TelemetryGuard {
    error_reporting: Option<sentry::ClientInitGuard>,
}

impl TelemetryGuard {
    /// Creates a new telemetry guard.
    #[must_use]
    pub fn new(error_reporting: Option<sentry::ClientInitGuard>) -> Self {
        Self { error_reporting }
    }

    /// Whether an error-reporting client is running.
    #[must_use]
    pub fn reporting_enabled(&self) -> bool {
        self.error_reporting
            .as_ref()
            .is_some_and(|guard| guard.is_enabled())
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(guard) = self.error_reporting.take() {
            if !guard.flush(Some(reporting::FLUSH_TIMEOUT)) {
                eprintln!("Error flushing error-reporting client: timed out");
            }
        }
    }
}

/// Initializes logging and error reporting from resolved settings.
///
/// The error-reporting client starts first so that the logging layer can
/// forward events to it. [`startup_warnings`] are logged once the subscriber
/// is in place.
///
/// # Errors
///
/// Returns `TelemetryError` if any subsystem fails to initialize.
pub fn init_telemetry(
    settings: &SiteSettings,
    config: &LogConfig,
) -> TelemetryResult<TelemetryGuard> {
    let error_reporting = settings
        .error_reporting
        .as_ref()
        .map(init_error_reporting)
        .transpose()?;

    let forward = settings
        .error_reporting
        .as_ref()
        .is_some_and(reporting::forwards_logs);

    init_logging(&settings.logging, config, forward)?;
    emit_startup_warnings(settings);

    Ok(TelemetryGuard::new(error_reporting))
}

/// Warnings about resolved settings that resolution itself may have logged
/// before any subscriber existed.
pub fn startup_warnings(settings: &SiteSettings) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if settings.secret_key.is_ephemeral() {
        warnings.push("secret key was generated for this process; sessions will not survive a restart");
    }
    if settings.storage_conflict() {
        warnings.push(
            "both S3 and Google Cloud Storage buckets are set; Google Cloud Storage is the default file storage",
        );
    }
    warnings
}

/// Log [`startup_warnings`] through the installed subscriber.
pub fn emit_startup_warnings(settings: &SiteSettings) {
    for warning in startup_warnings(settings) {
        tracing::warn!("{warning}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_guard_creation() {
        let guard = TelemetryGuard::new(None);
        assert!(!guard.reporting_enabled());
        drop(guard); // Should not panic
    }

    #[test]
    fn test_startup_warnings() {
        use bakery_settings::resolver::vars;
        use bakery_settings::{ConfigLoader, EnvSnapshot};

        let base = EnvSnapshot::new().with(vars::BASE_URL, "https://bakery.example.com");

        let quiet = ConfigLoader::new()
            .with_env(base.clone().with(vars::SECRET_KEY, "k"))
            .load()
            .unwrap();
        assert!(startup_warnings(&quiet).is_empty());

        let noisy = ConfigLoader::new()
            .with_env(
                base.with(vars::AWS_STORAGE_BUCKET_NAME, "s3-media")
                    .with(vars::GS_BUCKET_NAME, "gcs-media"),
            )
            .load()
            .unwrap();
        let warnings = startup_warnings(&noisy);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("secret key"));
        assert!(warnings[1].contains("Google Cloud Storage"));
    }
}
