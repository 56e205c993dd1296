//! Error-reporting client setup.
//!
//! The settings resolver only describes the client. This module turns an
//! [`ErrorReportingSettings`] descriptor into a running Sentry client.

use std::time::Duration;

use bakery_settings::{ErrorReportingIntegration, ErrorReportingSettings};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Environment name attached to reported events.
pub const ENVIRONMENT: &str = "production";

/// How long to wait for queued events on shutdown.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Whether the descriptor asks for log events to be forwarded.
#[must_use]
pub fn forwards_logs(settings: &ErrorReportingSettings) -> bool {
    settings
        .integrations
        .contains(&ErrorReportingIntegration::Tracing)
}

/// Build client options from a descriptor.
///
/// # Errors
///
/// Returns `TelemetryError::ErrorReportingInit` if the DSN is malformed.
pub fn client_options(settings: &ErrorReportingSettings) -> TelemetryResult<sentry::ClientOptions> {
    let dsn: sentry::types::Dsn = settings
        .dsn
        .parse()
        .map_err(|e| TelemetryError::ErrorReportingInit(format!("invalid DSN: {e}")))?;

    Ok(sentry::ClientOptions {
        dsn: Some(dsn),
        send_default_pii: settings.send_default_pii,
        release: sentry::release_name!(),
        environment: Some(ENVIRONMENT.into()),
        ..Default::default()
    })
}

/// Start the error-reporting client.
///
/// The returned guard keeps the client alive and flushes it on drop.
///
/// # Errors
///
/// Returns `TelemetryError::ErrorReportingInit` if the DSN is malformed.
pub fn init_error_reporting(
    settings: &ErrorReportingSettings,
) -> TelemetryResult<sentry::ClientInitGuard> {
    let guard = sentry::init(client_options(settings)?);
    if !guard.is_enabled() {
        return Err(TelemetryError::ErrorReportingInit(
            "client disabled after init".to_string(),
        ));
    }
    Ok(guard)
}
