//! Structured logging for the bakery site.
//!
//! The resolved [`LoggingSettings`] tree is mapped onto a `tracing-subscriber`
//! registry:
//!
//! - each console handler becomes a `fmt` layer on stderr
//! - each logger becomes an `EnvFilter` directive `<logger>=<level>`
//! - everything else logs at `warn`
//!
//! # Example
//!
//! ```rust,ignore
//! use bakery_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&settings.logging, &LogConfig::production(), false)?;
//!
//! tracing::info!(target: "django", path = "/breads/", "Request started");
//! ```

use bakery_settings::{log_level, HandlerKind, LoggingSettings};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Level applied to targets without a configured logger.
pub const ROOT_LEVEL: LevelFilter = LevelFilter::WARN;

/// Output formatting options.
///
/// These knobs are not part of the logging tree; they only shape how console
/// records are rendered.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to include span events (enter, exit, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (logger name).
    pub include_target: bool,

    /// Whether to emit ANSI colors.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Human-readable output for local development.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            json_format: false,
            span_events: true,
            file_line_info: true,
            include_target: true,
            ansi: true,
        }
    }

    /// JSON output for log shipping.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            json_format: true,
            span_events: false,
            file_line_info: false,
            include_target: true,
            ansi: false,
        }
    }

    /// Development output in debug mode, production output otherwise.
    #[must_use]
    pub fn for_debug(debug: bool) -> Self {
        if debug {
            Self::development()
        } else {
            Self::production()
        }
    }
}

/// Map a logger level name to a tracing level.
///
/// Uses the same table as settings validation, so every level that
/// validates can be installed.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    log_level(level)
}

/// Filter directives for a logging tree, root directive first.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidConfig` for an unknown level name.
pub fn filter_directives(settings: &LoggingSettings) -> TelemetryResult<Vec<String>> {
    let mut directives = vec![ROOT_LEVEL.to_string()];

    for (name, logger) in &settings.loggers {
        let level = parse_level(&logger.level).ok_or_else(|| {
            TelemetryError::InvalidConfig(format!(
                "unknown level {:?} for logger {name}",
                logger.level
            ))
        })?;
        directives.push(format!("{name}={level}"));
    }

    Ok(directives)
}

/// Build an `EnvFilter` for a logging tree.
///
/// # Errors
///
/// Returns error if a level or logger name cannot form a directive.
pub fn build_filter(settings: &LoggingSettings) -> TelemetryResult<EnvFilter> {
    let directives = filter_directives(settings)?.join(",");
    EnvFilter::try_new(&directives)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid filter {directives:?}: {e}")))
}

/// Initializes the logging subsystem.
///
/// # Arguments
///
/// * `settings` - Resolved logging tree
/// * `config` - Output formatting
/// * `error_reporting` - Forward events to the error-reporting client
///
/// # Errors
///
/// Returns `TelemetryError` if the tree is invalid or a global subscriber is
/// already installed.
pub fn init_logging(
    settings: &LoggingSettings,
    config: &LogConfig,
    error_reporting: bool,
) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let console = settings
        .handlers
        .values()
        .any(|handler| handler.kind == HandlerKind::Console);

    let console_layer = if console {
        Some(console_layer(config, build_filter(settings)?))
    } else {
        None
    };

    let reporting_layer = if error_reporting {
        Some(sentry::integrations::tracing::layer().with_filter(build_filter(settings)?))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(reporting_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        directives = ?filter_directives(settings)?,
        error_reporting,
        "logging initialized"
    );

    Ok(())
}

fn console_layer(
    config: &LogConfig,
    filter: EnvFilter,
) -> Box<dyn Layer<Registry> + Send + Sync + 'static> {
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_ansi(false)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_ansi(config.ansi)
            .with_filter(filter)
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bakery_settings::{resolver, EnvSnapshot, LoggerSettings};

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert!(config.json_format);
        assert!(!config.ansi);
    }

    #[test]
    fn test_for_debug() {
        assert!(!LogConfig::for_debug(true).json_format);
        assert!(LogConfig::for_debug(true).file_line_info);
        assert!(LogConfig::for_debug(false).json_format);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("INFO"), Some(LevelFilter::INFO));
        assert_eq!(parse_level("info"), Some(LevelFilter::INFO));
        assert_eq!(parse_level("WARNING"), Some(LevelFilter::WARN));
        assert_eq!(parse_level("CRITICAL"), Some(LevelFilter::ERROR));
        assert_eq!(parse_level("NOTSET"), Some(LevelFilter::TRACE));
        assert_eq!(parse_level("FATAL"), Some(LevelFilter::ERROR));
        assert_eq!(parse_level("LOUD"), None);
    }

    #[test]
    fn test_every_valid_level_installs() {
        for (name, _) in bakery_settings::LOG_LEVELS {
            let env = EnvSnapshot::new().with(resolver::vars::LOG_LEVEL, name);
            let settings = resolver::resolve_logging(&env);
            assert!(build_filter(&settings).is_ok(), "{name} should build a filter");
        }
    }

    #[test]
    fn test_filter_directives_from_resolved_tree() {
        let env = EnvSnapshot::new().with(resolver::vars::LOG_LEVEL, "DEBUG");
        let settings = resolver::resolve_logging(&env);
        assert_eq!(filter_directives(&settings).unwrap(), vec!["warn", "django=debug"]);
    }

    #[test]
    fn test_filter_directives_unknown_level() {
        let mut settings = LoggingSettings::default();
        settings.loggers.insert(
            "django".to_string(),
            LoggerSettings {
                handlers: vec!["console".to_string()],
                level: "VERBOSE".to_string(),
            },
        );
        let err = filter_directives(&settings).unwrap_err();
        assert!(err.to_string().contains("VERBOSE"));
    }

    #[test]
    fn test_build_filter_valid() {
        let settings = resolver::resolve_logging(&EnvSnapshot::new());
        assert!(build_filter(&settings).is_ok());
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..Default::default()
        };

        // Should return Ok even when disabled
        let result = init_logging(&LoggingSettings::default(), &config, false);
        assert!(result.is_ok());
    }
}
