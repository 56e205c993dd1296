//! # Bakery
//!
//! **Production settings for the bakery CMS site**
//!
//! This crate ties together:
//!
//! - [`settings`]: resolving typed site settings from the process environment
//!   layered over base settings
//! - [`telemetry`]: applying the resolved logging tree and error-reporting
//!   descriptor
//! - [`cli`]: the `bakery-settings` command used by deployments to inspect
//!   and check a configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bakery::prelude::*;
//!
//! let settings = ConfigLoader::new().with_dotenv()?.load()?;
//! let _guard = init_telemetry(&settings, &LogConfig::for_debug(settings.debug))?;
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;

// Re-export settings types
pub use bakery_settings as settings;

// Re-export telemetry types
pub use bakery_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use bakery::prelude::*;
/// ```
pub mod prelude {
    pub use bakery_settings::{
        ConfigError, ConfigLoader, EnvSnapshot, ResolveOptions, SiteSettings,
        StorageConflictPolicy,
    };

    pub use bakery_telemetry::{init_telemetry, LogConfig, TelemetryError, TelemetryGuard};
}
