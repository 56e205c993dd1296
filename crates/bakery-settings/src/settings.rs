//! Top-level settings type.
//!
//! This module provides [`SiteSettings`] and its builder. `SiteSettings::default()`
//! is the base layer; the production resolver consumes it and returns the
//! finished value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    AwsSettings, CacheSettings, ConfigError, DatabaseSettings, EmailSettings,
    ErrorReportingSettings, FileStorageBackend, GcsStorageSettings, LoggingSettings,
    ProxySslHeader, S3StorageSettings, SearchBackend, SecretKey, StaticFilesStorage,
    DEFAULT_ALIAS,
};
use crate::schema::log_level;

/// Complete settings for the bakery site.
///
/// # Example
///
/// ```
/// use bakery_settings::SiteSettings;
///
/// let settings = SiteSettings::default();
/// assert!(!settings.debug);
/// assert_eq!(settings.allowed_hosts, vec!["localhost".to_string()]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SiteSettings {
    /// Debug mode.
    #[serde(default)]
    pub debug: bool,

    /// Signing key. Never read from base files.
    #[serde(default, skip_deserializing)]
    pub secret_key: SecretKey,

    /// Error-reporting client, if enabled.
    #[serde(default)]
    pub error_reporting: Option<ErrorReportingSettings>,

    /// Header trusted to carry the original request scheme.
    #[serde(default)]
    pub secure_proxy_ssl_header: Option<ProxySslHeader>,

    /// Redirect plain HTTP requests to HTTPS.
    #[serde(default)]
    pub secure_ssl_redirect: bool,

    /// Host names the site may be served under.
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,

    /// Outgoing mail.
    #[serde(default)]
    pub email: EmailSettings,

    /// Absolute site URL used in notification mail.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Database connections by alias.
    #[serde(default = "default_databases")]
    pub databases: BTreeMap<String, DatabaseSettings>,

    /// Shared cloud credentials.
    #[serde(default)]
    pub aws: AwsSettings,

    /// Caches by alias.
    #[serde(default = "default_caches")]
    pub caches: BTreeMap<String, CacheSettings>,

    /// Search backends by alias.
    #[serde(default = "default_search_backends")]
    pub search_backends: BTreeMap<String, SearchBackend>,

    /// Request middleware chain, outermost first.
    #[serde(default = "default_middleware")]
    pub middleware: Vec<String>,

    /// Installed application components.
    #[serde(default = "default_installed_apps")]
    pub installed_apps: Vec<String>,

    /// Storage for collected static files.
    #[serde(default)]
    pub staticfiles_storage: StaticFilesStorage,

    /// URL prefix for uploaded media.
    #[serde(default = "default_media_url")]
    pub media_url: String,

    /// Storage for uploaded media.
    #[serde(default)]
    pub default_file_storage: FileStorageBackend,

    /// S3 media storage, when configured.
    #[serde(default)]
    pub s3_storage: Option<S3StorageSettings>,

    /// Google Cloud media storage, when configured.
    #[serde(default)]
    pub gcs_storage: Option<GcsStorageSettings>,

    /// Logging tree.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            debug: false,
            secret_key: SecretKey::default(),
            error_reporting: None,
            secure_proxy_ssl_header: None,
            secure_ssl_redirect: false,
            allowed_hosts: default_allowed_hosts(),
            email: EmailSettings::default(),
            base_url: None,
            databases: default_databases(),
            aws: AwsSettings::default(),
            caches: default_caches(),
            search_backends: default_search_backends(),
            middleware: default_middleware(),
            installed_apps: default_installed_apps(),
            staticfiles_storage: StaticFilesStorage::default(),
            media_url: default_media_url(),
            default_file_storage: FileStorageBackend::default(),
            s3_storage: None,
            gcs_storage: None,
            logging: LoggingSettings::default(),
        }
    }
}

fn default_allowed_hosts() -> Vec<String> {
    vec!["localhost".to_string()]
}

fn default_databases() -> BTreeMap<String, DatabaseSettings> {
    BTreeMap::from([(DEFAULT_ALIAS.to_string(), DatabaseSettings::default())])
}

fn default_caches() -> BTreeMap<String, CacheSettings> {
    BTreeMap::from([(DEFAULT_ALIAS.to_string(), CacheSettings::default())])
}

fn default_search_backends() -> BTreeMap<String, SearchBackend> {
    BTreeMap::from([(DEFAULT_ALIAS.to_string(), SearchBackend::default())])
}

fn default_middleware() -> Vec<String> {
    [
        "django.contrib.sessions.middleware.SessionMiddleware",
        "django.middleware.common.CommonMiddleware",
        "django.middleware.csrf.CsrfViewMiddleware",
        "django.contrib.auth.middleware.AuthenticationMiddleware",
        "django.contrib.messages.middleware.MessageMiddleware",
        "django.middleware.clickjacking.XFrameOptionsMiddleware",
        "django.middleware.security.SecurityMiddleware",
        "wagtail.contrib.redirects.middleware.RedirectMiddleware",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_installed_apps() -> Vec<String> {
    [
        "bakerydemo.base",
        "bakerydemo.blog",
        "bakerydemo.breads",
        "bakerydemo.locations",
        "bakerydemo.search",
        "wagtail.contrib.forms",
        "wagtail.contrib.redirects",
        "wagtail.search",
        "wagtail.admin",
        "wagtail",
        "django.contrib.admin",
        "django.contrib.auth",
        "django.contrib.contenttypes",
        "django.contrib.sessions",
        "django.contrib.messages",
        "django.contrib.staticfiles",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_media_url() -> String {
    "/media/".to_string()
}

impl SiteSettings {
    /// Create a new settings builder.
    #[must_use]
    pub fn builder() -> SiteSettingsBuilder {
        SiteSettingsBuilder::new()
    }

    /// The default database entry.
    pub fn default_database(&self) -> Option<&DatabaseSettings> {
        self.databases.get(DEFAULT_ALIAS)
    }

    /// The default cache entry.
    pub fn default_cache(&self) -> Option<&CacheSettings> {
        self.caches.get(DEFAULT_ALIAS)
    }

    /// The default search backend.
    pub fn default_search_backend(&self) -> Option<&SearchBackend> {
        self.search_backends.get(DEFAULT_ALIAS)
    }

    /// Whether both S3 and Google Cloud Storage are configured.
    pub fn storage_conflict(&self) -> bool {
        self.s3_storage.is_some() && self.gcs_storage.is_some()
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The secret key is empty
    /// - `allowed_hosts` is empty
    /// - Both `email.use_tls` and `email.use_ssl` are set
    /// - The default database or cache entry is missing
    /// - `base_url` is missing or not an absolute URL
    /// - A logger level is not a known level name
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_key.expose().is_empty() {
            return Err(ConfigError::validation_error("secret_key must not be empty"));
        }

        if self.allowed_hosts.is_empty() {
            return Err(ConfigError::validation_error("allowed_hosts must not be empty"));
        }

        // The two are mutually exclusive on the SMTP side
        if self.email.use_tls && self.email.use_ssl {
            return Err(ConfigError::validation_error(
                "email.use_tls and email.use_ssl are mutually exclusive",
            ));
        }

        if self.default_database().is_none() {
            return Err(ConfigError::missing_field("databases.default"));
        }

        if self.default_cache().is_none() {
            return Err(ConfigError::missing_field("caches.default"));
        }

        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| ConfigError::missing_field("base_url"))?;
        Url::parse(base_url)
            .map_err(|e| ConfigError::invalid_value("base_url", e.to_string()))?;

        for (name, logger) in &self.logging.loggers {
            if log_level(&logger.level).is_none() {
                return Err(ConfigError::invalid_value(
                    format!("logging.loggers.{name}.level"),
                    format!("unknown level: {}", logger.level),
                ));
            }
        }

        Ok(())
    }
}

/// Builder for [`SiteSettings`].
#[derive(Debug, Default)]
pub struct SiteSettingsBuilder {
    settings: SiteSettings,
}

impl SiteSettingsBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set debug mode.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.settings.debug = debug;
        self
    }

    /// Set the allowed hosts.
    #[must_use]
    pub fn allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.allowed_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Set the email section.
    #[must_use]
    pub fn email(mut self, email: EmailSettings) -> Self {
        self.settings.email = email;
        self
    }

    /// Set the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.settings.base_url = Some(base_url.into());
        self
    }

    /// Set a database entry.
    #[must_use]
    pub fn database(mut self, alias: impl Into<String>, database: DatabaseSettings) -> Self {
        self.settings.databases.insert(alias.into(), database);
        self
    }

    /// Set a cache entry.
    #[must_use]
    pub fn cache(mut self, alias: impl Into<String>, cache: CacheSettings) -> Self {
        self.settings.caches.insert(alias.into(), cache);
        self
    }

    /// Set the middleware chain.
    #[must_use]
    pub fn middleware<I, S>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.middleware = middleware.into_iter().map(Into::into).collect();
        self
    }

    /// Set the installed components.
    #[must_use]
    pub fn installed_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.installed_apps = apps.into_iter().map(Into::into).collect();
        self
    }

    /// Set the logging tree.
    #[must_use]
    pub fn logging(mut self, logging: LoggingSettings) -> Self {
        self.settings.logging = logging;
        self
    }

    /// Build the settings.
    #[must_use]
    pub fn build(self) -> SiteSettings {
        self.settings
    }
}
