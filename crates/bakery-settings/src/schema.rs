//! Settings schema types.
//!
//! This module defines the structure of every settings section. Defaults form
//! the base layer that the production resolver builds on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::Secret;

/// Name of the default entry in `databases`, `caches` and `search_backends`.
pub const DEFAULT_ALIAS: &str = "default";

/// Header/value pair that marks a request as HTTPS when set by a trusted proxy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProxySslHeader {
    /// Request meta key carrying the forwarded protocol.
    pub header: String,
    /// Value indicating HTTPS.
    pub value: String,
}

/// Outgoing mail transport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmailBackend {
    /// SMTP relay.
    Smtp,
    /// Write messages to stdout (development).
    #[default]
    Console,
    /// Keep messages in memory (tests).
    Locmem,
    /// Discard messages.
    Dummy,
}

/// Email settings section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EmailSettings {
    /// Transport used to deliver mail.
    #[serde(default)]
    pub backend: EmailBackend,

    /// SMTP host.
    #[serde(default = "default_email_host")]
    pub host: String,

    /// SMTP port.
    #[serde(default = "default_email_port")]
    pub port: u16,

    /// SMTP username.
    #[serde(default)]
    pub host_user: String,

    /// SMTP password.
    #[serde(default)]
    pub host_password: Secret,

    /// Use STARTTLS.
    #[serde(default)]
    pub use_tls: bool,

    /// Use implicit TLS.
    #[serde(default)]
    pub use_ssl: bool,

    /// Prefix for subjects of mail sent to administrators.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    /// Sender address for error mail to administrators.
    #[serde(default = "default_server_email")]
    pub server_email: String,

    /// Sender address for mail sent to site users.
    #[serde(default = "default_from_email")]
    pub default_from_email: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            backend: EmailBackend::default(),
            host: default_email_host(),
            port: default_email_port(),
            host_user: String::new(),
            host_password: Secret::default(),
            use_tls: false,
            use_ssl: false,
            subject_prefix: default_subject_prefix(),
            server_email: default_server_email(),
            default_from_email: default_from_email(),
        }
    }
}

fn default_email_host() -> String {
    "localhost".to_string()
}

fn default_email_port() -> u16 {
    25
}

fn default_subject_prefix() -> String {
    "[Bakery] ".to_string()
}

fn default_server_email() -> String {
    "root@localhost".to_string()
}

fn default_from_email() -> String {
    "webmaster@localhost".to_string()
}

/// Database driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseEngine {
    /// PostgreSQL.
    Postgresql,
    /// PostgreSQL with PostGIS.
    Postgis,
    /// MySQL / MariaDB.
    Mysql,
    /// MySQL with GIS extensions.
    MysqlGis,
    /// SQLite.
    #[default]
    Sqlite,
    /// SQLite with SpatiaLite.
    Spatialite,
    /// Oracle.
    Oracle,
    /// Microsoft SQL Server.
    Mssql,
    /// Unrecognized URL scheme, passed through to the driver layer.
    Other(String),
}

impl DatabaseEngine {
    /// Map a database URL scheme to an engine.
    pub fn from_scheme(scheme: &str) -> Self {
        match scheme {
            "postgres" | "postgresql" | "pgsql" => Self::Postgresql,
            "postgis" => Self::Postgis,
            "mysql" => Self::Mysql,
            "mysqlgis" => Self::MysqlGis,
            "sqlite" => Self::Sqlite,
            "spatialite" => Self::Spatialite,
            "oracle" => Self::Oracle,
            "mssql" => Self::Mssql,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether the engine stores data in a local file.
    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::Sqlite | Self::Spatialite)
    }
}

/// A single database connection entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSettings {
    /// Driver.
    #[serde(default)]
    pub engine: DatabaseEngine,

    /// Database name, or file path for file-based engines.
    #[serde(default = "default_database_name")]
    pub name: String,

    /// Login user.
    #[serde(default)]
    pub user: String,

    /// Login password.
    #[serde(default)]
    pub password: Secret,

    /// Server host or socket directory.
    #[serde(default)]
    pub host: String,

    /// Server port.
    #[serde(default)]
    pub port: Option<u16>,

    /// Lifetime of a persistent connection in seconds. 0 closes after each request.
    #[serde(default)]
    pub conn_max_age: u64,

    /// Wrap each request in a transaction.
    #[serde(default)]
    pub atomic_requests: bool,

    /// Driver-specific options.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: DatabaseEngine::default(),
            name: default_database_name(),
            user: String::new(),
            password: Secret::default(),
            host: String::new(),
            port: None,
            conn_max_age: 0,
            atomic_requests: false,
            options: BTreeMap::new(),
        }
    }
}

fn default_database_name() -> String {
    "bakerydemodb".to_string()
}

/// Cache implementation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// Per-process memory cache.
    #[default]
    LocalMemory,
    /// No-op cache.
    Dummy,
    /// Filesystem cache.
    FileBased,
    /// Database table cache.
    Database,
    /// Redis.
    Redis,
    /// Memcached.
    Memcached,
    /// Unrecognized URL scheme, passed through.
    Other(String),
}

impl CacheBackend {
    /// Map a cache URL scheme to a backend.
    pub fn from_scheme(scheme: &str) -> Self {
        match scheme {
            "locmem" => Self::LocalMemory,
            "dummy" => Self::Dummy,
            "file" => Self::FileBased,
            "db" => Self::Database,
            "redis" | "rediss" => Self::Redis,
            "memcached" | "pymemcache" | "pymemcached" => Self::Memcached,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A single cache entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    /// Implementation.
    #[serde(default)]
    pub backend: CacheBackend,

    /// Backend-specific location (name, path, table, server list or URL).
    #[serde(default)]
    pub location: String,

    /// Default entry timeout in seconds; `None` keeps the backend default.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Prefix prepended to every key.
    #[serde(default)]
    pub key_prefix: String,

    /// Backend-specific options.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// Amazon Web Services credentials shared by storage and search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AwsSettings {
    /// Access key id.
    #[serde(default)]
    pub access_key_id: String,

    /// Secret access key.
    #[serde(default)]
    pub secret_access_key: Secret,

    /// Region name.
    #[serde(default)]
    pub region: String,
}

impl AwsSettings {
    /// Both halves of a static key pair are present.
    pub fn has_static_credentials(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }

    /// A region is known.
    pub fn has_region(&self) -> bool {
        !self.region.is_empty()
    }
}

/// Request-signing scheme attached to an Elasticsearch host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SigningStrategy {
    /// Sign with an explicit key pair.
    StaticCredentials {
        /// Access key id.
        access_key: String,
        /// Secret access key.
        secret_key: Secret,
        /// Session token for temporary credentials.
        session_token: Option<Secret>,
        /// Host included in the signature.
        host: String,
        /// Region.
        region: String,
        /// Service name.
        service: String,
    },
    /// Look credentials up from the ambient provider chain (instance metadata, profile files).
    CredentialDiscovery {
        /// Host included in the signature.
        host: String,
        /// Region.
        region: String,
        /// Service name.
        service: String,
    },
}

/// One Elasticsearch node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ElasticsearchHost {
    /// Hostname.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Connect over TLS.
    #[serde(default)]
    pub use_ssl: bool,
    /// Verify the server certificate.
    #[serde(default)]
    pub verify_certs: bool,
    /// Request signing.
    #[serde(default)]
    pub http_auth: Option<SigningStrategy>,
}

/// HTTP transport used by the search client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HttpConnection {
    /// Pooled urllib3-style connection.
    #[default]
    Pooled,
    /// Requests-style connection that accepts pluggable auth (required for signing).
    Requests,
}

/// Elasticsearch search backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ElasticsearchSettings {
    /// Cluster nodes.
    pub hosts: Vec<ElasticsearchHost>,
    /// Transport.
    #[serde(default)]
    pub connection: HttpConnection,
}

/// Full-text search backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchBackend {
    /// Search through the primary database.
    #[default]
    Database,
    /// External Elasticsearch cluster.
    Elasticsearch(ElasticsearchSettings),
}

/// Storage used for collected static assets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StaticFilesStorage {
    /// Plain filesystem storage.
    #[default]
    FileSystem,
    /// Compressed, content-hashed filenames for far-future caching.
    CompressedManifest,
}

/// Storage used for uploaded media.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileStorageBackend {
    /// Local filesystem under the media root.
    #[default]
    FileSystem,
    /// Amazon S3.
    S3,
    /// Google Cloud Storage.
    GoogleCloud,
}

/// Amazon S3 media storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct S3StorageSettings {
    /// Bucket name.
    pub bucket_name: String,
    /// Domain media URLs are served from.
    pub custom_domain: String,
    /// Create the bucket on first use.
    #[serde(default)]
    pub auto_create_bucket: bool,
}

/// Google Cloud Storage media storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GcsStorageSettings {
    /// Bucket name.
    pub bucket_name: String,
    /// Project id; `None` lets the client infer it.
    #[serde(default)]
    pub project_id: Option<String>,
    /// ACL applied to new objects.
    pub default_acl: String,
    /// Create the bucket on first use.
    #[serde(default)]
    pub auto_create_bucket: bool,
}

/// What to do when both S3 and Google Cloud Storage buckets are configured.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageConflictPolicy {
    /// Google Cloud Storage is resolved last and becomes the default storage.
    #[default]
    LastWins,
    /// Fail resolution.
    Reject,
}

/// Error-reporting integrations attached to the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReportingIntegration {
    /// Capture error events and breadcrumbs from `tracing`.
    Tracing,
}

/// Error-reporting (Sentry) client settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ErrorReportingSettings {
    /// Project DSN.
    pub dsn: String,
    /// Attach user and request details to events.
    #[serde(default)]
    pub send_default_pii: bool,
    /// Enabled integrations.
    #[serde(default)]
    pub integrations: Vec<ErrorReportingIntegration>,
}

/// Log handler output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// Stream to stderr.
    Console,
}

/// A named log handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HandlerSettings {
    /// Output kind.
    pub kind: HandlerKind,
}

/// A named logger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggerSettings {
    /// Handler names.
    #[serde(default)]
    pub handlers: Vec<String>,
    /// Level name (DEBUG, INFO, WARNING, ERROR, CRITICAL).
    pub level: String,
}

/// Logging configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Schema version.
    #[serde(default = "default_logging_version")]
    pub version: u32,

    /// Silence loggers configured before this tree is applied.
    #[serde(default)]
    pub disable_existing_loggers: bool,

    /// Handlers by name.
    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerSettings>,

    /// Loggers by name.
    #[serde(default)]
    pub loggers: BTreeMap<String, LoggerSettings>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            version: default_logging_version(),
            disable_existing_loggers: false,
            handlers: BTreeMap::new(),
            loggers: BTreeMap::new(),
        }
    }
}

fn default_logging_version() -> u32 {
    1
}

/// Level names accepted in [`LoggerSettings::level`] and the tracing level
/// each one installs as.
///
/// `CRITICAL` and `FATAL` have no tracing counterpart and map to `ERROR`.
pub const LOG_LEVELS: [(&str, LevelFilter); 8] = [
    ("NOTSET", LevelFilter::TRACE),
    ("DEBUG", LevelFilter::DEBUG),
    ("INFO", LevelFilter::INFO),
    ("WARNING", LevelFilter::WARN),
    ("WARN", LevelFilter::WARN),
    ("ERROR", LevelFilter::ERROR),
    ("CRITICAL", LevelFilter::ERROR),
    ("FATAL", LevelFilter::ERROR),
];

/// Look up a level name case-insensitively.
pub fn log_level(name: &str) -> Option<LevelFilter> {
    let name = name.trim();
    LOG_LEVELS
        .iter()
        .find(|(level, _)| level.eq_ignore_ascii_case(name))
        .map(|&(_, filter)| filter)
}
