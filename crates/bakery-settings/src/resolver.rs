//! Production settings resolver.
//!
//! [`resolve`] applies a fixed sequence of rules to an [`EnvSnapshot`] on top
//! of base settings:
//!
//! 1. Debug flag
//! 2. Secret key
//! 3. Error reporting
//! 4. Proxy SSL header
//! 5. HTTPS redirect
//! 6. Allowed hosts
//! 7. Email transport
//! 8. Base URL
//! 9. Default database
//! 10. AWS credentials
//! 11. Default cache
//! 12. Search backend (uses the credentials from step 10)
//! 13. Static file serving
//! 14. Object storage
//! 15. Logging

use std::collections::BTreeMap;

use crate::{
    parse_cache_url, AwsSettings, CacheSettings, ConfigError, DatabaseSettings, DatabaseUrl,
    ElasticsearchHost, ElasticsearchSettings, EmailBackend, EmailSettings, EnvSnapshot,
    ErrorReportingIntegration, ErrorReportingSettings, FileStorageBackend, GcsStorageSettings,
    HandlerKind, HandlerSettings, HttpConnection, LoggerSettings, LoggingSettings, ProxySslHeader,
    S3StorageSettings, SearchBackend, Secret, SecretKey, SigningStrategy, SiteSettings,
    StaticFilesStorage, StorageConflictPolicy, DEFAULT_ALIAS,
};

/// Environment variable names read by the resolver.
pub mod vars {
    /// `on` enables debug mode.
    pub const DEBUG: &str = "DJANGO_DEBUG";
    /// Signing key.
    pub const SECRET_KEY: &str = "DJANGO_SECRET_KEY";
    /// Error-reporting DSN.
    pub const SENTRY_DSN: &str = "SENTRY_DSN";
    /// `on` redirects HTTP to HTTPS.
    pub const SECURE_SSL_REDIRECT: &str = "DJANGO_SECURE_SSL_REDIRECT";
    /// `;`-separated host names.
    pub const ALLOWED_HOSTS: &str = "DJANGO_ALLOWED_HOSTS";
    /// SMTP host.
    pub const EMAIL_HOST: &str = "EMAIL_HOST";
    /// SMTP port.
    pub const EMAIL_PORT: &str = "EMAIL_PORT";
    /// SMTP user.
    pub const EMAIL_HOST_USER: &str = "EMAIL_HOST_USER";
    /// SMTP password.
    pub const EMAIL_HOST_PASSWORD: &str = "EMAIL_HOST_PASSWORD";
    /// `true` enables STARTTLS.
    pub const EMAIL_USE_TLS: &str = "EMAIL_USE_TLS";
    /// `true` enables implicit TLS.
    pub const EMAIL_USE_SSL: &str = "EMAIL_USE_SSL";
    /// Admin mail subject prefix.
    pub const EMAIL_SUBJECT_PREFIX: &str = "EMAIL_SUBJECT_PREFIX";
    /// Sender for both admin and user mail.
    pub const SERVER_EMAIL: &str = "SERVER_EMAIL";
    /// Absolute site URL.
    pub const BASE_URL: &str = "BASE_URL";
    /// Default database connection URL.
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// AWS access key id.
    pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
    /// AWS secret access key.
    pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
    /// AWS region.
    pub const AWS_REGION: &str = "AWS_REGION";
    /// AWS session token.
    pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
    /// Default cache URL.
    pub const CACHE_URL: &str = "CACHE_URL";
    /// Elasticsearch host.
    pub const ELASTICSEARCH_ENDPOINT: &str = "ELASTICSEARCH_ENDPOINT";
    /// Elasticsearch port.
    pub const ELASTICSEARCH_PORT: &str = "ELASTICSEARCH_PORT";
    /// `on` connects over TLS.
    pub const ELASTICSEARCH_USE_SSL: &str = "ELASTICSEARCH_USE_SSL";
    /// `on` verifies certificates.
    pub const ELASTICSEARCH_VERIFY_CERTS: &str = "ELASTICSEARCH_VERIFY_CERTS";
    /// S3 media bucket.
    pub const AWS_STORAGE_BUCKET_NAME: &str = "AWS_STORAGE_BUCKET_NAME";
    /// Google Cloud Storage media bucket.
    pub const GS_BUCKET_NAME: &str = "GS_BUCKET_NAME";
    /// Google Cloud project.
    pub const GS_PROJECT_ID: &str = "GS_PROJECT_ID";
    /// Level of the framework logger.
    pub const LOG_LEVEL: &str = "DJANGO_LOG_LEVEL";
}

/// Persistent database connection lifetime in seconds.
pub const CONN_MAX_AGE: u64 = 500;

/// Cache used when `CACHE_URL` is absent.
pub const DEFAULT_CACHE_URL: &str = "locmem://";

/// Elasticsearch port used when `ELASTICSEARCH_PORT` is absent.
pub const DEFAULT_ELASTICSEARCH_PORT: u16 = 9200;

/// Service name used when signing search requests.
pub const SEARCH_SIGNING_SERVICE: &str = "es";

/// Middleware serving compressed static files.
pub const STATIC_FILES_MIDDLEWARE: &str = "whitenoise.middleware.WhiteNoiseMiddleware";

/// Component providing the cloud storage backends.
pub const STORAGES_APP: &str = "storages";

/// ACL applied to new Google Cloud Storage objects.
pub const GCS_DEFAULT_ACL: &str = "publicRead";

/// Logger used by the web framework.
pub const FRAMEWORK_LOGGER: &str = "django";

/// Name of the console log handler.
pub const CONSOLE_HANDLER: &str = "console";

const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Options that change resolver behavior without coming from the environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Handling of simultaneous S3 and Google Cloud Storage configuration.
    pub storage_policy: StorageConflictPolicy,
}

/// Resolve production settings.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - No base URL is available from `BASE_URL` or the base settings
/// - `DATABASE_URL` or `CACHE_URL` is not a URL
/// - `ELASTICSEARCH_PORT` is not a port number
/// - Both storage buckets are set under [`StorageConflictPolicy::Reject`]
///
/// # Example
///
/// ```
/// use bakery_settings::{resolve, EnvSnapshot, ResolveOptions, SiteSettings};
///
/// let env = EnvSnapshot::from_pairs([
///     ("DJANGO_SECRET_KEY", "not-so-secret"),
///     ("BASE_URL", "https://bakery.example.com"),
///     ("DJANGO_ALLOWED_HOSTS", "bakery.example.com;www.bakery.example.com"),
/// ]);
///
/// let settings = resolve(&env, SiteSettings::default(), &ResolveOptions::default()).unwrap();
/// assert_eq!(settings.allowed_hosts.len(), 2);
/// assert_eq!(settings.secret_key.expose(), "not-so-secret");
/// ```
pub fn resolve(
    env: &EnvSnapshot,
    base: SiteSettings,
    options: &ResolveOptions,
) -> Result<SiteSettings, ConfigError> {
    let mut settings = base;

    settings.debug = env.is_on(vars::DEBUG);
    settings.secret_key = resolve_secret_key(env);
    if let Some(error_reporting) = resolve_error_reporting(env) {
        settings.error_reporting = Some(error_reporting);
    }
    settings.secure_proxy_ssl_header = Some(proxy_ssl_header());
    settings.secure_ssl_redirect = env.is_on(vars::SECURE_SSL_REDIRECT);
    settings.allowed_hosts = resolve_allowed_hosts(env);
    apply_email(env, &mut settings.email);
    settings.base_url = Some(resolve_base_url(env, settings.base_url.take())?);
    apply_database(env, &mut settings.databases)?;

    let aws = resolve_aws(env);
    settings.caches = BTreeMap::from([(DEFAULT_ALIAS.to_string(), resolve_cache(env)?)]);
    if let Some(backend) = resolve_search_backend(env, &aws)? {
        settings.search_backends = BTreeMap::from([(DEFAULT_ALIAS.to_string(), backend)]);
    }
    settings.aws = aws;

    apply_static_files(&mut settings);
    apply_object_storage(env, &mut settings, options.storage_policy)?;
    settings.logging = resolve_logging(env);

    tracing::debug!(
        debug = settings.debug,
        ephemeral_secret_key = settings.secret_key.is_ephemeral(),
        file_storage = ?settings.default_file_storage,
        "resolved production settings"
    );

    Ok(settings)
}

/// Use `DJANGO_SECRET_KEY` verbatim, or generate an ephemeral key.
pub fn resolve_secret_key(env: &EnvSnapshot) -> SecretKey {
    match env.get(vars::SECRET_KEY) {
        Some(key) => SecretKey::from_env(key),
        None => {
            tracing::warn!(
                var = vars::SECRET_KEY,
                "secret key not found in environment, generating an ephemeral key"
            );
            SecretKey::generate()
        }
    }
}

/// Error-reporting client settings when `SENTRY_DSN` is present.
pub fn resolve_error_reporting(env: &EnvSnapshot) -> Option<ErrorReportingSettings> {
    env.get(vars::SENTRY_DSN).map(|dsn| ErrorReportingSettings {
        dsn: dsn.to_string(),
        send_default_pii: true,
        integrations: vec![ErrorReportingIntegration::Tracing],
    })
}

/// Header set by the reverse proxy to report the original scheme.
pub fn proxy_ssl_header() -> ProxySslHeader {
    ProxySslHeader {
        header: "HTTP_X_FORWARDED_PROTO".to_string(),
        value: "https".to_string(),
    }
}

/// `DJANGO_ALLOWED_HOSTS` split on `;`, or the wildcard.
pub fn resolve_allowed_hosts(env: &EnvSnapshot) -> Vec<String> {
    env.get_or(vars::ALLOWED_HOSTS, "*")
        .split(';')
        .map(String::from)
        .collect()
}

/// Switch to SMTP and apply each email override that is present.
pub fn apply_email(env: &EnvSnapshot, email: &mut EmailSettings) {
    email.backend = EmailBackend::Smtp;

    if let Some(host) = env.get(vars::EMAIL_HOST) {
        email.host = host.to_string();
    }

    if let Some(port) = env.get(vars::EMAIL_PORT) {
        match port.trim().parse() {
            Ok(port) => email.port = port,
            Err(_) => tracing::debug!(var = vars::EMAIL_PORT, "ignoring non-numeric port"),
        }
    }

    if let Some(user) = env.get(vars::EMAIL_HOST_USER) {
        email.host_user = user.to_string();
    }

    if let Some(password) = env.get(vars::EMAIL_HOST_PASSWORD) {
        email.host_password = Secret::new(password);
    }

    if env.is_true(vars::EMAIL_USE_TLS) {
        email.use_tls = true;
    }

    if env.is_true(vars::EMAIL_USE_SSL) {
        email.use_ssl = true;
    }

    if let Some(prefix) = env.get(vars::EMAIL_SUBJECT_PREFIX) {
        email.subject_prefix = prefix.to_string();
    }

    if let Some(sender) = env.get(vars::SERVER_EMAIL) {
        email.server_email = sender.to_string();
        email.default_from_email = sender.to_string();
    }
}

/// `BASE_URL` if set, otherwise the base settings value.
pub fn resolve_base_url(env: &EnvSnapshot, base: Option<String>) -> Result<String, ConfigError> {
    env.non_empty(vars::BASE_URL)
        .map(String::from)
        .or(base)
        .ok_or_else(|| ConfigError::missing_field("base_url"))
}

/// Merge a non-empty `DATABASE_URL` over the default database entry.
pub fn apply_database(
    env: &EnvSnapshot,
    databases: &mut BTreeMap<String, DatabaseSettings>,
) -> Result<(), ConfigError> {
    let Some(raw) = env.non_empty(vars::DATABASE_URL) else {
        return Ok(());
    };

    let url = DatabaseUrl::parse(raw)
        .map_err(|e| ConfigError::env_parse_error(vars::DATABASE_URL, e.to_string()))?;
    url.merge_into(
        databases.entry(DEFAULT_ALIAS.to_string()).or_default(),
        CONN_MAX_AGE,
    );
    Ok(())
}

/// Capture the AWS credentials, empty when absent.
pub fn resolve_aws(env: &EnvSnapshot) -> AwsSettings {
    AwsSettings {
        access_key_id: env.get_or(vars::AWS_ACCESS_KEY_ID, "").to_string(),
        secret_access_key: Secret::new(env.get_or(vars::AWS_SECRET_ACCESS_KEY, "")),
        region: env.get_or(vars::AWS_REGION, "").to_string(),
    }
}

/// Parse `CACHE_URL`, defaulting to a local memory cache when absent or empty.
pub fn resolve_cache(env: &EnvSnapshot) -> Result<CacheSettings, ConfigError> {
    parse_cache_url(env.non_empty(vars::CACHE_URL).unwrap_or(DEFAULT_CACHE_URL))
        .map_err(|e| ConfigError::env_parse_error(vars::CACHE_URL, e.to_string()))
}

/// Elasticsearch backend when `ELASTICSEARCH_ENDPOINT` is non-empty.
pub fn resolve_search_backend(
    env: &EnvSnapshot,
    aws: &AwsSettings,
) -> Result<Option<SearchBackend>, ConfigError> {
    let Some(endpoint) = env.non_empty(vars::ELASTICSEARCH_ENDPOINT) else {
        return Ok(None);
    };

    let port = match env.get(vars::ELASTICSEARCH_PORT) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            ConfigError::env_parse_error(vars::ELASTICSEARCH_PORT, "expected port number")
        })?,
        None => DEFAULT_ELASTICSEARCH_PORT,
    };

    let host = ElasticsearchHost {
        host: endpoint.to_string(),
        port,
        use_ssl: env.is_on(vars::ELASTICSEARCH_USE_SSL),
        verify_certs: env.is_on(vars::ELASTICSEARCH_VERIFY_CERTS),
        http_auth: select_signing_strategy(env, endpoint, aws),
    };

    Ok(Some(SearchBackend::Elasticsearch(ElasticsearchSettings {
        hosts: vec![host],
        connection: HttpConnection::Requests,
    })))
}

/// Static key pair first, then credential discovery when only a region is known.
pub fn select_signing_strategy(
    env: &EnvSnapshot,
    endpoint: &str,
    aws: &AwsSettings,
) -> Option<SigningStrategy> {
    if aws.has_static_credentials() {
        Some(SigningStrategy::StaticCredentials {
            access_key: aws.access_key_id.clone(),
            secret_key: aws.secret_access_key.clone(),
            session_token: env.non_empty(vars::AWS_SESSION_TOKEN).map(Secret::new),
            host: endpoint.to_string(),
            region: aws.region.clone(),
            service: SEARCH_SIGNING_SERVICE.to_string(),
        })
    } else if aws.has_region() {
        Some(SigningStrategy::CredentialDiscovery {
            host: endpoint.to_string(),
            region: aws.region.clone(),
            service: SEARCH_SIGNING_SERVICE.to_string(),
        })
    } else {
        None
    }
}

/// Serve compressed, content-hashed static files from the application.
pub fn apply_static_files(settings: &mut SiteSettings) {
    push_unique(&mut settings.middleware, STATIC_FILES_MIDDLEWARE);
    settings.staticfiles_storage = StaticFilesStorage::CompressedManifest;
}

/// Configure S3 and/or Google Cloud Storage media storage.
///
/// # Errors
///
/// Returns `ConfigError::ConflictingStorage` when both buckets are set and
/// `policy` is [`StorageConflictPolicy::Reject`].
pub fn apply_object_storage(
    env: &EnvSnapshot,
    settings: &mut SiteSettings,
    policy: StorageConflictPolicy,
) -> Result<(), ConfigError> {
    let s3_bucket = env.get(vars::AWS_STORAGE_BUCKET_NAME);
    let gcs_bucket = env.get(vars::GS_BUCKET_NAME);

    if s3_bucket.is_some() && gcs_bucket.is_some() {
        match policy {
            StorageConflictPolicy::Reject => {
                return Err(ConfigError::conflicting_storage(
                    vars::AWS_STORAGE_BUCKET_NAME,
                    vars::GS_BUCKET_NAME,
                ));
            }
            StorageConflictPolicy::LastWins => tracing::warn!(
                "both {} and {} are set, Google Cloud Storage becomes the default file storage",
                vars::AWS_STORAGE_BUCKET_NAME,
                vars::GS_BUCKET_NAME
            ),
        }
    }

    if let Some(bucket) = s3_bucket {
        let custom_domain = format!("{bucket}.s3.amazonaws.com");
        settings.media_url = format!("https://{custom_domain}/");
        settings.s3_storage = Some(S3StorageSettings {
            bucket_name: bucket.to_string(),
            custom_domain,
            auto_create_bucket: true,
        });
        push_unique(&mut settings.installed_apps, STORAGES_APP);
        settings.default_file_storage = FileStorageBackend::S3;
    }

    if let Some(bucket) = gcs_bucket {
        settings.gcs_storage = Some(GcsStorageSettings {
            bucket_name: bucket.to_string(),
            project_id: env.get(vars::GS_PROJECT_ID).map(String::from),
            default_acl: GCS_DEFAULT_ACL.to_string(),
            auto_create_bucket: true,
        });
        push_unique(&mut settings.installed_apps, STORAGES_APP);
        settings.default_file_storage = FileStorageBackend::GoogleCloud;
    }

    Ok(())
}

/// Console handler plus the framework logger at `DJANGO_LOG_LEVEL`.
pub fn resolve_logging(env: &EnvSnapshot) -> LoggingSettings {
    LoggingSettings {
        version: 1,
        disable_existing_loggers: false,
        handlers: BTreeMap::from([(
            CONSOLE_HANDLER.to_string(),
            HandlerSettings {
                kind: HandlerKind::Console,
            },
        )]),
        loggers: BTreeMap::from([(
            FRAMEWORK_LOGGER.to_string(),
            LoggerSettings {
                handlers: vec![CONSOLE_HANDLER.to_string()],
                level: env.get_or(vars::LOG_LEVEL, DEFAULT_LOG_LEVEL).to_string(),
            },
        )]),
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}
