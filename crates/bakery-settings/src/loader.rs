//! Settings loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for building base settings from
//! defaults or a file, then resolving production settings from the
//! environment.

use std::fs;
use std::path::Path;

use crate::{resolve, ConfigError, EnvSnapshot, ResolveOptions, SiteSettings, StorageConflictPolicy};

/// Settings loader with layered approach.
///
/// The loader applies settings in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Base settings file (TOML or JSON)
/// 3. Environment variables, through the production resolver
///
/// # Example
///
/// ```no_run
/// use bakery_settings::ConfigLoader;
///
/// # fn main() -> Result<(), bakery_settings::ConfigError> {
/// let settings = ConfigLoader::new()
///     .with_defaults()
///     .with_optional_file("settings/base.toml")?
///     .with_dotenv()?
///     .load()?;
///
/// println!("Serving {}", settings.base_url.unwrap_or_default());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    base: SiteSettings,
    env: Option<EnvSnapshot>,
    options: ResolveOptions,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new settings loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: SiteSettings::default(),
            env: None,
            options: ResolveOptions::default(),
            file_loaded: false,
        }
    }

    /// Start with default settings values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.base = SiteSettings::default();
        self
    }

    /// Use explicit base settings.
    #[must_use]
    pub fn with_base(mut self, base: SiteSettings) -> Self {
        self.base = base;
        self
    }

    /// Load base settings from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats.
    /// The file format is determined by the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.base = Self::parse_file(&content, path)?;
        self.file_loaded = true;
        tracing::debug!(path = %path.display(), "loaded base settings file");

        Ok(self)
    }

    /// Load base settings from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load base settings from a string.
    ///
    /// # Arguments
    ///
    /// * `content` - Settings content as a string
    /// * `format` - Format ("toml" or "json")
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use bakery_settings::{ConfigLoader, EnvSnapshot};
    ///
    /// let toml = r#"
    ///     base_url = "https://bakery.example.com"
    /// "#;
    ///
    /// let settings = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .with_env(EnvSnapshot::new())
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(settings.base_url.as_deref(), Some("https://bakery.example.com"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.base = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported settings format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Resolve against an explicit environment snapshot instead of the
    /// process environment.
    #[must_use]
    pub fn with_env(mut self, env: EnvSnapshot) -> Self {
        self.env = Some(env);
        self
    }

    /// Choose how simultaneous S3 and Google Cloud Storage buckets are handled.
    #[must_use]
    pub fn with_storage_policy(mut self, policy: StorageConflictPolicy) -> Self {
        self.options.storage_policy = policy;
        self
    }

    /// Load a `.env` file into the process environment.
    ///
    /// Uses the `dotenvy` crate. Variables already set are not overridden.
    /// Has no effect on a snapshot supplied through [`with_env`](Self::with_env).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "loaded .env file");
                Ok(self)
            }
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::validation_error(format!(
                "failed to load .env file: {e}"
            ))),
        }
    }

    /// Whether base settings came from a file.
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Resolve and validate the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if resolution or validation fails.
    pub fn load(self) -> Result<SiteSettings, ConfigError> {
        let settings = self.load_unvalidated()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Resolve without validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if resolution fails.
    pub fn load_unvalidated(self) -> Result<SiteSettings, ConfigError> {
        let env = self.env.unwrap_or_else(EnvSnapshot::capture);
        resolve(&env, self.base, &self.options)
    }

    // Parse base settings file based on extension
    fn parse_file(content: &str, path: &Path) -> Result<SiteSettings, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported settings file format: {}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileStorageBackend, SecretKeySource};

    fn env() -> EnvSnapshot {
        EnvSnapshot::from_pairs([
            ("DJANGO_SECRET_KEY", "loader-test"),
            ("BASE_URL", "https://bakery.example.com"),
        ])
    }

    #[test]
    fn test_loader_new() {
        let settings = ConfigLoader::new().with_env(env()).load().unwrap();
        assert_eq!(settings.secret_key.source(), SecretKeySource::Environment);
        assert_eq!(settings.allowed_hosts, vec!["*"]);
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            media_url = "/uploads/"

            [email]
            port = 2525
        "#;

        let settings = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .with_env(env())
            .load()
            .unwrap();

        assert_eq!(settings.media_url, "/uploads/");
        assert_eq!(settings.email.port, 2525);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"base_url": "https://json.example.com"}"#;

        let settings = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .with_env(EnvSnapshot::new().with("DJANGO_SECRET_KEY", "k"))
            .load()
            .unwrap();

        assert_eq!(settings.base_url.as_deref(), Some("https://json.example.com"));
    }

    #[test]
    fn test_loader_with_string_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: b", "yaml");
        assert!(result.is_err());
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/base.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let loader = ConfigLoader::new()
            .with_optional_file("/nonexistent/base.toml")
            .unwrap();
        assert!(!loader.file_loaded());

        let settings = loader.with_env(env()).load().unwrap();
        assert_eq!(settings.media_url, "/media/");
    }

    #[test]
    fn test_loader_storage_policy() {
        let env = env()
            .with("AWS_STORAGE_BUCKET_NAME", "s3")
            .with("GS_BUCKET_NAME", "gcs");

        let settings = ConfigLoader::new().with_env(env.clone()).load().unwrap();
        assert_eq!(settings.default_file_storage, FileStorageBackend::GoogleCloud);

        let result = ConfigLoader::new()
            .with_env(env)
            .with_storage_policy(StorageConflictPolicy::Reject)
            .load();
        assert!(matches!(result, Err(ConfigError::ConflictingStorage { .. })));
    }

    #[test]
    fn test_loader_validation_runs() {
        let result = ConfigLoader::new()
            .with_env(env().with("BASE_URL", "not absolute"))
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_loader_load_unvalidated() {
        let settings = ConfigLoader::new()
            .with_env(env().with("DJANGO_SECRET_KEY", ""))
            .load_unvalidated()
            .unwrap();
        assert_eq!(settings.secret_key.expose(), "");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_parse_file_unsupported_extension() {
        let result = ConfigLoader::parse_file("", Path::new("base.ini"));
        assert!(result.is_err());
    }
}
