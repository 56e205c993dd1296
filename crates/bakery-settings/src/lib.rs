//! Production settings for the bakery site.
//!
//! This crate resolves the site's runtime settings from environment variables
//! layered on top of base settings:
//! - Base settings from code defaults or a TOML/JSON file
//! - A fixed, ordered set of environment rules (secrets, database, cache,
//!   search, storage, email, logging)
//! - Validation of the finished settings
//!
//! # Overview
//!
//! The settings tree is [`SiteSettings`]. It is built once at startup by
//! [`ConfigLoader`] (or [`resolve`] directly) and passed to whatever consumes
//! it; nothing here keeps global state.
//!
//! # Example
//!
//! ```
//! use bakery_settings::{ConfigLoader, EnvSnapshot, FileStorageBackend};
//!
//! # fn main() -> Result<(), bakery_settings::ConfigError> {
//! let env = EnvSnapshot::from_pairs([
//!     ("DJANGO_SECRET_KEY", "change-me"),
//!     ("BASE_URL", "https://bakery.example.com"),
//!     ("AWS_STORAGE_BUCKET_NAME", "bakery-media"),
//! ]);
//!
//! let settings = ConfigLoader::new().with_env(env).load()?;
//! assert_eq!(settings.default_file_storage, FileStorageBackend::S3);
//! assert_eq!(settings.media_url, "https://bakery-media.s3.amazonaws.com/");
//! # Ok(())
//! # }
//! ```
//!
//! # Base Settings File Format
//!
//! ```toml
//! base_url = "https://bakery.example.com"
//! allowed_hosts = ["bakery.example.com"]
//!
//! [email]
//! host = "smtp.example.com"
//! port = 587
//!
//! [databases.default]
//! engine = "postgresql"
//! name = "bakery"
//! atomic_requests = true
//! ```
//!
//! # Environment Variables
//!
//! See [`resolver::vars`] for the full list. The most common ones:
//!
//! - `DJANGO_SECRET_KEY` - signing key; an ephemeral one is generated if absent
//! - `DATABASE_URL` - e.g. `postgres://user:pw@db:5432/bakery`
//! - `CACHE_URL` - e.g. `redis://cache:6379/0`, default `locmem://`
//! - `ELASTICSEARCH_ENDPOINT` - enables the Elasticsearch backend

#![warn(missing_docs)]

mod env;
mod error;
mod loader;
pub mod resolver;
mod schema;
mod secret;
mod settings;
mod urls;

pub use env::EnvSnapshot;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::{resolve, ResolveOptions};
pub use schema::*;
pub use secret::{generate_secret_key, Secret, SecretKey, SecretKeySource, GENERATED_KEY_LEN, PRINTABLE};
pub use settings::{SiteSettings, SiteSettingsBuilder};
pub use urls::{parse_cache_url, DatabaseUrl, UrlError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SiteSettings::default();
        assert!(settings.base_url.is_none());
        assert_eq!(settings.secret_key.source(), SecretKeySource::Unset);
    }

    #[test]
    fn test_resolve_minimal_environment() {
        let env = EnvSnapshot::from_pairs([("BASE_URL", "https://bakery.example.com")]);
        let settings = resolve(&env, SiteSettings::default(), &ResolveOptions::default()).unwrap();
        assert!(settings.secret_key.is_ephemeral());
        assert!(settings.validate().is_ok());
    }
}
