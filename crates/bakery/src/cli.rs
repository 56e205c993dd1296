//! The `bakery-settings` command.
//!
//! Resolution and output are kept apart from process setup so the commands
//! can be driven with an explicit environment snapshot.

use std::path::PathBuf;

use anyhow::Context;
use bakery_settings::{
    ConfigError, ConfigLoader, EnvSnapshot, SearchBackend, SiteSettings, StorageConflictPolicy,
};
use bakery_telemetry::{logging, reporting};
use clap::{Parser, Subcommand};

/// Resolve production settings for the bakery site.
#[derive(Debug, Parser)]
#[command(
    name = "bakery-settings",
    version = env!("CARGO_PKG_VERSION"),
    about = "Resolve production settings for the bakery site",
    long_about = "Resolve site settings from the environment layered over an optional base file."
)]
pub struct Cli {
    /// Base settings file (.toml or .json)
    #[arg(short, long, global = true)]
    pub base: Option<PathBuf>,

    /// Load a .env file from the working directory first
    #[arg(long, global = true)]
    pub dotenv: bool,

    /// Fail when both S3 and Google Cloud buckets are configured
    #[arg(long, global = true)]
    pub strict_storage: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print resolved settings as JSON with secrets redacted
    Show,

    /// Resolve and validate settings, including telemetry configuration
    Check,
}

impl Cli {
    /// Build a loader from the command-line flags.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base file or `.env` file cannot be read.
    pub fn loader(&self) -> Result<ConfigLoader, ConfigError> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.base {
            loader = loader.with_file(path)?;
        }
        if self.dotenv {
            loader = loader.with_dotenv()?;
        }
        if self.strict_storage {
            loader = loader.with_storage_policy(StorageConflictPolicy::Reject);
        }
        Ok(loader)
    }

    /// Resolve settings against an explicit snapshot, or the process
    /// environment when `env` is `None`.
    pub fn resolve(&self, env: Option<EnvSnapshot>) -> anyhow::Result<SiteSettings> {
        let mut loader = self.loader().context("failed to prepare settings")?;
        if let Some(env) = env {
            loader = loader.with_env(env);
        }
        loader.load().context("failed to resolve settings")
    }
}

/// Run a command against resolved settings and return its output.
pub fn execute(command: Command, settings: &SiteSettings) -> anyhow::Result<String> {
    match command {
        Command::Show => {
            serde_json::to_string_pretty(settings).context("failed to serialize settings")
        }
        Command::Check => {
            check_telemetry(settings)?;
            Ok(summary(settings))
        }
    }
}

/// Check the logging tree and error-reporting descriptor without
/// installing anything.
pub fn check_telemetry(settings: &SiteSettings) -> anyhow::Result<()> {
    logging::build_filter(&settings.logging).context("invalid logging configuration")?;
    if let Some(descriptor) = &settings.error_reporting {
        reporting::client_options(descriptor).context("invalid error reporting configuration")?;
    }
    Ok(())
}

fn summary(settings: &SiteSettings) -> String {
    let key = if settings.secret_key.is_ephemeral() {
        "ephemeral"
    } else {
        "environment"
    };
    let search = match settings.default_search_backend() {
        Some(SearchBackend::Elasticsearch(es)) => format!("elasticsearch ({} host)", es.hosts.len()),
        _ => "database".to_string(),
    };

    let mut lines = vec![
        "settings ok".to_string(),
        format!("  secret key:     {key}"),
        format!("  debug:          {}", settings.debug),
        format!("  allowed hosts:  {}", settings.allowed_hosts.join(", ")),
    ];
    if let Some(db) = settings.default_database() {
        lines.push(format!("  database:       {:?} {}", db.engine, db.name));
    }
    if let Some(cache) = settings.default_cache() {
        lines.push(format!("  cache:          {:?}", cache.backend));
    }
    lines.push(format!("  search:         {search}"));
    lines.push(format!("  file storage:   {:?}", settings.default_file_storage));
    lines.push(format!(
        "  error reporting: {}",
        if settings.error_reporting.is_some() { "on" } else { "off" }
    ));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bakery_settings::resolver::vars;

    fn env() -> EnvSnapshot {
        EnvSnapshot::from_pairs([
            (vars::BASE_URL, "https://bakery.example.com"),
            (vars::SECRET_KEY, "cli-secret"),
        ])
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "bakery-settings",
            "--base",
            "base.toml",
            "--strict-storage",
            "check",
        ])
        .unwrap();
        assert_eq!(cli.base, Some(PathBuf::from("base.toml")));
        assert!(cli.strict_storage);
        assert!(!cli.dotenv);
        assert_eq!(cli.command, Command::Check);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["bakery-settings", "show", "--dotenv"]).unwrap();
        assert!(cli.dotenv);
        assert_eq!(cli.command, Command::Show);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["bakery-settings"]).is_err());
    }

    #[test]
    fn test_show_redacts_secrets() {
        let cli = Cli::try_parse_from(["bakery-settings", "show"]).unwrap();
        let settings = cli.resolve(Some(env())).unwrap();
        let output = execute(cli.command, &settings).unwrap();
        assert!(output.contains("https://bakery.example.com"));
        assert!(!output.contains("cli-secret"));
    }

    #[test]
    fn test_check_summary() {
        let cli = Cli::try_parse_from(["bakery-settings", "check"]).unwrap();
        let settings = cli.resolve(Some(env())).unwrap();
        let output = execute(cli.command, &settings).unwrap();
        assert!(output.starts_with("settings ok"));
        assert!(output.contains("secret key:     environment"));
        assert!(output.contains("error reporting: off"));
        assert!(output.contains("database:       Sqlite bakerydemodb"));
        assert!(output.ends_with("error reporting: off"));
    }

    #[test]
    fn test_check_rejects_bad_dsn() {
        let cli = Cli::try_parse_from(["bakery-settings", "check"]).unwrap();
        let settings = cli
            .resolve(Some(env().with(vars::SENTRY_DSN, "not a dsn")))
            .unwrap();
        let err = execute(cli.command, &settings).unwrap_err();
        assert!(format!("{err:#}").contains("error reporting"));
    }

    #[test]
    fn test_strict_storage_rejects_both_buckets() {
        let cli = Cli::try_parse_from(["bakery-settings", "--strict-storage", "check"]).unwrap();
        let result = cli.resolve(Some(
            env()
                .with(vars::AWS_STORAGE_BUCKET_NAME, "s3-media")
                .with(vars::GS_BUCKET_NAME, "gcs-media"),
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_base_url_fails() {
        let cli = Cli::try_parse_from(["bakery-settings", "check"]).unwrap();
        let result = cli.resolve(Some(EnvSnapshot::new()));
        assert!(result.is_err());
    }
}
