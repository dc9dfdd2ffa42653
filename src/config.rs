//! Application configuration loaded from environment variables.

use serde::Deserialize;
use strum::{Display, EnumString};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Which [`TodoRepository`](crate::repository::TodoRepository) backs the service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum StorageBackend {
    /// In-process map, lost on restart.
    #[default]
    #[strum(to_string = "memory", serialize = "in-memory")]
    #[serde(alias = "MEMORY", alias = "in-memory")]
    Memory,
    /// PostgreSQL `todos` table.
    #[strum(to_string = "postgres", serialize = "postgresql")]
    #[serde(alias = "POSTGRES", alias = "postgresql")]
    Postgres,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Storage ===
    /// Storage backend: memory or postgres.
    #[serde(default)]
    pub storage_backend: StorageBackend,

    /// PostgreSQL connection string (required for the postgres backend).
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum pooled database connections.
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Log format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_max_connections() -> u32 {
    5
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::default(),
            database_url: None,
            database_max_connections: default_max_connections(),
            port: default_port(),
            rust_log: default_log_level(),
            log_format: default_log_format(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.storage_backend == StorageBackend::Postgres {
            let raw = self.database_url.as_deref().unwrap_or_default();
            if raw.is_empty() {
                return Err("DATABASE_URL is required for the postgres backend".to_string());
            }
            let url = Url::parse(raw).map_err(|e| format!("DATABASE_URL is invalid: {e}"))?;
            if !matches!(url.scheme(), "postgres" | "postgresql") {
                return Err(
                    "DATABASE_URL must start with postgres:// or postgresql://".to_string(),
                );
            }
        }

        if self.database_max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be at least 1".to_string());
        }

        if let Err(e) = EnvFilter::try_new(self.log_directives(false)) {
            return Err(format!("RUST_LOG is not a valid filter: {e}"));
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err("LOG_FORMAT must be text or json".to_string());
        }

        Ok(())
    }

    /// Tracing filter directives built from `RUST_LOG`.
    ///
    /// Verbose logging (the CLI flag or `VERBOSE`) adds debug output for this
    /// crate and tower-http in front of the configured level.
    pub fn log_directives(&self, verbose_flag: bool) -> String {
        let base = match self.rust_log.trim() {
            "" => "info",
            level => level,
        };
        if verbose_flag || self.verbose {
            format!("todo_service=debug,tower_http=debug,{base}")
        } else {
            base.to_string()
        }
    }

    /// Whether logs should be emitted as JSON lines.
    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }

    /// Database URL with any password replaced, for display.
    ///
    /// A value that does not parse as a URL is hidden entirely, since it may
    /// still carry credentials.
    pub fn redacted_database_url(&self) -> Option<String> {
        let raw = self.database_url.as_deref()?;
        let Ok(mut url) = Url::parse(raw) else {
            return Some("<unparseable>".to_string());
        };
        if url.password().is_some() {
            // Only fails for URLs that cannot carry credentials at all.
            let _ = url.set_password(Some("****"));
        }
        Some(url.to_string())
    }
}
