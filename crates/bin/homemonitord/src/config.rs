//! Configuration loading: optional `homemonitor.toml` plus `HOMEMONITOR_*`
//! environment overrides.

use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

const CONFIG_FILE: &str = "homemonitor.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

/// `SQLite` pool.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Document store calls.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Upper bound for a single store call, in milliseconds.
    pub timeout_ms: u64,
}

/// Device listing cache.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Populate the listing before accepting requests.
    pub warm_on_start: bool,
}

/// Log filter, in `RUST_LOG` syntax.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Config {
    /// Read `homemonitor.toml` from the working directory, then the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the merged configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE), |name| std::env::var(name).ok())
    }

    fn load_from(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(err.into()),
        };
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Values that do not parse are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = parsed(&lookup, "HOMEMONITOR_BIND") {
            self.server.bind = bind;
        }
        if let Some(url) = lookup("HOMEMONITOR_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(max) = parsed(&lookup, "HOMEMONITOR_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = max;
        }
        if let Some(timeout) = parsed(&lookup, "HOMEMONITOR_STORE_TIMEOUT_MS") {
            self.store.timeout_ms = timeout;
        }
        if let Some(warm) = parsed(&lookup, "HOMEMONITOR_CACHE_WARM_ON_START") {
            self.cache.warm_on_start = warm;
        }
        if let Some(filter) = lookup("RUST_LOG").or_else(|| lookup("HOMEMONITOR_LOG")) {
            self.logging.filter = filter;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.port() == 0 {
            return Err(ConfigError::Validation("bind port must be non-zero"));
        }
        if self.store.timeout_ms == 0 {
            return Err(ConfigError::Validation("store timeout must be non-zero"));
        }
        Ok(())
    }

    /// Per-call store timeout.
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store.timeout_ms)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|val| val.parse().ok())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:homemonitor.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            warm_on_start: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homemonitord=info,homemonitor_app=info,homemonitor_adapter_http_axum=info,tower_http=debug"
                .to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse homemonitor.toml")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read homemonitor.toml")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Validation(&'static str),
}
