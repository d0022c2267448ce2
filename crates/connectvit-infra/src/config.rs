//! Server configuration loader for ConnectVit.
//!
//! Reads `config.toml` from the data directory (`~/.connectvit/` in
//! production) and deserializes it into [`ServerConfig`]. Falls back to
//! sensible defaults when the file is missing or malformed. Environment
//! variables override the file.

use std::path::{Path, PathBuf};

use connectvit_types::config::ServerConfig;

/// Overrides the data directory.
pub const DATA_DIR_ENV: &str = "CONNECTVIT_DATA_DIR";
/// Overrides `[database] url`.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Overrides `[server] port`.
pub const PORT_ENV: &str = "PORT";

/// Resolve the data directory.
///
/// Uses `CONNECTVIT_DATA_DIR` if set, otherwise `~/.connectvit`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".connectvit");
    }

    PathBuf::from(".connectvit")
}

/// SQLite database inside the data directory, created on first use.
pub fn default_database_url(data_dir: &Path) -> String {
    format!("sqlite://{}/connect.db?mode=rwc", data_dir.display())
}

/// The database URL the server will connect to.
pub fn database_url(config: &ServerConfig, data_dir: &Path) -> String {
    config
        .database
        .url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}

/// Load configuration from `{data_dir}/config.toml` and apply environment
/// overrides.
///
/// - If the file does not exist, starts from [`ServerConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and starts from the default.
pub async fn load_server_config(data_dir: &Path) -> ServerConfig {
    let mut config = read_config_file(data_dir).await;
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

async fn read_config_file(data_dir: &Path) -> ServerConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServerConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServerConfig::default();
        }
    };

    match toml::from_str::<ServerConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServerConfig::default()
        }
    }
}

/// Apply `DATABASE_URL` and `PORT` from `lookup`.
pub fn apply_overrides(config: &mut ServerConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(DATABASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
        config.database.url = Some(url);
    }
    if let Some(raw) = lookup(PORT_ENV) {
        match raw.trim().parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(err) => tracing::warn!("Ignoring {PORT_ENV}={raw}: {err}"),
        }
    }
}
