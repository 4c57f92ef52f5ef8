use super::error::ConfigError;
use super::server::{RawServer, ServerConfig};
use super::{AppConfig, CONFIG_PATH, ENV_PATH};
use dotenvy::from_filename;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub default_server: Option<String>,
    #[serde(default)]
    pub servers: Vec<RawServer>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        if from_filename(ENV_PATH).is_ok() {
            debug!(path = ENV_PATH, "Loaded environment file");
        }
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
    read_config(config_path)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading client configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_config(&content, path)
}

pub(super) fn parse_config(content: &str, path: &Path) -> Result<AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_and_build(parsed)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    if parsed.servers.is_empty() {
        return Err(ConfigError::NoServersConfigured);
    }

    let mut seen = HashSet::new();
    for raw in &parsed.servers {
        if raw.command.trim().is_empty() {
            return Err(ConfigError::MissingCommand {
                server: raw.name.clone(),
            });
        }
        if !seen.insert(raw.name.as_str()) {
            return Err(ConfigError::DuplicateServer {
                server: raw.name.clone(),
            });
        }
    }

    if let Some(default) = &parsed.default_server {
        if !seen.contains(default.as_str()) {
            return Err(ConfigError::ServerNotFound {
                server: default.clone(),
            });
        }
    }

    Ok(AppConfig {
        default_server: parsed.default_server,
        servers: parsed.servers.into_iter().map(ServerConfig::from).collect(),
    })
}
