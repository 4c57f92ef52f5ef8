pub mod error;
pub mod loader;
pub mod server;

/// Default config file path - can be overridden via CLI argument
pub const CONFIG_PATH: &str = "config/client.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

pub use error::ConfigError;
pub use loader::ensure_env_loaded;
pub use server::ServerConfig;

use std::path::Path;

/// Application configuration loaded from client.toml
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub default_server: Option<String>,
    pub servers: Vec<ServerConfig>,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        loader::load_config(path)
    }

    /// Picks a server by name, falling back to `default_server`, then to the
    /// first configured entry.
    pub fn server(&self, name: Option<&str>) -> Result<&ServerConfig, ConfigError> {
        let wanted = name.or(self.default_server.as_deref());
        match wanted {
            Some(wanted) => self
                .servers
                .iter()
                .find(|server| server.name == wanted)
                .ok_or_else(|| ConfigError::ServerNotFound {
                    server: wanted.to_string(),
                }),
            None => self.servers.first().ok_or(ConfigError::NoServersConfigured),
        }
    }
}
