use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no servers configured - at least one [[servers]] entry is required")]
    NoServersConfigured,

    #[error("server '{server}' is configured more than once")]
    DuplicateServer { server: String },

    #[error("server '{server}' is missing required field 'command'")]
    MissingCommand { server: String },

    #[error("server '{server}' not found in configured servers")]
    ServerNotFound { server: String },
}
