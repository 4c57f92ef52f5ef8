use crate::config::ConfigError;
use crate::schema::{SchemaError, ValidationError};
use crate::tooling::ToolInvokeError;
use thiserror::Error;

/// Crate-level error; the variant names the stage that failed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("schema translation failed: {0}")]
    Schema(#[from] SchemaError),

    #[error("tool session failed: {0}")]
    Session(#[from] ToolInvokeError),

    #[error("argument validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
