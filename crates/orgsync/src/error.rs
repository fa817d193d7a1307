use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrgSyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Platform error: {0}")]
    Platform(#[from] crate::platform::ApiError),

    #[error("Inventory error: {0}")]
    Inventory(#[from] crate::inventory::InventoryError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Resource directory not found: {0}")]
    ResourceDirNotFound(PathBuf),

    #[error("Required resource file not found: {0}")]
    MissingFile(PathBuf),

    #[error("Teams directory not found: {0}")]
    MissingTeamsDirectory(PathBuf),

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in '{path}': {message}")]
    ParseYaml { path: PathBuf, message: String },

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

impl ConfigError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ConfigError::Validation {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrgSyncError>;
