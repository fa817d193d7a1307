pub mod config;
pub mod error;
pub mod inventory;
pub mod model;
pub mod platform;
pub mod reconcile;
pub mod secrets;

pub use config::{LoadedResources, ResourceLoader};
pub use error::{ConfigError, OrgSyncError, Result};
pub use inventory::{ContainerImage, InventoryError, KubeInventory};
pub use model::{Application, Component, DesiredState, Environment, Team};
pub use platform::{
    ApiError, ClientConfig, Credentials, DryRun, Operation, PlatformApi, PlatformClient,
    WriteOutcome,
};
pub use reconcile::{Orchestrator, SyncOptions, SyncReport};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
