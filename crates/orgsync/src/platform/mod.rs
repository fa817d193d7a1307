//! Platform REST API: remote state reads and classified writes.

pub mod auth;
pub mod client;
pub mod dry_run;
pub mod error;
pub mod operation;
pub mod types;
pub mod write;

use async_trait::async_trait;

pub use auth::Credentials;
pub use client::{ClientConfig, PlatformClient, DEFAULT_BASE_URL};
pub use dry_run::DryRun;
pub use error::ApiError;
pub use operation::{
    AutoLinkTarget, NewApplication, NewComponent, Operation, OperationKind, Rule, RuleFilter,
    RulePayload, ServiceSelector, TagAction, WriteRequest,
};
pub use types::{
    EntityType, RemoteApplication, RemoteComponent, RemoteMember, RemoteTag, RemoteTeam,
};
pub use write::{classify, WriteOutcome};

/// What the reconciler needs from the platform.
///
/// Reads return a full snapshot; `execute` performs one write and classifies
/// its result, returning `Err` only for run-terminating failures.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn teams(&self) -> Result<Vec<RemoteTeam>, ApiError>;

    async fn team_members(&self, team_id: &str) -> Result<Vec<RemoteMember>, ApiError>;

    /// Applications and environments.
    async fn applications(&self) -> Result<Vec<RemoteApplication>, ApiError>;

    /// Components and services.
    async fn components(&self) -> Result<Vec<RemoteComponent>, ApiError>;

    async fn execute(&self, operation: &Operation) -> Result<WriteOutcome, ApiError>;
}
