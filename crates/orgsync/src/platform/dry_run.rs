use async_trait::async_trait;

use super::error::ApiError;
use super::operation::Operation;
use super::types::{RemoteApplication, RemoteComponent, RemoteMember, RemoteTeam};
use super::write::{log_outcome, WriteOutcome};
use super::PlatformApi;

/// Reads from the wrapped platform, but only logs writes.
pub struct DryRun<P> {
    inner: P,
}

impl<P: PlatformApi> DryRun<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

#[async_trait]
impl<P: PlatformApi> PlatformApi for DryRun<P> {
    async fn teams(&self) -> Result<Vec<RemoteTeam>, ApiError> {
        self.inner.teams().await
    }

    async fn team_members(&self, team_id: &str) -> Result<Vec<RemoteMember>, ApiError> {
        self.inner.team_members(team_id).await
    }

    async fn applications(&self) -> Result<Vec<RemoteApplication>, ApiError> {
        self.inner.applications().await
    }

    async fn components(&self) -> Result<Vec<RemoteComponent>, ApiError> {
        self.inner.components().await
    }

    async fn execute(&self, operation: &Operation) -> Result<WriteOutcome, ApiError> {
        let outcome = WriteOutcome::Planned;
        log_outcome(operation, &outcome);
        Ok(outcome)
    }
}
