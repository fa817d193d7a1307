//! Idempotent-write result classification.

use serde::Serialize;

use super::error::ApiError;
use super::operation::Operation;

/// Status the platform uses for rejected sub-operations (e.g. a user that has
/// never logged in, or a rule it cannot accept).
pub const SKIPPABLE_STATUS: u16 = 400;

/// Non-fatal result of a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The platform accepted the change.
    Applied,
    /// The entity, link or rule was already in place.
    AlreadyExists,
    /// The platform rejected this sub-operation; the run continues.
    Skipped { status: u16, message: String },
    /// Dry run; nothing was sent.
    Planned,
}

impl WriteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied)
    }
}

/// Classifies a write response. Anything that is not success, a conflict
/// for this operation, or a 400 is fatal.
pub fn classify(operation: &Operation, status: u16, body: &str) -> Result<WriteOutcome, ApiError> {
    if (200..300).contains(&status) {
        return Ok(WriteOutcome::Applied);
    }
    if operation.is_conflict(status) {
        return Ok(WriteOutcome::AlreadyExists);
    }
    if status == SKIPPABLE_STATUS {
        return Ok(WriteOutcome::Skipped {
            status,
            message: body.trim().to_string(),
        });
    }

    let request = operation.request();
    Err(ApiError::Fatal {
        method: request.method.to_string(),
        path: request.path,
        status,
        body: body.to_string(),
    })
}

/// Logs an outcome at the severity it deserves.
pub fn log_outcome(operation: &Operation, outcome: &WriteOutcome) {
    match outcome {
        WriteOutcome::Applied => log::info!("+ {}", operation),
        WriteOutcome::AlreadyExists => log::debug!("= {} (already exists)", operation),
        WriteOutcome::Skipped { status, message } => {
            log::warn!("? {} skipped (HTTP {}): {}", operation, status, message)
        }
        WriteOutcome::Planned => log::info!("~ {} (dry run)", operation),
    }
}
