//! Platform API error types.

use thiserror::Error;

/// Errors that stop a run. Conflicts and rejected sub-operations are not
/// errors; they are reported as [`super::WriteOutcome`] variants.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request never produced a response.
    #[error("{method} {path} failed: {source}")]
    Transport {
        method: String,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not have the expected shape.
    #[error("Failed to decode response of {method} {path}: {message}")]
    Decode {
        method: String,
        path: String,
        message: String,
    },

    /// No bearer token could be obtained.
    #[error("Authentication failed after {attempts} attempts: {message}")]
    AuthExhausted { attempts: u32, message: String },

    /// Any response that is neither success, conflict nor a skippable rejection.
    #[error("{method} {path} returned HTTP {status}: {body}")]
    Fatal {
        method: String,
        path: String,
        status: u16,
        body: String,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Fatal { status, .. } => Some(*status),
            _ => None,
        }
    }
}
