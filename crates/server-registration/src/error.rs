//! Error types for the registration flow.

use crate::flow::FlowStage;
use page_client::FetchError;
use thiserror::Error;

/// Registration error types.
///
/// Every variant is terminal: the flow stops at the first one.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Request failed at stage {stage}: {source}")]
    Fetch {
        stage: FlowStage,
        #[source]
        source: FetchError,
    },

    #[error("Server unreachable after {attempts} attempts at stage {stage}: {url}")]
    Unreachable {
        stage: FlowStage,
        url: String,
        attempts: u32,
    },

    #[error("Unexpected response at stage {stage}: {detail}")]
    UnexpectedResponse { stage: FlowStage, detail: String },

    #[error("Unexpected HTTP status {status} at stage {stage}")]
    UnexpectedStatus { stage: FlowStage, status: u16 },

    #[error("Server {name:?} is not listed in the registration data")]
    ServerNotFound { name: String },

    #[error("Invalid URL at stage {stage}: {url}")]
    InvalidUrl { stage: FlowStage, url: String },

    #[error("Flow state {field} is missing before stage {stage}")]
    MissingState { field: &'static str, stage: FlowStage },

    #[error("Flow state {0} was already set")]
    StateAlreadySet(&'static str),
}

impl RegistrationError {
    /// Map a fetch failure at `stage`, keeping retry exhaustion distinct.
    pub fn from_fetch(stage: FlowStage, error: FetchError) -> Self {
        match error {
            FetchError::RetriesExhausted { url, attempts, .. } => {
                RegistrationError::Unreachable { stage, url, attempts }
            }
            source => RegistrationError::Fetch { stage, source },
        }
    }

    /// Stage the flow was in when it failed, if tied to one.
    pub fn stage(&self) -> Option<FlowStage> {
        match self {
            RegistrationError::Fetch { stage, .. }
            | RegistrationError::Unreachable { stage, .. }
            | RegistrationError::UnexpectedResponse { stage, .. }
            | RegistrationError::UnexpectedStatus { stage, .. }
            | RegistrationError::InvalidUrl { stage, .. }
            | RegistrationError::MissingState { stage, .. } => Some(*stage),
            RegistrationError::ServerNotFound { .. } => Some(FlowStage::ReadRegistrationData),
            RegistrationError::StateAlreadySet(_) => None,
        }
    }
}

/// Result type alias for registration errors.
pub type RegistrationResult<T> = Result<T, RegistrationError>;
