//! Error types for the Fabric control plane

use thiserror::Error;

/// Control-plane error taxonomy
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Unknown tenant or application
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate create, or a remote service rejecting our system token
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller handed us something unusable
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Datastore provisioning failure or unexpected remote error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }

    pub fn bad_request(what: impl Into<String>) -> Self {
        Self::BadRequest(what.into())
    }

    pub fn internal(what: impl Into<String>) -> Self {
        Self::Internal(what.into())
    }
}

/// Result type for control-plane operations
pub type ServiceResult<T> = Result<T, ServiceError>;
